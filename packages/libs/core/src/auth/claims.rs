//! 토큰 Claims
//!
//! Access Token 페이로드에서 디코딩한 사용자 정보입니다.
//! 클라이언트는 서명을 검증하지 않습니다. 토큰의 의미는 발급한 백엔드만이 보증합니다.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// 사용자 Role
///
/// 알 수 없는 값은 `Guest`로 디코딩됩니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Librarian,
    Reader,
    /// 로그인하지 않은 사용자
    #[default]
    #[serde(other)]
    Guest,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Librarian => "LIBRARIAN",
            Role::Reader => "READER",
            Role::Guest => "GUEST",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LIBRARIAN" => Ok(Role::Librarian),
            "READER" => Ok(Role::Reader),
            "GUEST" => Ok(Role::Guest),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Access Token Claims
///
/// 세션 스토어가 현재 토큰으로부터 항상 다시 계산합니다. 독립적으로 저장되지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserClaim {
    /// Subject (사용자 ID 또는 username)
    #[serde(default, deserialize_with = "text")]
    pub sub: String,

    /// Role (없거나 null이면 `Guest`)
    #[serde(default, deserialize_with = "role_or_guest")]
    pub role: Role,

    /// 만료 시각 (epoch seconds)
    #[serde(
        default,
        deserialize_with = "epoch_secs",
        skip_serializing_if = "Option::is_none"
    )]
    pub exp: Option<i64>,

    /// 발급 시각 (epoch seconds)
    #[serde(
        default,
        deserialize_with = "epoch_secs",
        skip_serializing_if = "Option::is_none"
    )]
    pub iat: Option<i64>,

    #[serde(default, deserialize_with = "text")]
    pub name: String,

    #[serde(default, deserialize_with = "text")]
    pub username: String,

    #[serde(default, deserialize_with = "text")]
    pub email: String,

    /// 사서가 소속된 도서관 ID
    #[serde(
        default,
        deserialize_with = "id_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub library_id: Option<String>,

    #[serde(
        default,
        deserialize_with = "id_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub library_name: Option<String>,

    #[serde(
        default,
        deserialize_with = "id_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub user_id: Option<String>,

    #[serde(
        default,
        deserialize_with = "id_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub customer_id: Option<String>,

    #[serde(
        default,
        deserialize_with = "id_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub address: Option<String>,

    #[serde(
        default,
        deserialize_with = "id_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub contact_number: Option<String>,

    #[serde(
        default,
        deserialize_with = "id_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub image: Option<String>,

    #[serde(
        default,
        deserialize_with = "id_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_thumbnail: Option<String>,
}

impl UserClaim {
    /// 특정 role 보유 확인
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }

    /// 주어진 시각 기준 만료 여부
    ///
    /// `exp`가 없으면 만료로 취급합니다.
    pub fn is_expired_at(&self, now_epoch_secs: i64) -> bool {
        match self.exp {
            Some(exp) => exp < now_epoch_secs,
            None => true,
        }
    }

    /// 표시 이름 (name이 비어있으면 username)
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.username
        } else {
            &self.name
        }
    }
}

/// 백엔드가 ID를 문자열 또는 숫자로 내려주므로 둘 다 문자열로 정규화
///
/// 그 외 타입(null, bool, 객체 등)은 없는 값으로 봅니다.
fn id_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(id_string(deserializer)?.unwrap_or_default())
}

fn role_or_guest<'de, D>(deserializer: D) -> std::result::Result<Role, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Role>::deserialize(deserializer)?.unwrap_or_default())
}

/// epoch seconds (정수 또는 실수). 숫자가 아니면 없는 값
pub(super) fn epoch_secs<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.floor() as i64)),
        _ => None,
    })
}
