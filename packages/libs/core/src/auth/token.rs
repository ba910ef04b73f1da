//! 토큰 페어와 디코딩 유틸리티
//!
//! Access Token은 JWT 형식(`header.payload.signature`)이며,
//! 클라이언트는 payload만 디코딩합니다. 서명 검증은 백엔드의 몫입니다.

use base64::{engine::general_purpose, Engine as _};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::claims::{epoch_secs, UserClaim};

/// Access/Refresh 토큰 페어
///
/// 갱신 시 통째로 교체되는 불변 값입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// Access Token의 claims 디코딩
    pub fn claims(&self) -> Result<UserClaim> {
        decode_claims(&self.access_token)
    }
}

/// Access Token payload를 디코딩 (검증 없음)
pub fn decode_claims(token: &str) -> Result<UserClaim> {
    decode_payload(token)
}

/// 만료 판정에 필요한 필드만 읽는 payload
#[derive(Deserialize)]
struct Expiry {
    #[serde(default, deserialize_with = "epoch_secs")]
    exp: Option<i64>,
}

fn decode_payload<T: DeserializeOwned>(token: &str) -> Result<T> {
    let mut parts = token.trim().split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) if !payload.is_empty() => payload,
        _ => {
            return Err(Error::TokenDecode {
                reason: "expected three dot-separated segments".to_string(),
            })
        }
    };

    let bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| Error::TokenDecode {
            reason: format!("payload is not base64url: {}", e),
        })?;

    serde_json::from_slice::<T>(&bytes).map_err(|e| Error::TokenDecode {
        reason: format!("payload is not a claim object: {}", e),
    })
}

/// 토큰 만료 여부 (현재 시각 기준)
///
/// 디코딩 실패와 `exp` 누락은 모두 만료로 취급합니다.
pub fn is_expired(token: &str) -> bool {
    is_expired_at(token, Utc::now().timestamp())
}

/// 토큰 만료 여부 (주어진 epoch seconds 기준)
///
/// `exp`만 읽습니다. 프로필 필드의 모양은 만료 판정에 영향을 주지 않습니다.
pub fn is_expired_at(token: &str, now_epoch_secs: i64) -> bool {
    match decode_payload::<Expiry>(token) {
        Ok(Expiry { exp: Some(exp) }) => exp < now_epoch_secs,
        Ok(Expiry { exp: None }) | Err(_) => true,
    }
}

/// `Authorization` 헤더 값 생성
pub fn bearer_value(token: &str) -> String {
    format!("Bearer {}", token)
}

/// `Authorization: Bearer ...` 헤더에서 토큰 추출
pub fn parse_bearer(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
