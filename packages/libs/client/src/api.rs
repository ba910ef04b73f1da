//! 백엔드 인증 API 경로와 요청/응답 타입

use lbr_core::auth::Role;
use serde::{Deserialize, Serialize};

pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTER_PATH: &str = "/auth/register";
pub const REFRESH_PATH: &str = "/auth/refresh-token";
pub const CHECK_EMAIL_PATH: &str = "/profile/check-email";
pub const CHECK_USERNAME_PATH: &str = "/profile/check-username";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// 회원가입 요청
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub role: Role,
    pub name: String,
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// 중복 확인 요청
///
/// `current`는 사용자의 현재 값입니다. 신규 가입이면 빈 문자열입니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRequest {
    pub request: String,
    #[serde(default)]
    pub current: String,
}

impl CheckRequest {
    pub fn new(request: impl Into<String>, current: Option<&str>) -> Self {
        Self {
            request: request.into(),
            current: current.unwrap_or_default().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExistResponse {
    pub exist: bool,
}
