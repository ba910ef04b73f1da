//! 공통 에러 타입
//!
//! Librarium 전체에서 사용되는 에러 타입을 정의합니다.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Librarium 공통 에러
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────────
    // Token Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("token decode error: {reason}")]
    TokenDecode { reason: String },

    // ─────────────────────────────────────────────────────────────────────────────
    // Refresh Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("no refresh token available")]
    NoRefreshToken,

    #[error("refresh rejected ({status}): {message}")]
    RefreshRejected { status: u16, message: String },

    #[error("refresh timed out after {after_ms}ms")]
    RefreshTimedOut { after_ms: u64 },

    // ─────────────────────────────────────────────────────────────────────────────
    // Endpoint Policy Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("invalid endpoint pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    // ─────────────────────────────────────────────────────────────────────────────
    // Storage / IO / Serialization Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("storage error: {message}")]
    Storage { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// HTTP 상태 코드로 변환
    pub fn status_code(&self) -> u16 {
        match self {
            // 401 Unauthorized
            Error::TokenDecode { .. }
            | Error::NoRefreshToken
            | Error::RefreshRejected { .. }
            | Error::RefreshTimedOut { .. } => 401,

            // 500 Internal Server Error
            _ => 500,
        }
    }

    /// 에러 코드 (클라이언트용)
    pub fn code(&self) -> &'static str {
        match self {
            Error::TokenDecode { .. } => "TOKEN_DECODE_ERROR",
            Error::NoRefreshToken => "NO_REFRESH_TOKEN",
            Error::RefreshRejected { .. } => "REFRESH_REJECTED",
            Error::RefreshTimedOut { .. } => "REFRESH_TIMED_OUT",
            Error::InvalidPattern { .. } => "INVALID_PATTERN",
            Error::Storage { .. } => "STORAGE_ERROR",
            Error::Io(_) => "IO_ERROR",
            Error::Json(_) => "JSON_ERROR",
        }
    }

    /// 세션 만료로 귀결되는 에러인지 확인
    ///
    /// refresh 경로에서 발생한 에러는 모두 로그아웃으로 끝나며,
    /// 사용자에게는 하나의 "세션 만료" 상태로 보여집니다.
    pub fn is_session_expired(&self) -> bool {
        matches!(
            self,
            Error::NoRefreshToken
                | Error::RefreshRejected { .. }
                | Error::RefreshTimedOut { .. }
        )
    }
}
