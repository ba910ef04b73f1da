//! 클라이언트 에러 타입

use reqwest::StatusCode;

/// 게이트웨이 에러
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("core error: {0}")]
    Core(#[from] lbr_core::Error),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// refresh 호출 자체가 전송 단계에서 실패 (세션은 이미 정리됨)
    #[error("refresh transport error: {message}")]
    RefreshTransport { message: String },

    /// 401 이외의 실패 응답 (`send_json` 계열에서만 발생, 그대로 전달)
    #[error("request failed ({status}): {body}")]
    Http { status: StatusCode, body: String },

    #[error("invalid response body: {message}")]
    InvalidBody { message: String },

    #[error("config error: {message}")]
    Config { message: String },
}

impl ClientError {
    /// 사용자에게 "세션 만료"로 보여야 하는 에러인지 확인
    pub fn is_session_expired(&self) -> bool {
        match self {
            ClientError::Core(e) => e.is_session_expired(),
            ClientError::RefreshTransport { .. } => true,
            _ => false,
        }
    }

    /// 응답 상태 코드 (있는 경우)
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            ClientError::Core(e) => StatusCode::from_u16(e.status_code()).ok(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
