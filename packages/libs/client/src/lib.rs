//! Librarium Client
//!
//! 백엔드 API로 나가는 모든 요청이 지나가는 인증 게이트웨이입니다.
//!
//! # 구성
//!
//! - [`AuthGateway`]: 엔드포인트 분류, 토큰 첨부, 401 시 refresh 후 재시도
//! - [`SessionStore`]: 토큰 페어와 디코딩된 claim 보관, 영속 저장
//! - [`RefreshCoordinator`]: 동시 401에 대해 refresh 호출을 한 번으로 제한
//! - [`HttpTransport`]: 실제 전송 seam (기본 구현: [`ReqwestTransport`])
//!
//! # 사용 예
//!
//! ```ignore
//! let gateway = AuthGateway::from_config(ClientConfig::from_env()?)?;
//! gateway.login("alice", "secret").await?;
//! let resp = gateway.send(ApiRequest::get(gateway.url("/cart"))).await?;
//! ```

pub mod api;
pub mod attach;
pub mod config;
pub mod error;
pub mod gateway;
pub mod refresh;
pub mod session;
pub mod transport;

#[cfg(test)]
mod testing;

pub use attach::attach_token;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use gateway::AuthGateway;
pub use refresh::{RefreshCoordinator, RefreshFailure};
pub use session::SessionStore;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport};
