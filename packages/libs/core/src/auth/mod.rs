//! 인증 관련 타입 및 로직
//!
//! # 개요
//!
//! 클라이언트가 다루는 인증 상태는 두 가지 토큰으로 구성됩니다:
//!
//! - **Access Token**: 짧은 수명의 JWT, private 요청에 `Bearer`로 첨부
//! - **Refresh Token**: 새 Access Token을 얻는 데만 쓰이는 긴 수명의 토큰
//!
//! Claims는 Access Token에서 디코딩만 하며, 검증은 하지 않습니다.

mod claims;
mod guard;
mod token;

pub use claims::{Role, UserClaim};
pub use guard::{evaluate as evaluate_access, AccessDecision, RouteRequirement};
pub use token::{bearer_value, decode_claims, is_expired, is_expired_at, parse_bearer, TokenPair};
