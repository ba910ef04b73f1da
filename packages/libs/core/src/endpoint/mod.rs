//! 엔드포인트 분류
//!
//! 나가는 요청마다 identity 토큰이 필요한지(`Private`) 아닌지(`Public`) 결정합니다.
//! 애매한 경우는 항상 `Private`으로 판정합니다 (fail secure).

mod pattern;
mod policy;

pub use pattern::{normalize_path, strip_base_path, PathPattern};
pub use policy::{EndpointPolicy, Methods, PublicEndpoint, Visibility};
