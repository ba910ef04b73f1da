//! Access Token 첨부

use lbr_core::auth;

use crate::session::SessionStore;
use crate::transport::ApiRequest;

/// private 요청에 유효한 Access Token 첨부
///
/// 토큰이 없거나 만료(디코딩 실패 포함)되었으면 요청을 그대로 보냅니다.
/// 백엔드가 401로 거절하면 refresh 경로가 이어받습니다.
pub fn attach_token(session: &SessionStore, request: ApiRequest) -> ApiRequest {
    match session.access_token() {
        Some(token) if !auth::is_expired(&token) => request.bearer_auth(&token),
        Some(_) => {
            tracing::debug!(url = %request.url, "access token expired, sending without it");
            request
        }
        None => request,
    }
}
