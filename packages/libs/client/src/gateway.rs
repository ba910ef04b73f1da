//! Auth Gateway
//!
//! 모든 백엔드 요청이 지나가는 단일 경로입니다.
//!
//! 1. 엔드포인트 분류 (public이면 그대로 전송)
//! 2. private이면 Access Token 첨부 후 전송
//! 3. `401`이면 Refresh Coordinator를 통해 새 토큰을 받아 한 번 재시도
//!
//! `401` 이외의 응답은 상태와 무관하게 호출자에게 그대로 돌려줍니다.

use std::sync::Arc;

use lbr_core::auth::TokenPair;
use lbr_core::endpoint::EndpointPolicy;
use lbr_core::storage::FileTokenStorage;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::Instrument;
use uuid::Uuid;

use crate::api::{
    CheckRequest, ExistResponse, LoginRequest, RefreshRequest, RegisterRequest, CHECK_EMAIL_PATH,
    CHECK_USERNAME_PATH, LOGIN_PATH, REFRESH_PATH, REGISTER_PATH,
};
use crate::attach::attach_token;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::refresh::{RefreshCoordinator, RefreshFailure};
use crate::session::SessionStore;
use crate::transport::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport};

const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Auth Gateway
pub struct AuthGateway {
    config: ClientConfig,
    transport: Arc<dyn HttpTransport>,
    session: Arc<SessionStore>,
    policy: EndpointPolicy,
    coordinator: RefreshCoordinator,
}

impl AuthGateway {
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn HttpTransport>,
        session: Arc<SessionStore>,
    ) -> Self {
        if config.refresh_timeout.is_none() {
            tracing::warn!("no refresh timeout configured, a stalled refresh blocks waiting requests");
        }

        let policy = EndpointPolicy::bookstore().with_base_path(config.base_path());
        let coordinator = RefreshCoordinator::new(config.refresh_timeout);

        Self {
            config,
            transport,
            session,
            policy,
            coordinator,
        }
    }

    /// 설정으로부터 파일 저장소와 reqwest 전송을 사용하는 게이트웨이 생성
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let dir = match &config.token_dir {
            Some(dir) => dir.clone(),
            None => FileTokenStorage::default_dir()?,
        };
        let session = Arc::new(SessionStore::load(Arc::new(FileTokenStorage::new(dir))));
        let transport = Arc::new(ReqwestTransport::new(config.http_timeout)?);

        Ok(Self::new(config, transport, session))
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn policy(&self) -> &EndpointPolicy {
        &self.policy
    }

    /// 백엔드 상대 경로로 전체 URL 생성
    pub fn url(&self, path: &str) -> String {
        self.config.url(path)
    }

    /// 요청 전송
    pub async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse> {
        let request_id = stamp_request_id(&mut request);
        let span = tracing::info_span!(
            "request",
            request_id = %request_id,
            method = %request.method,
            url = %request.url,
        );
        self.dispatch(request).instrument(span).await
    }

    /// 요청 전송 후 성공 응답 본문을 JSON으로 변환
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        self.send(request).await?.into_json()
    }

    async fn dispatch(&self, request: ApiRequest) -> Result<ApiResponse> {
        let visibility = self
            .policy
            .classify(&request.url, request.method.as_str());
        if visibility.is_public() {
            return self.transport.execute(request).await;
        }

        let response = self
            .transport
            .execute(attach_token(&self.session, request.clone()))
            .await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::info!("received 401, refreshing access token");
        let token = self
            .coordinator
            .refresh_or_wait(&self.session, |refresh_token| self.call_refresh(refresh_token))
            .await?;

        // 재시도는 한 번만. 여기서 다시 401이어도 그대로 반환
        self.transport.execute(request.bearer_auth(&token)).await
    }

    async fn call_refresh(&self, refresh_token: String) -> std::result::Result<TokenPair, RefreshFailure> {
        let transport_failure = |e: crate::ClientError| RefreshFailure::Transport {
            message: e.to_string(),
        };

        let mut request = ApiRequest::post(self.url(REFRESH_PATH))
            .json(&RefreshRequest { refresh_token })
            .map_err(transport_failure)?;
        let request_id = stamp_request_id(&mut request);
        let span = tracing::info_span!("refresh", request_id = %request_id);

        let response = self
            .transport
            .execute(request)
            .instrument(span)
            .await
            .map_err(transport_failure)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RefreshFailure::Rejected {
                status: status.as_u16(),
                message: response.text(),
            });
        }

        response.json().map_err(|e| RefreshFailure::Rejected {
            status: status.as_u16(),
            message: e.to_string(),
        })
    }

    /// 로그인 후 세션에 토큰 저장
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair> {
        let request = ApiRequest::post(self.url(LOGIN_PATH)).json(&LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        })?;
        let token: TokenPair = self.send_json(request).await?;

        self.session.set(token.clone())?;
        tracing::info!(username, "logged in");
        Ok(token)
    }

    /// 회원가입 후 세션에 토큰 저장
    pub async fn register(&self, body: &RegisterRequest) -> Result<TokenPair> {
        let request = ApiRequest::post(self.url(REGISTER_PATH)).json(body)?;
        let token: TokenPair = self.send_json(request).await?;

        self.session.set(token.clone())?;
        tracing::info!(username = %body.username, role = %body.role, "registered");
        Ok(token)
    }

    pub fn logout(&self) -> Result<()> {
        self.session.clear()?;
        Ok(())
    }

    /// 이메일 사용 여부 (`current`는 사용자의 현재 이메일)
    pub async fn email_exists(&self, email: &str, current: Option<&str>) -> Result<bool> {
        self.check_exists(CHECK_EMAIL_PATH, email, current).await
    }

    /// 사용자명 사용 여부 (`current`는 사용자의 현재 사용자명)
    pub async fn username_exists(&self, username: &str, current: Option<&str>) -> Result<bool> {
        self.check_exists(CHECK_USERNAME_PATH, username, current).await
    }

    async fn check_exists(&self, path: &str, value: &str, current: Option<&str>) -> Result<bool> {
        let request = ApiRequest::post(self.url(path)).json(&CheckRequest::new(value, current))?;
        let response: ExistResponse = self.send_json(request).await?;
        Ok(response.exist)
    }
}

/// `x-request-id` 헤더 설정 후 그 값을 반환
fn stamp_request_id(request: &mut ApiRequest) -> String {
    let request_id = Uuid::new_v4().to_string();
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        request.headers.insert(REQUEST_ID_HEADER, value);
    }
    request_id
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use lbr_core::auth::Role;
    use lbr_core::storage::MemoryTokenStorage;

    use super::*;
    use crate::testing::{jwt_expiring_in, FakeBackend};
    use crate::ClientError;

    fn session() -> Arc<SessionStore> {
        Arc::new(SessionStore::load(Arc::new(MemoryTokenStorage::new())))
    }

    fn session_with(access_token: &str, refresh_token: &str) -> Arc<SessionStore> {
        let session = session();
        session
            .set(TokenPair::new(access_token, refresh_token))
            .unwrap();
        session
    }

    fn gateway(backend: &Arc<FakeBackend>, session: &Arc<SessionStore>) -> AuthGateway {
        AuthGateway::new(ClientConfig::default(), backend.clone(), session.clone())
    }

    fn get(gateway: &AuthGateway, path: &str) -> ApiRequest {
        ApiRequest::get(gateway.url(path))
    }

    #[tokio::test]
    async fn test_public_request_skips_token() {
        let t1 = jwt_expiring_in("alice", Role::Reader, 3600);
        let backend = Arc::new(FakeBackend::new().accept(&t1));
        let session = session_with(&t1, "r1");
        let gateway = gateway(&backend, &session);

        let resp = gateway.send(get(&gateway, "/books")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let sent = backend.requests_to("/books");
        assert_eq!(sent.len(), 1);
        assert!(sent[0].bearer_token().is_none());
        assert!(sent[0].headers.contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_private_request_carries_token() {
        let t1 = jwt_expiring_in("alice", Role::Reader, 3600);
        let backend = Arc::new(FakeBackend::new().accept(&t1));
        let session = session_with(&t1, "r1");
        let gateway = gateway(&backend, &session);

        let resp = gateway.send(get(&gateway, "/cart")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(backend.requests_to("/cart")[0].bearer_token(), Some(t1.as_str()));
        assert_eq!(backend.refresh_calls(), 0);
    }

    #[tokio::test]
    async fn test_non_401_failures_pass_through() {
        let t1 = jwt_expiring_in("alice", Role::Reader, 3600);
        let backend = Arc::new(FakeBackend::new().accept(&t1));
        let session = session_with(&t1, "r1");
        let gateway = gateway(&backend, &session);

        let resp = gateway.send(get(&gateway, "/boom")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let resp = gateway.send(get(&gateway, "/forbidden")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        assert_eq!(backend.refresh_calls(), 0);
        assert_eq!(session.access_token(), Some(t1));
    }

    #[tokio::test]
    async fn test_concurrent_401s_share_one_refresh_and_replay_once() {
        let t1 = jwt_expiring_in("alice", Role::Reader, -60);
        let t2 = jwt_expiring_in("alice", Role::Reader, 3600);
        let backend = Arc::new(
            FakeBackend::new()
                .refresh_to("r1", TokenPair::new(t2.clone(), "r2"))
                .with_refresh_delay(Duration::from_millis(20)),
        );
        let session = session_with(&t1, "r1");
        let gateway = gateway(&backend, &session);

        let results = tokio::join!(
            gateway.send(get(&gateway, "/cart")),
            gateway.send(get(&gateway, "/cart")),
            gateway.send(get(&gateway, "/cart")),
            gateway.send(get(&gateway, "/cart")),
            gateway.send(get(&gateway, "/cart")),
        );
        for resp in [results.0, results.1, results.2, results.3, results.4] {
            assert_eq!(resp.unwrap().status(), StatusCode::OK);
        }

        assert_eq!(backend.refresh_calls(), 1);
        let sent = backend.requests_to("/cart");
        assert_eq!(sent.len(), 10);
        let retried = sent
            .iter()
            .filter(|r| r.bearer_token() == Some(t2.as_str()))
            .count();
        assert_eq!(retried, 5);
        assert_eq!(session.persisted_refresh_token().unwrap().as_deref(), Some("r2"));
    }

    #[tokio::test]
    async fn test_missing_refresh_token_fails_fast() {
        let backend = Arc::new(FakeBackend::new());
        let session = session();
        let gateway = gateway(&backend, &session);

        let err = gateway.send(get(&gateway, "/cart")).await.unwrap_err();
        assert!(matches!(err, ClientError::Core(lbr_core::Error::NoRefreshToken)));
        assert!(err.is_session_expired());
        assert_eq!(backend.refresh_calls(), 0);
    }

    #[tokio::test]
    async fn test_refresh_token_removed_elsewhere_logs_out() {
        let t1 = jwt_expiring_in("alice", Role::Reader, -60);
        let backend = Arc::new(FakeBackend::new().refresh_to("r1", TokenPair::new("unused", "r2")));
        let storage = Arc::new(MemoryTokenStorage::new());
        let session = Arc::new(SessionStore::load(storage.clone()));
        session.set(TokenPair::new(t1, "r1")).unwrap();

        // 같은 저장소를 쓰는 다른 세션이 로그아웃
        SessionStore::load(storage.clone()).clear().unwrap();
        assert!(session.token().is_some());

        let gateway = gateway(&backend, &session);
        let err = gateway.send(get(&gateway, "/cart")).await.unwrap_err();
        assert!(matches!(err, ClientError::Core(lbr_core::Error::NoRefreshToken)));
        assert!(session.token().is_none());
        assert!(session.current_claim().is_none());
        assert_eq!(backend.refresh_calls(), 0);
    }

    #[tokio::test]
    async fn test_refresh_call_gets_its_own_request_id() {
        let t1 = jwt_expiring_in("alice", Role::Reader, -60);
        let t2 = jwt_expiring_in("alice", Role::Reader, 3600);
        let backend = Arc::new(FakeBackend::new().refresh_to("r1", TokenPair::new(t2, "r2")));
        let session = session_with(&t1, "r1");
        let gateway = gateway(&backend, &session);

        gateway.send(get(&gateway, "/cart")).await.unwrap();

        let refresh = backend.requests_to("/auth/refresh-token");
        assert_eq!(refresh.len(), 1);
        let refresh_id = refresh[0].headers.get("x-request-id").cloned().unwrap();
        let cart_id = backend.requests_to("/cart")[0].headers.get("x-request-id").cloned().unwrap();
        assert!(Uuid::parse_str(refresh_id.to_str().unwrap()).is_ok());
        assert_ne!(refresh_id, cart_id);
    }

    #[tokio::test]
    async fn test_rejected_refresh_fails_all_waiters_and_logs_out() {
        let t1 = jwt_expiring_in("alice", Role::Reader, -60);
        let backend = Arc::new(
            FakeBackend::new()
                .refresh_to("other", TokenPair::new("unused", "unused"))
                .with_refresh_delay(Duration::from_millis(20)),
        );
        let session = session_with(&t1, "r1");
        let gateway = gateway(&backend, &session);

        let (a, b, c) = tokio::join!(
            gateway.send(get(&gateway, "/cart")),
            gateway.send(get(&gateway, "/orders")),
            gateway.send(get(&gateway, "/profile")),
        );
        for result in [a, b, c] {
            match result {
                Err(ClientError::Core(lbr_core::Error::RefreshRejected { status, .. })) => {
                    assert_eq!(status, 401)
                }
                other => panic!("Expected RefreshRejected, got {:?}", other.map(|r| r.status())),
            }
        }

        assert_eq!(backend.refresh_calls(), 1);
        assert!(session.token().is_none());
        assert!(session.persisted_refresh_token().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_login_then_expiry_refreshes_transparently() {
        let t1 = jwt_expiring_in("alice", Role::Reader, -1);
        let t2 = jwt_expiring_in("alice", Role::Reader, 3600);
        let backend = Arc::new(
            FakeBackend::new()
                .login_to(TokenPair::new(t1.clone(), "r1"))
                .refresh_to("r1", TokenPair::new(t2.clone(), "r2")),
        );
        let session = session();
        let gateway = gateway(&backend, &session);

        gateway.login("alice", "x").await.unwrap();
        assert_eq!(session.current_claim().unwrap().sub, "alice");

        let resp = gateway.send(get(&gateway, "/cart")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(backend.refresh_calls(), 1);
        assert_eq!(session.access_token(), Some(t2));
        assert_eq!(session.persisted_refresh_token().unwrap().as_deref(), Some("r2"));
    }

    #[tokio::test]
    async fn test_login_with_bad_credentials_keeps_session_empty() {
        let t1 = jwt_expiring_in("alice", Role::Reader, 3600);
        let backend = Arc::new(FakeBackend::new().login_to(TokenPair::new(t1, "r1")));
        let session = session();
        let gateway = gateway(&backend, &session);

        let err = gateway.login("alice", "wrong").await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        assert!(session.token().is_none());
        assert_eq!(backend.refresh_calls(), 0);
    }

    #[tokio::test]
    async fn test_401_on_retry_is_returned_without_second_refresh() {
        let t1 = jwt_expiring_in("alice", Role::Reader, 3600);
        let t2 = jwt_expiring_in("alice", Role::Reader, 3600);
        let backend = Arc::new(FakeBackend::new().refresh_to("r1", TokenPair::new(t2, "r2")));
        let session = session_with(&t1, "r1");
        let gateway = gateway(&backend, &session);

        let resp = gateway.send(get(&gateway, "/denied")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(backend.refresh_calls(), 1);
        assert_eq!(backend.requests_to("/denied").len(), 2);
    }

    #[tokio::test]
    async fn test_stalled_refresh_times_out_and_logs_out() {
        let t1 = jwt_expiring_in("alice", Role::Reader, -60);
        let t2 = jwt_expiring_in("alice", Role::Reader, 3600);
        let backend = Arc::new(
            FakeBackend::new()
                .refresh_to("r1", TokenPair::new(t2, "r2"))
                .with_refresh_delay(Duration::from_millis(500)),
        );
        let session = session_with(&t1, "r1");
        let config = ClientConfig::default().with_refresh_timeout(Duration::from_millis(20));
        let gateway = AuthGateway::new(config, backend.clone(), session.clone());

        let err = gateway.send(get(&gateway, "/cart")).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Core(lbr_core::Error::RefreshTimedOut { .. })
        ));
        assert!(err.is_session_expired());
        assert!(session.token().is_none());
    }

    #[tokio::test]
    async fn test_existence_checks() {
        let backend = Arc::new(
            FakeBackend::new()
                .taken("taken@example.com")
                .taken("alice"),
        );
        let session = session();
        let gateway = gateway(&backend, &session);

        assert!(gateway.email_exists("taken@example.com", None).await.unwrap());
        assert!(!gateway
            .email_exists("taken@example.com", Some("taken@example.com"))
            .await
            .unwrap());
        assert!(!gateway.email_exists("free@example.com", None).await.unwrap());
        assert!(gateway.username_exists("alice", None).await.unwrap());
        assert!(!gateway.username_exists("bob", None).await.unwrap());

        let sent = backend.requests_to("/profile/check-email");
        assert!(sent.iter().all(|r| r.bearer_token().is_none()));
        assert_eq!(backend.refresh_calls(), 0);
    }
}
