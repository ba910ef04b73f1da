//! 테스트용 토큰 생성기와 가짜 백엔드

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use lbr_core::auth::{Role, TokenPair};
use lbr_core::endpoint::normalize_path;
use reqwest::{Method, StatusCode};

use crate::error::Result;
use crate::transport::{ApiRequest, ApiResponse, HttpTransport};

/// 서명 없는 JWT 형식 토큰
pub fn jwt(payload: &str) -> String {
    format!(
        "{}.{}.unsigned",
        general_purpose::URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
        general_purpose::URL_SAFE_NO_PAD.encode(payload)
    )
}

/// 지금부터 `secs`초 뒤 만료되는 토큰 (음수면 이미 만료)
pub fn jwt_expiring_in(sub: &str, role: Role, secs: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    jwt(&serde_json::json!({
        "sub": sub,
        "role": role,
        "iat": now,
        "exp": now + secs,
        "name": sub,
        "username": sub,
        "email": format!("{}@example.com", sub),
        "jti": uuid::Uuid::new_v4().to_string(),
    })
    .to_string())
}

#[derive(Default)]
struct BackendState {
    /// private 엔드포인트가 받아들이는 Access Token
    accepted_access: Option<String>,
    /// refresh 요청이 받아들이는 Refresh Token과 그 대가로 발급할 페어
    refresh: Option<(String, TokenPair)>,
    /// 로그인 시 발급할 페어
    login: Option<TokenPair>,
    /// 이미 사용 중인 이메일/사용자명
    taken: Vec<String>,
}

/// 요청을 기록하는 가짜 백엔드
///
/// - `/auth/login`, `/auth/refresh-token`: 설정된 페어 발급
/// - `GET /books`: 항상 200
/// - `/boom`: 항상 500, `/forbidden`: 항상 403, `/denied`: 항상 401
/// - 그 외: 허용된 Access Token이 있어야 200, 아니면 401
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<BackendState>,
    refresh_delay: Duration,
    refresh_calls: AtomicUsize,
    requests: Mutex<Vec<ApiRequest>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = delay;
        self
    }

    pub fn accept(self, access_token: &str) -> Self {
        self.state().accepted_access = Some(access_token.to_string());
        self
    }

    pub fn refresh_to(self, expected_refresh: &str, next: TokenPair) -> Self {
        self.state().refresh = Some((expected_refresh.to_string(), next));
        self
    }

    pub fn login_to(self, token: TokenPair) -> Self {
        self.state().login = Some(token);
        self
    }

    pub fn taken(self, value: &str) -> Self {
        self.state().taken.push(value.to_string());
        self
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    /// 특정 경로로 간 요청들
    pub fn requests_to(&self, path: &str) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| normalize_path(&r.url) == path)
            .cloned()
            .collect()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, BackendState> {
        self.state.lock().unwrap()
    }

    fn respond(status: StatusCode, body: serde_json::Value) -> ApiResponse {
        ApiResponse::new(status, body.to_string().into_bytes())
    }

    fn body(request: &ApiRequest) -> serde_json::Value {
        request
            .body
            .as_deref()
            .and_then(|b| serde_json::from_slice(b).ok())
            .unwrap_or(serde_json::Value::Null)
    }

    async fn handle(&self, request: &ApiRequest) -> ApiResponse {
        let path = normalize_path(&request.url);
        let unauthorized = || Self::respond(StatusCode::UNAUTHORIZED, serde_json::json!({"error": "unauthorized"}));

        match path.as_str() {
            "/auth/refresh-token" => {
                self.refresh_calls.fetch_add(1, Ordering::SeqCst);
                if !self.refresh_delay.is_zero() {
                    tokio::time::sleep(self.refresh_delay).await;
                }
                let presented = Self::body(request)["refreshToken"].as_str().map(str::to_string);
                let mut state = self.state();
                match state.refresh.clone() {
                    Some((expected, next)) if presented.as_deref() == Some(expected.as_str()) => {
                        state.accepted_access = Some(next.access_token.clone());
                        Self::respond(StatusCode::OK, serde_json::to_value(&next).unwrap())
                    }
                    _ => unauthorized(),
                }
            }
            "/auth/login" => {
                let body = Self::body(request);
                let state = self.state();
                match (&state.login, body["username"].as_str(), body["password"].as_str()) {
                    (Some(token), Some("alice"), Some("x")) => {
                        Self::respond(StatusCode::OK, serde_json::to_value(token).unwrap())
                    }
                    _ => unauthorized(),
                }
            }
            "/auth/register" => {
                let state = self.state();
                match &state.login {
                    Some(token) => Self::respond(StatusCode::OK, serde_json::to_value(token).unwrap()),
                    None => Self::respond(StatusCode::BAD_REQUEST, serde_json::json!({})),
                }
            }
            "/profile/check-email" | "/profile/check-username" => {
                let body = Self::body(request);
                let state = self.state();
                let requested = body["request"].as_str().unwrap_or_default();
                let current = body["current"].as_str();
                let exist = current.is_some_and(|c| c != requested)
                    && state.taken.iter().any(|e| e == requested);
                Self::respond(StatusCode::OK, serde_json::json!({ "exist": exist }))
            }
            "/books" if request.method == Method::GET => {
                Self::respond(StatusCode::OK, serde_json::json!([]))
            }
            "/boom" => Self::respond(StatusCode::INTERNAL_SERVER_ERROR, serde_json::json!({"error": "boom"})),
            "/forbidden" => Self::respond(StatusCode::FORBIDDEN, serde_json::json!({"error": "forbidden"})),
            "/denied" => unauthorized(),
            _ => {
                let state = self.state();
                match (&state.accepted_access, request.bearer_token()) {
                    (Some(accepted), Some(presented)) if accepted == presented => {
                        Self::respond(StatusCode::OK, serde_json::json!({ "path": path }))
                    }
                    _ => unauthorized(),
                }
            }
        }
    }
}

#[async_trait]
impl HttpTransport for FakeBackend {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.handle(&request).await)
    }
}
