//! HTTP 전송 계층
//!
//! 게이트웨이는 요청을 재시도해야 하므로, 복제 가능한 자체 요청 타입을 사용합니다.
//! 실제 전송은 [`HttpTransport`] 구현체가 담당합니다 (기본: reqwest).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ClientError, Result};

/// 나가는 요청
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// JSON 본문 설정
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        let bytes = serde_json::to_vec(body).map_err(lbr_core::Error::from)?;
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.body = Some(bytes);
        Ok(self)
    }

    /// `Authorization: Bearer <token>` 설정 (기존 값 교체)
    ///
    /// 헤더로 쓸 수 없는 토큰이면 요청을 그대로 둡니다. 백엔드가 401로 거절합니다.
    pub fn bearer_auth(mut self, token: &str) -> Self {
        match HeaderValue::from_str(&lbr_core::auth::bearer_value(token)) {
            Ok(mut value) => {
                value.set_sensitive(true);
                self.headers.insert(AUTHORIZATION, value);
            }
            Err(_) => {
                tracing::warn!(url = %self.url, "access token is not a valid header value");
            }
        }
        self
    }

    /// 현재 Authorization 헤더의 Bearer 토큰
    pub fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(lbr_core::auth::parse_bearer)
    }
}

/// 받은 응답
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| ClientError::InvalidBody {
            message: e.to_string(),
        })
    }

    /// 성공 응답만 JSON으로 변환, 그 외는 [`ClientError::Http`]
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T> {
        if !self.status.is_success() {
            return Err(ClientError::Http {
                status: self.status,
                body: self.text(),
            });
        }
        self.json()
    }
}

/// HTTP 전송 seam
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// 요청 전송. 상태 코드와 무관하게 응답을 받으면 `Ok`
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse>;
}

/// reqwest 기반 전송
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let body = resp.bytes().await?.to_vec();

        Ok(ApiResponse::new(status, body))
    }
}
