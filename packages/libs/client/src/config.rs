//! 클라이언트 설정

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ClientError, Result};

/// 게이트웨이 설정
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL (path 접두사 포함 가능, 예: `http://localhost:8080/api`)
    pub api_base_url: String,

    /// 토큰 저장 디렉터리 (없으면 `~/.lbr`)
    pub token_dir: Option<PathBuf>,

    /// refresh 호출 제한 시간. 없으면 무제한 대기
    pub refresh_timeout: Option<Duration>,

    /// 개별 HTTP 요청 제한 시간
    pub http_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".to_string(),
            token_dir: None,
            refresh_timeout: None,
            http_timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            api_base_url: env::var("LBR_API_BASE_URL").unwrap_or(defaults.api_base_url),

            token_dir: env::var("LBR_TOKEN_DIR").ok().map(PathBuf::from),

            refresh_timeout: match env::var("LBR_REFRESH_TIMEOUT_SECS") {
                Ok(v) => Some(Duration::from_secs(parse_secs("LBR_REFRESH_TIMEOUT_SECS", &v)?)),
                Err(_) => None,
            },

            http_timeout: match env::var("LBR_HTTP_TIMEOUT_SECS") {
                Ok(v) => Duration::from_secs(parse_secs("LBR_HTTP_TIMEOUT_SECS", &v)?),
                Err(_) => defaults.http_timeout,
            },
        })
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = Some(timeout);
        self
    }

    /// base URL 끝의 `/` 제거
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }

    /// base URL의 path 부분 (엔드포인트 분류 전에 제거됨)
    pub fn base_path(&self) -> String {
        let path = lbr_core::endpoint::normalize_path(self.base_url());
        if path == "/" {
            String::new()
        } else {
            path
        }
    }

    /// 백엔드 상대 경로로 전체 URL 생성
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url(), path)
        } else {
            format!("{}/{}", self.base_url(), path)
        }
    }
}

fn parse_secs(name: &str, value: &str) -> Result<u64> {
    value.trim().parse().map_err(|_| ClientError::Config {
        message: format!("{} must be a number of seconds, got {:?}", name, value),
    })
}
