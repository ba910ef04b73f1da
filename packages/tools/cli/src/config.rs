//! CLI 설정

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use lbr_client::ClientConfig;
use serde::{Deserialize, Serialize};

/// CLI 설정 (`~/.lbr/config.json`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    /// 기본 API base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
}

impl CliConfig {
    /// 설정 파일 경로
    pub fn config_path() -> anyhow::Result<PathBuf> {
        let home = dirs::home_dir().context("cannot find home directory")?;
        Ok(home.join(".lbr").join("config.json"))
    }

    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// 파일이 없으면 기본값
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("invalid config at {}", path.display())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
        }
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("failed to write {}", path.display()))
    }

    /// 게이트웨이 설정 결정 (`--api` > 설정 파일 > 환경변수)
    pub fn client_config(&self, api_override: Option<&str>) -> anyhow::Result<ClientConfig> {
        let mut config = ClientConfig::from_env()?;
        if let Some(url) = api_override.or(self.api_base_url.as_deref()) {
            config = config.with_api_base_url(url);
        }
        Ok(config)
    }
}
