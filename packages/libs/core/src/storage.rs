//! 토큰 영속 저장소
//!
//! 고정된 키 아래에 JSON 텍스트를 저장하는 단순한 key-value 저장소입니다.
//! 세션은 시작 시 한 번 읽고, 로그인/갱신/로그아웃 때만 씁니다.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{Error, Result};

/// 토큰 페어가 저장되는 키
pub const TOKEN_STORAGE_KEY: &str = "token";

/// 영속 key-value 저장소
pub trait TokenStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}

/// 파일 기반 저장소 (`<dir>/<key>.json`)
#[derive(Debug, Clone)]
pub struct FileTokenStorage {
    dir: PathBuf,
}

impl FileTokenStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// 기본 위치 (`~/.lbr`)
    pub fn default_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| Error::Storage {
            message: "cannot find home directory".to_string(),
        })?;
        Ok(home.join(".lbr"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(Error::Storage {
                message: format!("invalid storage key: {:?}", key),
            });
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl TokenStorage for FileTokenStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        if path.exists() {
            Ok(Some(std::fs::read_to_string(&path)?))
        } else {
            Ok(None)
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        Ok(())
    }
}

/// 메모리 저장소 (테스트, 임베딩용)
#[derive(Debug, Default)]
pub struct MemoryTokenStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryTokenStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries.lock().map_err(|_| Error::Storage {
            message: "memory storage lock poisoned".to_string(),
        })
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}
