//! 세션 스토어 (토큰 상태)
//!
//! 프로세스 수명 동안 하나의 토큰 페어와 그로부터 디코딩한 claim을 보관합니다.
//! 로그인/갱신/로그아웃만이 상태를 바꾸며, 변경은 `watch` 채널로 관찰할 수 있습니다.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use lbr_core::auth::{self, AccessDecision, Role, RouteRequirement, TokenPair, UserClaim};
use lbr_core::storage::{TokenStorage, TOKEN_STORAGE_KEY};
use tokio::sync::watch;

use crate::error::Result;

/// 메모리 상의 세션 상태
///
/// 불변식: `claim.is_none() == token.is_none()`
#[derive(Debug, Default)]
struct SessionState {
    token: Option<TokenPair>,
    claim: Option<UserClaim>,
}

/// 세션 스토어
pub struct SessionStore {
    storage: Arc<dyn TokenStorage>,
    state: RwLock<SessionState>,
    claim_tx: watch::Sender<Option<UserClaim>>,
}

impl SessionStore {
    /// 저장소에서 토큰을 읽어 세션 생성
    ///
    /// 저장된 값이 손상되었거나 디코딩할 수 없으면 빈 세션으로 시작합니다.
    pub fn load(storage: Arc<dyn TokenStorage>) -> Self {
        let store = Self {
            storage,
            state: RwLock::new(SessionState::default()),
            claim_tx: watch::Sender::new(None),
        };

        match store.read_persisted() {
            Ok(Some(token)) => match token.claims() {
                Ok(claim) => store.replace(Some(token), Some(claim)),
                Err(e) => tracing::warn!("stored access token is unreadable, ignoring: {}", e),
            },
            Ok(None) => {}
            Err(e) => tracing::warn!("failed to load stored token: {}", e),
        }

        store
    }

    /// 토큰 설정
    ///
    /// Access Token 값이 현재와 같으면 아무것도 하지 않고 `false`를 반환합니다.
    /// 디코딩할 수 없는 토큰은 상태를 바꾸지 않고 거절합니다.
    pub fn set(&self, token: TokenPair) -> Result<bool> {
        if self.access_token().as_deref() == Some(token.access_token.as_str()) {
            return Ok(false);
        }

        let claim = token.claims()?;
        let serialized = serde_json::to_string(&token).map_err(lbr_core::Error::from)?;

        tracing::debug!(sub = %claim.sub, role = %claim.role, "setting session token");
        self.storage.set(TOKEN_STORAGE_KEY, &serialized)?;
        self.replace(Some(token), Some(claim));
        Ok(true)
    }

    /// 로그아웃: 메모리 상태와 저장된 토큰 삭제
    ///
    /// 메모리 상태는 저장소 에러와 무관하게 항상 비워집니다.
    pub fn clear(&self) -> Result<()> {
        tracing::info!("clearing session");
        self.replace(None, None);
        self.storage.remove(TOKEN_STORAGE_KEY)?;
        Ok(())
    }

    pub fn current_claim(&self) -> Option<UserClaim> {
        self.read().claim.clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.read().token.as_ref().map(|t| t.access_token.clone())
    }

    pub fn token(&self) -> Option<TokenPair> {
        self.read().token.clone()
    }

    /// 저장소에 영속된 Refresh Token
    ///
    /// refresh는 메모리가 아닌 저장된 값을 기준으로 합니다.
    pub fn persisted_refresh_token(&self) -> Result<Option<String>> {
        Ok(self.read_persisted()?.map(|t| t.refresh_token))
    }

    /// 만료되지 않은 Access Token이 있는지
    pub fn is_logged_in(&self) -> bool {
        self.access_token()
            .map(|t| !auth::is_expired(&t))
            .unwrap_or(false)
    }

    /// 현재 Role (claim이 없으면 `Guest`)
    pub fn role(&self) -> Role {
        self.read()
            .claim
            .as_ref()
            .map(|c| c.role)
            .unwrap_or_default()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.read()
            .claim
            .as_ref()
            .is_some_and(|c| c.has_role(role))
    }

    /// 라우트 접근 판정
    ///
    /// 로그인이 필요하다고 판정되면 남아있는 세션을 정리합니다.
    pub fn authorize(
        &self,
        requirement: &RouteRequirement,
        library_id_param: Option<&str>,
    ) -> AccessDecision {
        let claim = self.current_claim();
        let decision = auth::evaluate_access(
            claim.as_ref(),
            self.is_logged_in(),
            requirement,
            library_id_param,
        );

        if decision == AccessDecision::RedirectToLogin {
            if let Err(e) = self.clear() {
                tracing::warn!("failed to clear session: {}", e);
            }
        }
        decision
    }

    /// claim 변경 구독
    pub fn subscribe(&self) -> watch::Receiver<Option<UserClaim>> {
        self.claim_tx.subscribe()
    }

    fn read_persisted(&self) -> Result<Option<TokenPair>> {
        match self.storage.get(TOKEN_STORAGE_KEY)? {
            Some(raw) => {
                let token = serde_json::from_str(&raw).map_err(lbr_core::Error::from)?;
                Ok(Some(token))
            }
            None => Ok(None),
        }
    }

    fn replace(&self, token: Option<TokenPair>, claim: Option<UserClaim>) {
        {
            let mut state = self.write();
            state.token = token;
            state.claim = claim.clone();
        }
        self.claim_tx.send_if_modified(|current| {
            if *current == claim {
                false
            } else {
                *current = claim;
                true
            }
        });
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        f.debug_struct("SessionStore")
            .field("logged_in", &state.token.is_some())
            .field("sub", &state.claim.as_ref().map(|c| c.sub.as_str()))
            .finish()
    }
}
