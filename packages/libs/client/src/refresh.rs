//! Refresh Coordinator
//!
//! 401을 받은 요청들이 동시에 몰려도 refresh 호출은 한 번만 나가도록 조정합니다.
//!
//! # 상태
//!
//! - `IDLE`: 진행 중인 refresh 없음 (`in_flight == None`)
//! - `REFRESHING`: 첫 401 요청이 refresh를 수행 중 (`in_flight == Some(rx)`)
//! - `WAITING`: 이후의 401 요청은 같은 사이클의 채널에서 결과 하나를 기다림
//! - `LOGGED_OUT`: refresh 실패 시 세션 정리 후 같은 에러를 모든 대기자에게 전파
//!
//! 사이클마다 `watch` 채널 하나를 만들고, 결과는 정확히 한 번 게시됩니다.
//! 대기자가 게시 전/후 언제 등록했든 결과를 한 번 관찰합니다.

use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use lbr_core::auth::TokenPair;
use tokio::sync::watch;

use crate::error::ClientError;
use crate::session::SessionStore;

/// 대기자에게 전파되는 refresh 실패
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshFailure {
    #[error("no refresh token persisted")]
    NoRefreshToken,

    #[error("refresh rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("refresh transport error: {message}")]
    Transport { message: String },

    #[error("refresh timed out after {after_ms}ms")]
    TimedOut { after_ms: u64 },
}

impl From<RefreshFailure> for ClientError {
    fn from(failure: RefreshFailure) -> Self {
        match failure {
            RefreshFailure::NoRefreshToken => lbr_core::Error::NoRefreshToken.into(),
            RefreshFailure::Rejected { status, message } => {
                lbr_core::Error::RefreshRejected { status, message }.into()
            }
            RefreshFailure::Transport { message } => ClientError::RefreshTransport { message },
            RefreshFailure::TimedOut { after_ms } => {
                lbr_core::Error::RefreshTimedOut { after_ms }.into()
            }
        }
    }
}

type Outcome = Option<Result<String, RefreshFailure>>;

/// 진행 중인 refresh 사이클
type InFlight = Mutex<Option<watch::Receiver<Outcome>>>;

/// Refresh Coordinator
pub struct RefreshCoordinator {
    in_flight: InFlight,
    timeout: Option<Duration>,
}

enum Cycle<'a> {
    Lead(Publisher<'a>),
    Wait(watch::Receiver<Outcome>),
}

impl RefreshCoordinator {
    /// `timeout`이 없으면 refresh 호출을 무제한 기다립니다.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            in_flight: Mutex::new(None),
            timeout,
        }
    }

    /// refresh 사이클 진행 여부
    pub fn is_refreshing(&self) -> bool {
        lock(&self.in_flight).is_some()
    }

    /// 새 Access Token 확보
    ///
    /// 진행 중인 refresh가 없으면 `refresh`를 한 번 호출하고 결과를 게시합니다.
    /// 있으면 그 결과를 기다립니다. refresh를 수행하던 쪽이 결과 게시 전에 drop되면
    /// 대기자 중 하나가 새 사이클을 시작합니다.
    pub async fn refresh_or_wait<F, Fut>(
        &self,
        session: &SessionStore,
        refresh: F,
    ) -> Result<String, RefreshFailure>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<TokenPair, RefreshFailure>>,
    {
        loop {
            match self.join_cycle() {
                Cycle::Lead(publisher) => {
                    let outcome = self.run(session, refresh).await;
                    publisher.publish(outcome.clone());
                    return outcome;
                }
                Cycle::Wait(mut rx) => {
                    tracing::debug!("refresh already in flight, waiting");
                    let published = match rx.wait_for(Option::is_some).await {
                        Ok(value) => (*value).clone(),
                        Err(_) => None,
                    };
                    match published {
                        Some(outcome) => return outcome,
                        None => tracing::debug!("refresh abandoned, taking over"),
                    }
                }
            }
        }
    }

    fn join_cycle(&self) -> Cycle<'_> {
        let mut slot = lock(&self.in_flight);
        if let Some(rx) = slot.as_ref() {
            return Cycle::Wait(rx.clone());
        }

        let (tx, rx) = watch::channel(None);
        *slot = Some(rx);
        Cycle::Lead(Publisher {
            slot: &self.in_flight,
            tx: Some(tx),
        })
    }

    async fn run<F, Fut>(&self, session: &SessionStore, refresh: F) -> Result<String, RefreshFailure>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<TokenPair, RefreshFailure>>,
    {
        let refresh_token = match session.persisted_refresh_token() {
            Ok(Some(token)) => token,
            Ok(None) => return Err(logout(session, RefreshFailure::NoRefreshToken)),
            Err(e) => {
                tracing::warn!("failed to read persisted token: {}", e);
                return Err(logout(session, RefreshFailure::NoRefreshToken));
            }
        };

        let attempt = refresh(refresh_token);
        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, attempt).await {
                Ok(result) => result,
                Err(_) => Err(RefreshFailure::TimedOut {
                    after_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                }),
            },
            None => attempt.await,
        };

        let token = match result {
            Ok(token) => token,
            Err(failure) => return Err(logout(session, failure)),
        };

        let access_token = token.access_token.clone();
        if let Err(e) = session.set(token) {
            return Err(logout(
                session,
                RefreshFailure::Rejected {
                    status: 200,
                    message: format!("refreshed token unusable: {}", e),
                },
            ));
        }

        tracing::info!("access token refreshed");
        Ok(access_token)
    }
}

impl Default for RefreshCoordinator {
    fn default() -> Self {
        Self::new(None)
    }
}

/// 사이클 결과 게시
///
/// 게시 없이 drop되면 슬롯만 비우고 채널을 닫습니다. 대기자는 닫힘을 보고 새 사이클을 시작합니다.
struct Publisher<'a> {
    slot: &'a InFlight,
    tx: Option<watch::Sender<Outcome>>,
}

impl Publisher<'_> {
    fn publish(mut self, outcome: Result<String, RefreshFailure>) {
        if let Some(tx) = self.tx.take() {
            let mut slot = lock(self.slot);
            *slot = None;
            tx.send_replace(Some(outcome));
        }
    }
}

impl Drop for Publisher<'_> {
    fn drop(&mut self) {
        if self.tx.take().is_some() {
            *lock(self.slot) = None;
        }
    }
}

fn logout(session: &SessionStore, failure: RefreshFailure) -> RefreshFailure {
    tracing::warn!("token refresh failed, logging out: {}", failure);
    if let Err(e) = session.clear() {
        tracing::warn!("failed to clear session: {}", e);
    }
    failure
}

fn lock(slot: &InFlight) -> MutexGuard<'_, Option<watch::Receiver<Outcome>>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
