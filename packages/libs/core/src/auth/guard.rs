//! 라우트 접근 판정
//!
//! 로그인 여부, Role, 도서관 소유권으로 화면/명령 접근을 결정합니다.

use super::claims::{Role, UserClaim};

/// 라우트가 요구하는 조건
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteRequirement {
    /// 필요한 Role (없으면 로그인만 요구)
    pub role: Option<Role>,

    /// 사서 라우트에서 `libraryId` 파라미터와 소속 도서관 일치 확인
    pub check_ownership: bool,
}

impl RouteRequirement {
    pub fn logged_in() -> Self {
        Self::default()
    }

    pub fn role(role: Role) -> Self {
        Self {
            role: Some(role),
            check_ownership: false,
        }
    }

    pub fn with_ownership(mut self) -> Self {
        self.check_ownership = true;
        self
    }
}

/// 접근 판정 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    /// 로그인 필요 (세션은 정리되어야 함)
    RedirectToLogin,
    Forbidden,
}

/// 접근 판정
///
/// # 판정 순서
/// 1. 로그인되어 있지 않음 → `RedirectToLogin`
/// 2. 요구 Role 미보유 → `Forbidden`
/// 3. 사서 소유권 확인: 라우트의 `libraryId`와 claim의 `libraryId`가 모두 있고 다르면 `Forbidden`
pub fn evaluate(
    claim: Option<&UserClaim>,
    logged_in: bool,
    requirement: &RouteRequirement,
    library_id_param: Option<&str>,
) -> AccessDecision {
    let claim = match claim {
        Some(claim) if logged_in => claim,
        _ => return AccessDecision::RedirectToLogin,
    };

    if let Some(role) = requirement.role {
        if !claim.has_role(role) {
            return AccessDecision::Forbidden;
        }
    }

    if requirement.check_ownership && requirement.role == Some(Role::Librarian) {
        if let (Some(param), Some(own)) = (library_id_param, claim.library_id.as_deref()) {
            if param != own {
                return AccessDecision::Forbidden;
            }
        }
    }

    AccessDecision::Allow
}
