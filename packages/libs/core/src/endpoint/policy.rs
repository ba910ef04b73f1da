//! 엔드포인트 공개/비공개 판정 정책

use std::sync::LazyLock;

use super::pattern::{normalize_path, strip_base_path, PathPattern};
use crate::error::Result;

/// 요청 분류 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// 토큰 없이 호출 가능
    Public,
    /// 토큰 필요
    Private,
}

impl Visibility {
    pub fn is_public(&self) -> bool {
        matches!(self, Visibility::Public)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "PUBLIC",
            Visibility::Private => "PRIVATE",
        }
    }
}

/// 공개 엔드포인트 허용 메서드
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Methods {
    All,
    Only(Vec<String>),
}

impl Methods {
    pub fn only(methods: &[&str]) -> Self {
        Methods::Only(methods.iter().map(|m| m.to_ascii_uppercase()).collect())
    }

    fn allows(&self, method: &str) -> bool {
        match self {
            Methods::All => true,
            Methods::Only(list) => list.iter().any(|m| m.eq_ignore_ascii_case(method)),
        }
    }
}

/// 공개 허용 목록 항목
#[derive(Debug, Clone)]
pub struct PublicEndpoint {
    pub pattern: PathPattern,
    pub methods: Methods,
}

/// 엔드포인트 정책
///
/// # 판정 순서 (먼저 매칭되는 규칙 적용)
/// 1. secure override 패턴에 매칭 → 무조건 `Private`
/// 2. 공개 허용 목록에서 경로와 메서드가 모두 매칭 → `Public`
/// 3. 그 외 → `Private`
///
/// secure override는 접두사 충돌을 막기 위해 존재합니다.
/// `/books`는 목록 조회용으로 공개지만, `/books/create`는 절대 공개로 취급되면 안 됩니다.
#[derive(Debug, Clone, Default)]
pub struct EndpointPolicy {
    secure_overrides: Vec<PathPattern>,
    public: Vec<PublicEndpoint>,
    base_path: String,
}

static BOOKSTORE: LazyLock<EndpointPolicy> = LazyLock::new(|| {
    build_bookstore().expect("invalid built-in endpoint pattern")
});

fn build_bookstore() -> Result<EndpointPolicy> {
    let secure = [
        r"^/books/page(?:$|/)",
        r"^/books/search(?:$|/)",
        r"^/books/edit(?:$|/)",
        r"^/books/copy(?:$|/)",
        r"^/books/library(?:$|/)",
        r"^/books/create(?:$|/)",
        r"^/libraries/stats(?:$|/)",
        r"^/profile/(?:$|/)",
        r"^/storeOrders/stat(?:$|/)",
        r"^/uploads/(?:$|/)",
        r"^/orders/(?:$|/)",
    ];

    let public: [(&str, Methods); 11] = [
        ("/auth/login", Methods::All),
        ("/auth/register", Methods::All),
        ("/auth/refresh-token", Methods::All),
        ("/libraries", Methods::only(&["GET"])),
        ("/libraries/:libraryId", Methods::only(&["GET"])),
        ("/books", Methods::only(&["GET"])),
        ("/books/:bookId", Methods::only(&["GET"])),
        ("/genres", Methods::only(&["GET"])),
        ("/files", Methods::only(&["GET"])),
        ("/profile/check-email", Methods::only(&["POST"])),
        ("/profile/check-username", Methods::only(&["POST"])),
    ];

    let mut policy = EndpointPolicy::new();
    for expr in secure {
        policy = policy.with_secure_override(expr)?;
    }
    for (template, methods) in public {
        policy = policy.with_public(template, methods)?;
    }
    Ok(policy)
}

impl EndpointPolicy {
    /// 빈 정책 (모든 요청이 `Private`)
    pub fn new() -> Self {
        Self::default()
    }

    /// 도서관/서점 백엔드용 기본 정책
    pub fn bookstore() -> Self {
        BOOKSTORE.clone()
    }

    /// secure override 정규식 추가
    pub fn with_secure_override(mut self, expr: &str) -> Result<Self> {
        self.secure_overrides.push(PathPattern::regex(expr)?);
        Ok(self)
    }

    /// 공개 엔드포인트 템플릿 추가
    pub fn with_public(mut self, template: &str, methods: Methods) -> Result<Self> {
        self.public.push(PublicEndpoint {
            pattern: PathPattern::template(template)?,
            methods,
        });
        Ok(self)
    }

    /// 판정 전에 제거할 API base path (예: `/api`)
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// 요청 분류
    pub fn classify(&self, url: &str, method: &str) -> Visibility {
        let normalized = normalize_path(url);
        let path = strip_base_path(&normalized, &self.base_path);

        if let Some(pattern) = self.secure_overrides.iter().find(|p| p.is_match(path)) {
            tracing::debug!(
                path,
                method,
                pattern = pattern.as_str(),
                "matched secure pattern → PRIVATE"
            );
            return Visibility::Private;
        }

        let visibility = if self
            .public
            .iter()
            .any(|e| e.pattern.is_match(path) && e.methods.allows(method))
        {
            Visibility::Public
        } else {
            Visibility::Private
        };

        tracing::debug!(path, method, result = visibility.as_str(), "endpoint classified");
        visibility
    }
}
