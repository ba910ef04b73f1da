//! 경로 패턴
//!
//! 두 가지 형태를 지원합니다:
//! - 템플릿: `/books/:bookId` (`:name`은 비어있지 않은 한 segment와 매칭)
//! - 정규식: `^/books/page(?:$|/)`

use std::fmt;

use regex::Regex;

use crate::error::{Error, Result};

/// 컴파일된 경로 패턴
#[derive(Clone)]
pub struct PathPattern {
    source: String,
    regex: Regex,
}

impl PathPattern {
    /// 템플릿 패턴 컴파일 (양 끝 고정)
    pub fn template(template: &str) -> Result<Self> {
        let mut expr = String::from("^");
        for (i, segment) in template.split('/').enumerate() {
            if i > 0 {
                expr.push('/');
            }
            if segment.starts_with(':') && segment.len() > 1 {
                expr.push_str("[^/]+");
            } else {
                expr.push_str(&regex::escape(segment));
            }
        }
        expr.push('$');

        Self::compile(template, &expr)
    }

    /// 정규식 패턴 컴파일 (그대로 사용)
    pub fn regex(expr: &str) -> Result<Self> {
        Self::compile(expr, expr)
    }

    fn compile(source: &str, expr: &str) -> Result<Self> {
        let regex = Regex::new(expr).map_err(|e| Error::InvalidPattern {
            pattern: source.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Debug for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PathPattern").field(&self.source).finish()
    }
}

/// URL에서 경로만 추출
///
/// scheme/host, query, fragment를 제거합니다. 상대 경로도 허용합니다.
pub fn normalize_path(url: &str) -> String {
    let url = url.trim();
    let without_fragment = url.split('#').next().unwrap_or_default();
    let without_query = without_fragment.split('?').next().unwrap_or_default();

    let rest = if let Some(idx) = without_query.find("://") {
        &without_query[idx + 3..]
    } else if let Some(stripped) = without_query.strip_prefix("//") {
        stripped
    } else {
        return ensure_leading_slash(without_query);
    };

    match rest.find('/') {
        Some(idx) => rest[idx..].to_string(),
        None => "/".to_string(),
    }
}

/// base path 접두사 제거 (`/api/books` → `/books`)
///
/// segment 경계에서만 제거합니다. `/apiary`는 `/api`로 시작하지 않는 것으로 봅니다.
pub fn strip_base_path<'a>(path: &'a str, base_path: &str) -> &'a str {
    let base = base_path.trim_end_matches('/');
    if base.is_empty() {
        return path;
    }
    match path.strip_prefix(base) {
        Some("") => "/",
        Some(rest) if rest.starts_with('/') => rest,
        _ => path,
    }
}

fn ensure_leading_slash(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}
