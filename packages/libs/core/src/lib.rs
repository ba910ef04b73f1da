//! lbr-core: Librarium 공통 핵심 라이브러리
//!
//! 이 크레이트는 클라이언트 게이트웨이와 CLI가 공유하는 핵심 타입과 로직을 제공합니다.
//! 런타임(tokio)이나 HTTP 클라이언트에 의존하지 않습니다.
//!
//! # 모듈 구조
//!
//! - `auth`: 토큰 페어, claims 디코딩, 만료 판정, 라우트 접근 판정
//! - `endpoint`: 요청 경로/메서드의 공개·비공개 분류
//! - `storage`: 토큰 영속 저장소
//! - `error`: 공통 에러 타입

pub mod auth;
pub mod endpoint;
pub mod error;
pub mod storage;

pub use error::{Error, Result};
