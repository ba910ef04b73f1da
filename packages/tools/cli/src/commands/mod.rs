//! CLI 명령어 구현

pub mod auth;
pub mod config;
pub mod endpoint;
pub mod http;
pub mod profile;
