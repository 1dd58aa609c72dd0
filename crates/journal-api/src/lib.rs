//! 트레이딩 저널 REST API.
//!
//! Axum 기반 REST 서버: 회원가입/로그인, 거래소 자격증명 관리,
//! 잔고 집계 대시보드 엔드포인트를 제공합니다.

pub mod auth;
pub mod error;
pub mod openapi;
pub mod repository;
pub mod routes;
pub mod state;

pub use error::{ApiErrorResponse, ApiResult};
pub use state::AppState;
