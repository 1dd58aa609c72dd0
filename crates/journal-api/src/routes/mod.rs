//! API 라우트.
//!
//! 모든 REST API 엔드포인트를 정의하고 라우터를 구성합니다.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 상세 헬스 체크 (readiness)
//! - `/api/v1/auth` - 회원가입/로그인
//! - `/api/v1/profile` - 프로필 갱신
//! - `/api/v1/credentials` - 거래소 자격증명 관리
//! - `/api/v1/balances` - 잔고 집계 대시보드

pub mod auth;
pub mod balances;
pub mod credentials;
pub mod health;
pub mod profile;

pub use auth::{auth_router, LoginRequest, RegisterRequest, RegisterResponse};
pub use balances::balances_router;
pub use credentials::{credentials_router, CredentialListResponse, UpsertCredentialRequest};
pub use health::{health_router, ComponentHealth, ComponentStatus, HealthResponse};
pub use profile::{profile_router, ProfileResponse, UpdateProfileRequest};

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

/// 전체 API 라우터 생성.
///
/// 모든 서브 라우터를 조합하여 하나의 라우터로 반환합니다.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        // 헬스 체크 엔드포인트
        .nest("/health", health_router())
        // API v1 엔드포인트
        .nest("/api/v1/auth", auth_router())
        .nest("/api/v1/profile", profile_router())
        .nest("/api/v1/credentials", credentials_router())
        .nest("/api/v1/balances", balances_router())
}
