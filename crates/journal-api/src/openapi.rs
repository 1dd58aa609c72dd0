//! OpenAPI 문서화 설정.
//!
//! utoipa를 사용하여 REST API의 OpenAPI 3.0 스펙을 생성합니다.
//! Swagger UI는 `/swagger-ui` 경로에서 사용 가능합니다.
//!
//! # 자동 생성 구조
//!
//! 각 라우트 모듈은 자체 스키마를 정의하고, 중앙 `ApiDoc`에서 집계합니다.
//! 새로운 엔드포인트를 추가할 때:
//!
//! 1. 응답/요청 타입에 `#[derive(ToSchema)]` 추가
//! 2. 핸들러에 `#[utoipa::path(...)]` 어노테이션 추가
//! 3. 이 파일의 `components(schemas(...))` 및 `paths(...)` 섹션에 추가

use axum::Router;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::AccessToken;
use crate::error::ApiErrorResponse;
use crate::repository::CredentialSummary;
use crate::routes::{
    ComponentHealth, ComponentStatus, CredentialListResponse, HealthResponse, LoginRequest,
    ProfileResponse, RegisterRequest, RegisterResponse, UpdateProfileRequest,
    UpsertCredentialRequest,
};

/// Trading Journal API 문서.
///
/// 모든 엔드포인트와 스키마를 포함하는 OpenAPI 3.0 스펙입니다.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Trading Journal API",
        version = "0.1.0",
        description = r#"
# 트레이딩 저널 REST API

여러 암호화폐 거래소의 잔고를 한 번에 집계하는 트레이딩 저널 백엔드입니다.

## 주요 기능

- **인증**: 회원가입(만 16세 이상) 및 JWT 로그인
- **자격증명 관리**: 거래소 API 키 암호화 저장 (AES-256-GCM)
- **잔고 집계**: 등록된 거래소 전체 동시 조회, 개별 실패 격리

## 인증

`/api/v1/auth` 이외의 엔드포인트는 JWT Bearer 토큰 인증이 필요합니다.
`Authorization: Bearer <token>` 헤더를 포함하세요.
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "로컬 개발 서버"),
    ),
    tags(
        (name = "health", description = "헬스 체크 - 서버 상태 확인"),
        (name = "auth", description = "인증 - 회원가입/로그인"),
        (name = "profile", description = "프로필 - 이메일/전화번호 갱신"),
        (name = "credentials", description = "자격증명 - 거래소 API 키 관리"),
        (name = "balances", description = "잔고 - 거래소 잔고 집계")
    ),
    components(
        schemas(
            // ===== Health =====
            HealthResponse,
            ComponentHealth,
            ComponentStatus,

            // ===== Common =====
            ApiErrorResponse,

            // ===== Auth =====
            RegisterRequest,
            RegisterResponse,
            LoginRequest,
            AccessToken,

            // ===== Profile =====
            UpdateProfileRequest,
            ProfileResponse,

            // ===== Credentials =====
            UpsertCredentialRequest,
            CredentialSummary,
            CredentialListResponse,
        )
    ),
    paths(
        // ===== Health =====
        crate::routes::health::health_check,
        crate::routes::health::health_ready,

        // ===== Auth =====
        crate::routes::auth::register,
        crate::routes::auth::login,

        // ===== Profile =====
        crate::routes::profile::update_profile,

        // ===== Credentials =====
        crate::routes::credentials::upsert_credential,
        crate::routes::credentials::list_credentials,
        crate::routes::credentials::delete_credential,

        // ===== Balances =====
        crate::routes::balances::get_balances,
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// JWT Bearer 인증 스킴 등록.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Swagger UI 라우터 생성.
///
/// 다음 경로에 문서 UI를 마운트합니다:
/// - `/swagger-ui` - Swagger UI 대화형 문서
/// - `/api-docs/openapi.json` - OpenAPI JSON 스펙
pub fn swagger_ui_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}
