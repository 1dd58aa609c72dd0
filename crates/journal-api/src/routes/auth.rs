//! 회원가입/로그인 API.
//!
//! Argon2 해싱 + JWT 발급. 나이 검증(만 16세 이상)은 모든 가입
//! 경로에서 동일하게 적용됩니다.

use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{
    hash_password, issue_access_token, validate_password_strength, verify_password, AccessToken,
};
use crate::error::{ApiErrorResponse, ApiResult};
use crate::repository::{NewUser, UserRepository};
use crate::state::AppState;

/// 가입에 필요한 최소 나이.
const MINIMUM_AGE_YEARS: u32 = 16;

/// 회원가입 요청.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// 사용자 이름 (3~32자)
    pub username: String,
    /// 비밀번호
    pub password: String,
    /// 비밀번호 확인
    pub confirm_password: String,
    /// 생년월일 (YYYY-MM-DD)
    pub date_of_birth: NaiveDate,
}

/// 회원가입 응답.
#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// 로그인 요청.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

fn bad_request(code: &str, message: impl Into<String>) -> (StatusCode, Json<ApiErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiErrorResponse::simple(code, message)),
    )
}

/// 가입 요청 유효성 검증.
fn validate_register(req: &RegisterRequest, today: NaiveDate) -> Result<(), (StatusCode, Json<ApiErrorResponse>)> {
    let username = req.username.trim();
    if username.len() < 3 || username.len() > 32 {
        return Err(bad_request(
            "INVALID_USERNAME",
            "사용자 이름은 3자 이상 32자 이하여야 합니다",
        ));
    }

    if req.password != req.confirm_password {
        return Err(bad_request(
            "PASSWORD_MISMATCH",
            "비밀번호가 일치하지 않습니다",
        ));
    }

    validate_password_strength(&req.password)
        .map_err(|msg| bad_request("WEAK_PASSWORD", msg))?;

    match today.years_since(req.date_of_birth) {
        Some(age) if age >= MINIMUM_AGE_YEARS => Ok(()),
        _ => Err(bad_request(
            "AGE_RESTRICTION",
            format!("만 {}세 이상만 가입할 수 있습니다", MINIMUM_AGE_YEARS),
        )),
    }
}

/// 회원가입.
///
/// POST /api/v1/auth/register
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "가입 성공", body = RegisterResponse),
        (status = 400, description = "유효성 검증 실패", body = ApiErrorResponse),
        (status = 409, description = "이미 사용 중인 사용자 이름", body = ApiErrorResponse)
    )
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    validate_register(&req, Utc::now().date_naive())?;

    let password_hash = hash_password(&req.password).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiErrorResponse::new("HASHING_ERROR", e.to_string())),
        )
    })?;

    let new_user = NewUser {
        username: req.username.trim().to_string(),
        password_hash,
        date_of_birth: req.date_of_birth,
    };

    let user = UserRepository::create(&state.db_pool, &new_user)
        .await
        .map_err(|e| match &e {
            crate::repository::RepositoryError::Database(sqlx::Error::Database(db))
                if db.is_unique_violation() =>
            {
                (
                    StatusCode::CONFLICT,
                    Json(ApiErrorResponse::simple(
                        "USERNAME_TAKEN",
                        "이미 사용 중인 사용자 이름입니다",
                    )),
                )
            }
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiErrorResponse::new("DB_ERROR", e.to_string())),
            ),
        })?;

    info!("New user registered: {}", user.username);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id,
            username: user.username,
            created_at: user.created_at,
        }),
    ))
}

/// 로그인.
///
/// 사용자 미존재와 비밀번호 불일치는 동일한 401로 응답합니다.
/// POST /api/v1/auth/login
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "로그인 성공", body = AccessToken),
        (status = 401, description = "인증 실패", body = ApiErrorResponse)
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AccessToken>> {
    let invalid = || {
        (
            StatusCode::UNAUTHORIZED,
            Json(ApiErrorResponse::simple(
                "INVALID_CREDENTIALS",
                "사용자 이름 또는 비밀번호가 올바르지 않습니다",
            )),
        )
    };

    let user = UserRepository::find_by_username(&state.db_pool, req.username.trim())
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiErrorResponse::new("DB_ERROR", e.to_string())),
            )
        })?
        .ok_or_else(invalid)?;

    if verify_password(&req.password, &user.password_hash).is_err() {
        warn!("Failed login attempt for user: {}", user.username);
        return Err(invalid());
    }

    let token = issue_access_token(
        &user.id.to_string(),
        &user.username,
        &state.jwt_secret,
        state.token_expires_minutes,
    )
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiErrorResponse::new("TOKEN_ERROR", e.to_string())),
        )
    })?;

    Ok(Json(token))
}

/// 인증 라우터 생성.
pub fn auth_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}
