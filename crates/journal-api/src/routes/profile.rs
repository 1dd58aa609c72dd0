//! 사용자 프로필 API.

use axum::{extract::State, http::StatusCode, routing::put, Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::JwtAuth;
use crate::error::{ApiErrorResponse, ApiResult};
use crate::repository::UserRepository;
use crate::state::AppState;

/// 프로필 갱신 요청. 전달된 필드만 갱신됩니다.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// 프로필 응답.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: NaiveDate,
}

/// 프로필(이메일/전화번호) 갱신.
///
/// PUT /api/v1/profile
#[utoipa::path(
    put,
    path = "/api/v1/profile",
    tag = "profile",
    request_body = UpdateProfileRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "갱신된 프로필", body = ProfileResponse),
        (status = 401, description = "인증 실패"),
        (status = 404, description = "사용자 없음", body = ApiErrorResponse)
    )
)]
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    let user_id = claims.user_id().map_err(|_| {
        (
            StatusCode::UNAUTHORIZED,
            Json(ApiErrorResponse::simple("INVALID_TOKEN", "유효하지 않은 토큰")),
        )
    })?;

    let user = UserRepository::update_profile(
        &state.db_pool,
        user_id,
        req.email.as_deref(),
        req.phone.as_deref(),
    )
    .await
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiErrorResponse::new("DB_ERROR", e.to_string())),
        )
    })?
    .ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(ApiErrorResponse::simple("NOT_FOUND", "사용자를 찾을 수 없습니다")),
        )
    })?;

    Ok(Json(ProfileResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        phone: user.phone,
        date_of_birth: user.date_of_birth,
    }))
}

/// 프로필 라우터 생성.
pub fn profile_router() -> Router<Arc<AppState>> {
    Router::new().route("/", put(update_profile))
}
