//! 거래소 자격증명 관리 API.
//!
//! 설정 페이지 백엔드: API 키/시크릿/passphrase 업서트, 목록, 삭제.
//!
//! # 보안
//! - 모든 자격증명은 AES-256-GCM으로 암호화되어 저장
//! - API 키 값은 응답에 마스킹하여 반환

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use journal_core::{ApiCredential, ExchangeId};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::JwtAuth;
use crate::error::{ApiErrorResponse, ApiResult};
use crate::repository::{CredentialRepository, CredentialSummary};
use crate::state::AppState;

/// 자격증명 업서트 요청.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpsertCredentialRequest {
    pub api_key: String,
    pub api_secret: String,
    /// Bitget / Coinbase Pro / KuCoin 필수
    pub passphrase: Option<String>,
}

/// 자격증명 목록 응답.
#[derive(Debug, Serialize, ToSchema)]
pub struct CredentialListResponse {
    pub credentials: Vec<CredentialSummary>,
    pub total: usize,
}

fn authenticated_user(claims: &crate::auth::Claims) -> Result<Uuid, (StatusCode, Json<ApiErrorResponse>)> {
    claims.user_id().map_err(|_| {
        (
            StatusCode::UNAUTHORIZED,
            Json(ApiErrorResponse::simple("INVALID_TOKEN", "유효하지 않은 토큰")),
        )
    })
}

fn parse_exchange(raw: &str) -> Result<ExchangeId, (StatusCode, Json<ApiErrorResponse>)> {
    ExchangeId::from_str(raw).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiErrorResponse::simple("UNKNOWN_EXCHANGE", e)),
        )
    })
}

/// 자격증명 업서트.
///
/// (user, exchange) 기준으로 존재하면 모든 필드를 교체합니다.
/// PUT /api/v1/credentials/{exchange}
#[utoipa::path(
    put,
    path = "/api/v1/credentials/{exchange}",
    tag = "credentials",
    params(("exchange" = String, Path, description = "거래소 id (binance, bitget, cbpro, kraken, kucoin, mexc)")),
    request_body = UpsertCredentialRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "저장된 자격증명 (마스킹)", body = CredentialSummary),
        (status = 400, description = "유효성 검증 실패", body = ApiErrorResponse),
        (status = 401, description = "인증 실패")
    )
)]
pub async fn upsert_credential(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Path(exchange): Path<String>,
    Json(req): Json<UpsertCredentialRequest>,
) -> ApiResult<Json<CredentialSummary>> {
    let user_id = authenticated_user(&claims)?;
    let exchange = parse_exchange(&exchange)?;

    if req.api_key.trim().is_empty() || req.api_secret.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiErrorResponse::simple(
                "INVALID_INPUT",
                "api_key와 api_secret은 비어 있을 수 없습니다",
            )),
        ));
    }

    let passphrase = req
        .passphrase
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty());

    if exchange.requires_passphrase() && passphrase.is_none() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiErrorResponse::with_details(
                "PASSPHRASE_REQUIRED",
                format!("{} 자격증명에는 passphrase가 필요합니다", exchange),
                serde_json::json!({"field": "passphrase"}),
            )),
        ));
    }

    let mut credential = ApiCredential::new(req.api_key.trim(), req.api_secret.trim());
    if let Some(p) = passphrase {
        credential = credential.with_passphrase(p);
    }

    let summary = CredentialRepository::upsert(
        &state.db_pool,
        &state.encryptor,
        user_id,
        exchange,
        &credential,
    )
    .await
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiErrorResponse::new("DB_ERROR", e.to_string())),
        )
    })?;

    info!("Credential upserted: user={} exchange={}", user_id, exchange);

    Ok(Json(summary))
}

/// 등록된 자격증명 목록 (마스킹).
///
/// GET /api/v1/credentials
#[utoipa::path(
    get,
    path = "/api/v1/credentials",
    tag = "credentials",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "자격증명 목록", body = CredentialListResponse),
        (status = 401, description = "인증 실패")
    )
)]
pub async fn list_credentials(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
) -> ApiResult<Json<CredentialListResponse>> {
    let user_id = authenticated_user(&claims)?;

    let credentials = CredentialRepository::list(&state.db_pool, &state.encryptor, user_id)
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiErrorResponse::new("DB_ERROR", e.to_string())),
            )
        })?;

    let total = credentials.len();
    Ok(Json(CredentialListResponse { credentials, total }))
}

/// 자격증명 삭제.
///
/// DELETE /api/v1/credentials/{exchange}
#[utoipa::path(
    delete,
    path = "/api/v1/credentials/{exchange}",
    tag = "credentials",
    params(("exchange" = String, Path, description = "거래소 id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "삭제 성공"),
        (status = 404, description = "등록된 자격증명 없음", body = ApiErrorResponse)
    )
)]
pub async fn delete_credential(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Path(exchange): Path<String>,
) -> ApiResult<StatusCode> {
    let user_id = authenticated_user(&claims)?;
    let exchange = parse_exchange(&exchange)?;

    let deleted = CredentialRepository::delete(&state.db_pool, user_id, exchange)
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiErrorResponse::new("DB_ERROR", e.to_string())),
            )
        })?;

    if !deleted {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ApiErrorResponse::simple(
                "NOT_FOUND",
                format!("등록된 자격증명이 없습니다: {}", exchange),
            )),
        ));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// 자격증명 라우터 생성.
pub fn credentials_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_credentials))
        .route(
            "/{exchange}",
            put(upsert_credential).delete(delete_credential),
        )
}
