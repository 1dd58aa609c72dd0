//! 잔고 집계 대시보드 API.
//!
//! 인증된 사용자가 등록한 모든 거래소의 잔고를 동시에 조회합니다.
//! 개별 거래소 실패는 해당 슬롯의 에러 마커로 격리되며,
//! 인증 실패(401)만이 유일한 전체 실패입니다.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use journal_exchange::AggregateView;
use std::sync::Arc;

use crate::auth::JwtAuth;
use crate::error::{ApiErrorResponse, ApiResult};
use crate::repository::StoredCredentialSource;
use crate::state::AppState;

/// 잔고 집계 조회.
///
/// 등록된 거래소만 조회 대상이며, 하나도 등록되어 있지 않으면
/// 빈 뷰를 반환합니다.
/// GET /api/v1/balances
#[utoipa::path(
    get,
    path = "/api/v1/balances",
    tag = "balances",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "거래소별 잔고 집계 뷰"),
        (status = 401, description = "인증 실패")
    )
)]
pub async fn get_balances(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
) -> ApiResult<Json<AggregateView>> {
    let user_id = claims.user_id().map_err(|_| {
        (
            StatusCode::UNAUTHORIZED,
            Json(ApiErrorResponse::simple("INVALID_TOKEN", "유효하지 않은 토큰")),
        )
    })?;

    let source = StoredCredentialSource::new(
        state.db_pool.clone(),
        Arc::clone(&state.encryptor),
        user_id,
    );

    let view = state.aggregator.aggregate(&source).await;

    Ok(Json(view))
}

/// 잔고 라우터 생성.
pub fn balances_router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(get_balances))
}
