//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! AppState는 모든 API 핸들러에서 공유되는 상태를 관리합니다.
//! Arc로 래핑되어 여러 요청 간에 안전하게 공유됩니다.

use std::sync::Arc;

use journal_core::crypto::CredentialEncryptor;
use journal_exchange::BalanceAggregator;

/// 애플리케이션 공유 상태.
///
/// 이 구조체는 모든 API 핸들러에서 접근할 수 있는 공유 리소스를 포함합니다.
/// Axum의 State extractor를 통해 핸들러에 주입됩니다.
#[derive(Clone)]
pub struct AppState {
    /// 데이터베이스 연결 풀 (PostgreSQL)
    pub db_pool: sqlx::PgPool,

    /// 자격증명 암호화 관리자 (AES-256-GCM)
    pub encryptor: Arc<CredentialEncryptor>,

    /// 잔고 집계기 - 등록된 거래소 자격증명 fan-out 조회
    pub aggregator: Arc<BalanceAggregator>,

    /// JWT 서명 비밀 키
    pub jwt_secret: String,

    /// Access Token 만료 시간 (분)
    pub token_expires_minutes: i64,

    /// 서버 시작 시간 (업타임 계산용)
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 새로운 AppState 생성.
    ///
    /// # 인자
    /// * `db_pool` - PostgreSQL 연결 풀
    /// * `encryptor` - 자격증명 암호화 관리자
    /// * `aggregator` - 잔고 집계기
    /// * `jwt_secret` - JWT 서명 비밀 키
    pub fn new(
        db_pool: sqlx::PgPool,
        encryptor: CredentialEncryptor,
        aggregator: BalanceAggregator,
        jwt_secret: String,
    ) -> Self {
        Self {
            db_pool,
            encryptor: Arc::new(encryptor),
            aggregator: Arc::new(aggregator),
            jwt_secret,
            token_expires_minutes: 60,
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 서버 업타임 (초).
    pub fn uptime_seconds(&self) -> i64 {
        (chrono::Utc::now() - self.started_at).num_seconds()
    }
}
