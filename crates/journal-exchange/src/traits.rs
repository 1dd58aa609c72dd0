//! 거래소 trait 정의.

use async_trait::async_trait;
use journal_core::{BalanceSnapshot, ExchangeId};

use crate::ExchangeError;

/// 거래소 작업을 위한 Result 타입.
pub type ExchangeResult<T> = Result<T, ExchangeError>;

/// 잔고 조회를 위한 통합 거래소 인터페이스.
///
/// 구현체는 서명된 벤더 API를 호출해 잔고를 표준 스냅샷으로
/// 정규화합니다. 재시도와 캐싱은 하지 않습니다.
#[async_trait]
pub trait BalanceProvider: Send + Sync {
    /// 거래소 식별자 반환.
    fn exchange_id(&self) -> ExchangeId;

    /// 계좌 잔고 조회.
    ///
    /// 반환되는 스냅샷은 양수 잔고만 포함합니다.
    async fn fetch_balances(&self) -> ExchangeResult<BalanceSnapshot>;
}
