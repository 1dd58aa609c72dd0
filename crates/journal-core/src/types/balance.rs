//! 잔고 스냅샷 타입.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 단일 거래소의 잔고 스냅샷.
///
/// `assets`는 양수 잔고만 포함하며 자산 코드 사전순으로 정렬됩니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    /// 자산 코드 → 총 수량 (가용 + 동결).
    pub assets: BTreeMap<String, Decimal>,
    /// 거래소가 직접 제공하는 USDT 환산 총액 (예: Bitget).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_usdt: Option<Decimal>,
}

impl BalanceSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// 양수인 경우에만 잔고를 기록. 동일 자산은 합산합니다.
    pub fn add_asset(&mut self, asset: impl Into<String>, amount: Decimal) {
        if amount > Decimal::ZERO {
            let entry = self.assets.entry(asset.into()).or_insert(Decimal::ZERO);
            *entry += amount;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty() && self.total_usdt.is_none()
    }
}
