//! 잔고 집계.
//!
//! 사용자가 설정한 모든 거래소에 동시 질의해 하나의 뷰로 병합합니다.
//! 재시도와 캐싱 없이 호출마다 실시간 조회하며, 개별 거래소의 실패는
//! 해당 슬롯의 실패 마커로만 기록됩니다.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use journal_core::{ApiCredential, BalanceSnapshot, ExchangeId};
use journal_core::config::AggregatorConfig;
use serde::Serialize;
use tracing::{debug, warn};

use crate::connector;
use crate::traits::BalanceProvider;
use crate::ExchangeError;

/// 사용자의 저장된 자격증명 조회 인터페이스.
///
/// 구현체는 이미 특정 사용자로 범위가 한정되어 있습니다. 저장된
/// 레코드가 없는 거래소는 `Ok(None)`으로, 집계에서 조용히 건너뜁니다.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn credential(&self, exchange: ExchangeId)
        -> Result<Option<ApiCredential>, ExchangeError>;
}

/// 단일 거래소의 집계 결과.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ExchangeOutcome {
    Ok {
        #[serde(flatten)]
        balances: BalanceSnapshot,
    },
    Error {
        message: String,
    },
}

impl ExchangeOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, ExchangeOutcome::Ok { .. })
    }
}

/// 집계된 잔고 뷰.
///
/// `exchanges`는 사용자가 자격증명을 저장한 거래소만 포함하며,
/// 완료 순서와 무관하게 거래소 식별자 사전순으로 정렬됩니다.
/// 모든 슬롯이 실패여도 유효한 뷰입니다.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateView {
    pub exchanges: BTreeMap<ExchangeId, ExchangeOutcome>,
    pub fetched_at: DateTime<Utc>,
}

type ProviderFactory = Box<
    dyn Fn(ExchangeId, ApiCredential, u64) -> Result<Box<dyn BalanceProvider>, ExchangeError>
        + Send
        + Sync,
>;

/// 잔고 집계기.
pub struct BalanceAggregator {
    call_timeout: Duration,
    request_timeout_secs: u64,
    factory: ProviderFactory,
}

impl BalanceAggregator {
    /// 새 집계기 생성.
    pub fn new(config: &AggregatorConfig) -> Self {
        Self {
            call_timeout: Duration::from_secs(config.call_timeout_secs),
            request_timeout_secs: config.request_timeout_secs,
            factory: Box::new(connector::build_provider),
        }
    }

    /// 커넥터 팩토리 재정의 (테스트용).
    pub fn with_factory(mut self, factory: ProviderFactory) -> Self {
        self.factory = factory;
        self
    }

    /// 설정된 모든 거래소의 잔고 집계.
    ///
    /// 거래소별 호출은 동시에 수행되고 개별적으로 타임아웃됩니다.
    /// 반환된 future가 drop되면 진행 중인 호출도 함께 취소됩니다.
    pub async fn aggregate(&self, source: &dyn CredentialSource) -> AggregateView {
        let mut slots: Vec<(ExchangeId, Result<Box<dyn BalanceProvider>, ExchangeError>)> =
            Vec::new();

        for exchange in ExchangeId::ALL {
            match source.credential(exchange).await {
                Ok(Some(credential)) => {
                    slots.push((
                        exchange,
                        (self.factory)(exchange, credential, self.request_timeout_secs),
                    ));
                }
                // 저장된 자격증명 없음, 설정되지 않은 거래소
                Ok(None) => {}
                Err(err) => slots.push((exchange, Err(err))),
            }
        }

        let calls = slots.into_iter().map(|(exchange, provider)| async move {
            let outcome = match provider {
                Ok(provider) => self.fetch_one(exchange, provider.as_ref()).await,
                Err(err) => {
                    warn!(exchange = %exchange, error = %err, "adapter construction failed");
                    ExchangeOutcome::Error {
                        message: err.display_message(),
                    }
                }
            };
            (exchange, outcome)
        });

        let results = join_all(calls).await;

        AggregateView {
            exchanges: results.into_iter().collect(),
            fetched_at: Utc::now(),
        }
    }

    async fn fetch_one(
        &self,
        exchange: ExchangeId,
        provider: &dyn BalanceProvider,
    ) -> ExchangeOutcome {
        match tokio::time::timeout(self.call_timeout, provider.fetch_balances()).await {
            Ok(Ok(balances)) => {
                debug!(exchange = %exchange, assets = balances.assets.len(), "balance fetch ok");
                ExchangeOutcome::Ok { balances }
            }
            Ok(Err(err)) => {
                warn!(exchange = %exchange, error = %err, "balance fetch failed");
                ExchangeOutcome::Error {
                    message: err.display_message(),
                }
            }
            Err(_) => {
                warn!(exchange = %exchange, timeout_secs = self.call_timeout.as_secs(), "balance fetch timed out");
                ExchangeOutcome::Error {
                    message: ExchangeError::Timeout(format!(
                        "no response within {}s",
                        self.call_timeout.as_secs()
                    ))
                    .display_message(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct MapSource(HashMap<ExchangeId, ApiCredential>);

    #[async_trait]
    impl CredentialSource for MapSource {
        async fn credential(
            &self,
            exchange: ExchangeId,
        ) -> Result<Option<ApiCredential>, ExchangeError> {
            Ok(self.0.get(&exchange).cloned())
        }
    }

    use rust_decimal::Decimal;

    struct FakeProvider {
        exchange: ExchangeId,
        delay: Duration,
        result: Result<Decimal, String>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl BalanceProvider for FakeProvider {
        fn exchange_id(&self) -> ExchangeId {
            self.exchange
        }

        async fn fetch_balances(&self) -> Result<BalanceSnapshot, ExchangeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            match &self.result {
                Ok(amount) => {
                    let mut snapshot = BalanceSnapshot::new();
                    snapshot.add_asset("USDT", *amount);
                    Ok(snapshot)
                }
                Err(message) => Err(ExchangeError::Unavailable {
                    exchange: self.exchange,
                    message: message.clone(),
                }),
            }
        }
    }

    fn aggregator_with(
        config: &AggregatorConfig,
        fakes: HashMap<ExchangeId, (Duration, Result<Decimal, String>, Arc<AtomicUsize>)>,
    ) -> BalanceAggregator {
        BalanceAggregator::new(config).with_factory(Box::new(move |exchange, _cred, _t| {
            let (delay, result, calls) = fakes
                .get(&exchange)
                .expect("no fake registered for exchange");
            Ok(Box::new(FakeProvider {
                exchange,
                delay: *delay,
                result: result.clone(),
                calls: calls.clone(),
            }))
        }))
    }

    fn cred() -> ApiCredential {
        ApiCredential::new("k", "s")
    }

    fn default_config() -> AggregatorConfig {
        AggregatorConfig {
            call_timeout_secs: 10,
            request_timeout_secs: 10,
        }
    }

    #[tokio::test]
    async fn test_unconfigured_exchanges_are_skipped_silently() {
        let counter = Arc::new(AtomicUsize::new(0));
        let fakes = HashMap::from([(
            ExchangeId::Binance,
            (Duration::ZERO, Ok(dec!(1)), counter.clone()),
        )]);
        let aggregator = aggregator_with(&default_config(), fakes);
        let source = MapSource(HashMap::from([(ExchangeId::Binance, cred())]));

        let view = aggregator.aggregate(&source).await;
        assert_eq!(view.exchanges.len(), 1);
        assert!(view.exchanges.contains_key(&ExchangeId::Binance));
    }

    #[tokio::test]
    async fn test_zero_configured_exchanges_yields_empty_view() {
        let aggregator = aggregator_with(&default_config(), HashMap::new());
        let source = MapSource(HashMap::new());

        let view = aggregator.aggregate(&source).await;
        assert!(view.exchanges.is_empty());
    }

    #[tokio::test]
    async fn test_one_failure_does_not_abort_others() {
        let counter = Arc::new(AtomicUsize::new(0));
        let fakes = HashMap::from([
            (
                ExchangeId::Binance,
                (Duration::ZERO, Ok(dec!(100)), counter.clone()),
            ),
            (
                ExchangeId::Kraken,
                (
                    Duration::ZERO,
                    Err("HTTP 502".to_string()),
                    counter.clone(),
                ),
            ),
        ]);
        let aggregator = aggregator_with(&default_config(), fakes);
        let source = MapSource(HashMap::from([
            (ExchangeId::Binance, cred()),
            (ExchangeId::Kraken, cred()),
        ]));

        let view = aggregator.aggregate(&source).await;
        assert!(view.exchanges[&ExchangeId::Binance].is_ok());
        assert!(!view.exchanges[&ExchangeId::Kraken].is_ok());
    }

    #[tokio::test]
    async fn test_all_failures_is_a_valid_view() {
        let counter = Arc::new(AtomicUsize::new(0));
        let fakes = HashMap::from([
            (
                ExchangeId::Bitget,
                (Duration::ZERO, Err("down".to_string()), counter.clone()),
            ),
            (
                ExchangeId::Mexc,
                (Duration::ZERO, Err("down".to_string()), counter.clone()),
            ),
        ]);
        let aggregator = aggregator_with(&default_config(), fakes);
        let source = MapSource(HashMap::from([
            (ExchangeId::Bitget, cred()),
            (ExchangeId::Mexc, cred()),
        ]));

        let view = aggregator.aggregate(&source).await;
        assert_eq!(view.exchanges.len(), 2);
        assert!(view.exchanges.values().all(|o| !o.is_ok()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_is_max_not_sum() {
        let counter = Arc::new(AtomicUsize::new(0));
        let fakes = HashMap::from([
            (
                ExchangeId::Binance,
                (Duration::from_secs(3), Ok(dec!(1)), counter.clone()),
            ),
            (
                ExchangeId::Kraken,
                (Duration::from_secs(4), Ok(dec!(2)), counter.clone()),
            ),
            (
                ExchangeId::Mexc,
                (Duration::from_secs(5), Ok(dec!(3)), counter.clone()),
            ),
        ]);
        let aggregator = aggregator_with(&default_config(), fakes);
        let source = MapSource(HashMap::from([
            (ExchangeId::Binance, cred()),
            (ExchangeId::Kraken, cred()),
            (ExchangeId::Mexc, cred()),
        ]));

        let start = tokio::time::Instant::now();
        let view = aggregator.aggregate(&source).await;
        let elapsed = start.elapsed();

        // 동시 실행이므로 전체 지연은 가장 느린 호출과 같아야 함
        assert!(elapsed >= Duration::from_secs(5));
        assert!(elapsed < Duration::from_secs(6));
        assert_eq!(view.exchanges.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_exchange_times_out_individually() {
        let counter = Arc::new(AtomicUsize::new(0));
        let fakes = HashMap::from([
            (
                ExchangeId::Binance,
                (Duration::ZERO, Ok(dec!(1)), counter.clone()),
            ),
            (
                ExchangeId::Kucoin,
                (Duration::from_secs(60), Ok(dec!(2)), counter.clone()),
            ),
        ]);
        let config = AggregatorConfig {
            call_timeout_secs: 1,
            request_timeout_secs: 10,
        };
        let aggregator = aggregator_with(&config, fakes);
        let source = MapSource(HashMap::from([
            (ExchangeId::Binance, cred()),
            (ExchangeId::Kucoin, cred()),
        ]));

        let view = aggregator.aggregate(&source).await;
        assert!(view.exchanges[&ExchangeId::Binance].is_ok());
        assert!(!view.exchanges[&ExchangeId::Kucoin].is_ok());
    }

    #[tokio::test]
    async fn test_ordering_is_lexicographic_regardless_of_completion() {
        let counter = Arc::new(AtomicUsize::new(0));
        // 사전순 역순의 완료 순서를 의도적으로 구성
        let fakes = HashMap::from([
            (
                ExchangeId::Binance,
                (Duration::from_millis(30), Ok(dec!(1)), counter.clone()),
            ),
            (
                ExchangeId::Kraken,
                (Duration::from_millis(20), Ok(dec!(2)), counter.clone()),
            ),
            (
                ExchangeId::Mexc,
                (Duration::from_millis(10), Ok(dec!(3)), counter.clone()),
            ),
        ]);
        let aggregator = aggregator_with(&default_config(), fakes);
        let source = MapSource(HashMap::from([
            (ExchangeId::Mexc, cred()),
            (ExchangeId::Binance, cred()),
            (ExchangeId::Kraken, cred()),
        ]));

        let view = aggregator.aggregate(&source).await;
        let keys: Vec<_> = view.exchanges.keys().map(|e| e.as_str()).collect();
        assert_eq!(keys, vec!["binance", "kraken", "mexc"]);
    }

    #[tokio::test]
    async fn test_missing_credentials_skips_network_call() {
        // passphrase 없는 KuCoin 자격증명, 실제 커넥터 팩토리 사용
        let _guard = crate::connector::env_lock();
        std::env::remove_var("KUCOIN_PASSPHRASE");
        let config = AggregatorConfig {
            call_timeout_secs: 1,
            request_timeout_secs: 1,
        };
        let aggregator = BalanceAggregator::new(&config);
        let source = MapSource(HashMap::from([(ExchangeId::Kucoin, cred())]));

        let view = aggregator.aggregate(&source).await;
        match &view.exchanges[&ExchangeId::Kucoin] {
            ExchangeOutcome::Error { message } => {
                assert!(message.contains("Missing credentials"));
            }
            _ => panic!("expected error outcome"),
        }
    }
}
