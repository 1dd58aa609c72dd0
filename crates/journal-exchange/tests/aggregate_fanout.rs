//! 실제 커넥터와 mock HTTP 서버를 사용한 집계 통합 테스트.

use std::collections::HashMap;

use async_trait::async_trait;
use journal_core::config::AggregatorConfig;
use journal_core::{ApiCredential, ExchangeId};
use journal_exchange::{
    BalanceAggregator, BinanceClient, CredentialSource, ExchangeError, ExchangeOutcome,
    KrakenClient,
};
use rust_decimal_macros::dec;

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

fn config() -> AggregatorConfig {
    AggregatorConfig {
        call_timeout_secs: 5,
        request_timeout_secs: 5,
    }
}

// base64 인코딩된 Kraken 형식 시크릿
const KRAKEN_SECRET: &str = "dGVzdC1zZWNyZXQta2V5LTAxMjM=";

#[tokio::test]
async fn partial_failure_produces_mixed_view() {
    let mut binance_server = mockito::Server::new_async().await;
    let binance_mock = binance_server
        .mock("GET", "/api/v3/account")
        // 서명된 요청은 timestamp/signature 쿼리를 달고 옴
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(r#"{"balances":[{"asset":"BTC","free":"1.5","locked":"0"}]}"#)
        .create_async()
        .await;

    let mut kraken_server = mockito::Server::new_async().await;
    let kraken_mock = kraken_server
        .mock("POST", "/0/private/Balance")
        .with_status(200)
        .with_body(r#"{"error":["EService:Unavailable"]}"#)
        .create_async()
        .await;

    let binance_url = binance_server.url();
    let kraken_url = kraken_server.url();

    let aggregator =
        BalanceAggregator::new(&config()).with_factory(Box::new(move |exchange, cred, timeout| {
            match exchange {
                ExchangeId::Binance => Ok(Box::new(
                    BinanceClient::new(cred, timeout)?.with_base_url(binance_url.clone()),
                )),
                ExchangeId::Kraken => Ok(Box::new(
                    KrakenClient::new(cred, timeout)?.with_base_url(kraken_url.clone()),
                )),
                other => Err(ExchangeError::MissingCredentials(other)),
            }
        }));

    let source = MapSource(HashMap::from([
        (ExchangeId::Binance, ApiCredential::new("k", "s")),
        (ExchangeId::Kraken, ApiCredential::new("k", KRAKEN_SECRET)),
    ]));

    let view = aggregator.aggregate(&source).await;

    binance_mock.assert_async().await;
    kraken_mock.assert_async().await;

    assert_eq!(view.exchanges.len(), 2);
    match &view.exchanges[&ExchangeId::Binance] {
        ExchangeOutcome::Ok { balances } => {
            assert_eq!(balances.assets["BTC"], dec!(1.5));
        }
        other => panic!("expected ok outcome, got {:?}", other),
    }
    match &view.exchanges[&ExchangeId::Kraken] {
        ExchangeOutcome::Error { message } => {
            assert!(message.contains("EService:Unavailable"));
        }
        other => panic!("expected error outcome, got {:?}", other),
    }
}

#[tokio::test]
async fn missing_credentials_never_hits_the_network() {
    let mut server = mockito::Server::new_async().await;
    // 네트워크 호출이 전혀 없어야 함
    let mock = server
        .mock("GET", mockito::Matcher::Any)
        .match_query(mockito::Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let url = server.url();
    let aggregator =
        BalanceAggregator::new(&config()).with_factory(Box::new(move |exchange, cred, timeout| {
            if cred.api_key.is_empty() || cred.api_secret.is_empty() {
                return Err(ExchangeError::MissingCredentials(exchange));
            }
            Ok(Box::new(
                BinanceClient::new(cred, timeout)?.with_base_url(url.clone()),
            ))
        }));

    let source = MapSource(HashMap::from([(
        ExchangeId::Binance,
        ApiCredential::new("", ""),
    )]));

    let view = aggregator.aggregate(&source).await;

    mock.assert_async().await;
    match &view.exchanges[&ExchangeId::Binance] {
        ExchangeOutcome::Error { message } => {
            assert!(message.contains("Missing credentials"));
        }
        other => panic!("expected error outcome, got {:?}", other),
    }
}

#[tokio::test]
async fn consecutive_aggregates_refetch_live() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v3/account")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(r#"{"balances":[{"asset":"ETH","free":"2","locked":"0"}]}"#)
        .expect(2)
        .create_async()
        .await;

    let url = server.url();
    let aggregator =
        BalanceAggregator::new(&config()).with_factory(Box::new(move |_exchange, cred, timeout| {
            Ok(Box::new(
                BinanceClient::new(cred, timeout)?.with_base_url(url.clone()),
            ))
        }));

    let source = MapSource(HashMap::from([(
        ExchangeId::Binance,
        ApiCredential::new("k", "s"),
    )]));

    let first = aggregator.aggregate(&source).await;
    let second = aggregator.aggregate(&source).await;

    // 캐시 없이 호출마다 재조회
    mock.assert_async().await;
    assert!(first.exchanges[&ExchangeId::Binance].is_ok());
    assert!(second.exchanges[&ExchangeId::Binance].is_ok());
}
