//! # Journal Exchange
//!
//! 거래소 연동 크레이트. 6개 거래소(Binance, Bitget, Coinbase Pro,
//! Kraken, KuCoin, MEXC)의 서명된 잔고 API 커넥터와, 이를 사용자의
//! 설정된 거래소 전체에 동시 질의하는 집계기를 제공합니다.

pub mod aggregate;
pub mod connector;
pub mod error;
pub mod traits;

pub use aggregate::{AggregateView, BalanceAggregator, CredentialSource, ExchangeOutcome};
pub use connector::{
    build_provider, resolve_credential, BinanceClient, BitgetClient, CbproClient, KrakenClient,
    KucoinClient, MexcClient,
};
pub use error::ExchangeError;
pub use traits::{BalanceProvider, ExchangeResult};
