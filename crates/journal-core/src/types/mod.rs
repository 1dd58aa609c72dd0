//! 공유 도메인 타입.

mod balance;
mod credential;
mod exchange;

pub use balance::BalanceSnapshot;
pub use credential::ApiCredential;
pub use exchange::ExchangeId;
