//! 거래소 커넥터 모음.

mod binance;
mod bitget;
mod cbpro;
mod kraken;
mod kucoin;
mod mexc;

pub use binance::BinanceClient;
pub use bitget::BitgetClient;
pub use cbpro::CbproClient;
pub use kraken::KrakenClient;
pub use kucoin::KucoinClient;
pub use mexc::MexcClient;

use journal_core::{ApiCredential, ExchangeId};

use crate::traits::BalanceProvider;
use crate::ExchangeError;

fn env_var(prefix: &str, suffix: &str) -> Option<String> {
    std::env::var(format!("{}_{}", prefix, suffix))
        .ok()
        .filter(|v| !v.is_empty())
}

/// `MEXC_TIME_OFFSET_MS` 환경 변수에서 서버 시간 오프셋을 읽음.
fn mexc_time_offset_ms() -> Option<u64> {
    env_var("MEXC", "TIME_OFFSET_MS").and_then(|v| v.parse().ok())
}

/// 비어 있는 자격증명 필드를 환경 변수로 채움.
///
/// 호출자가 명시적으로 제공한 필드가 항상 우선하며, 환경 변수 조회는
/// 커넥터 생성 시점에서만 일어납니다. fetch 경로는 전역 상태를 읽지
/// 않습니다.
pub fn resolve_credential(exchange: ExchangeId, supplied: ApiCredential) -> ApiCredential {
    let prefix = exchange.env_prefix();

    let api_key = if supplied.api_key.is_empty() {
        env_var(prefix, "API_KEY").unwrap_or_default()
    } else {
        supplied.api_key
    };
    let api_secret = if supplied.api_secret.is_empty() {
        env_var(prefix, "SECRET_KEY").unwrap_or_default()
    } else {
        supplied.api_secret
    };
    let passphrase = supplied.passphrase.or_else(|| env_var(prefix, "PASSPHRASE"));

    ApiCredential {
        api_key,
        api_secret,
        passphrase,
    }
}

/// 자격증명으로 커넥터 생성.
///
/// 환경 변수 폴백 후에도 key/secret이 비어 있으면 네트워크 호출 없이
/// `ExchangeError::MissingCredentials`를 반환합니다. passphrase가 필요한
/// 거래소는 각 커넥터 생성자에서 추가로 검증합니다.
pub fn build_provider(
    exchange: ExchangeId,
    supplied: ApiCredential,
    timeout_secs: u64,
) -> Result<Box<dyn BalanceProvider>, ExchangeError> {
    let credential = resolve_credential(exchange, supplied);
    if credential.api_key.is_empty() || credential.api_secret.is_empty() {
        return Err(ExchangeError::MissingCredentials(exchange));
    }

    let provider: Box<dyn BalanceProvider> = match exchange {
        ExchangeId::Binance => Box::new(BinanceClient::new(credential, timeout_secs)?),
        ExchangeId::Bitget => Box::new(BitgetClient::new(credential, timeout_secs)?),
        ExchangeId::Cbpro => Box::new(CbproClient::new(credential, timeout_secs)?),
        ExchangeId::Kraken => Box::new(KrakenClient::new(credential, timeout_secs)?),
        ExchangeId::Kucoin => Box::new(KucoinClient::new(credential, timeout_secs)?),
        ExchangeId::Mexc => {
            let mut client = MexcClient::new(credential, timeout_secs)?;
            // 서버 시간 오프셋도 생성 시점에서만 환경 변수로 재정의 가능
            if let Some(offset) = mexc_time_offset_ms() {
                client = client.with_time_offset_ms(offset);
            }
            Box::new(client)
        }
    };
    Ok(provider)
}

/// 환경 변수를 변경하는 테스트 직렬화용 락.
///
/// cargo는 테스트를 스레드 병렬로 실행하므로 프로세스 전역 env를
/// 건드리는 테스트는 이 락을 먼저 잡아야 합니다.
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
pub(crate) fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}
