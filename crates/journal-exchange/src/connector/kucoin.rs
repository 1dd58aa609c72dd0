//! KuCoin 거래소 커넥터.
//!
//! KuCoin 현물 계좌 API 구현 (KC-API v2 서명). passphrase 자체도
//! 시크릿으로 HMAC-SHA256 서명해 전송합니다.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use journal_core::{ApiCredential, BalanceSnapshot, ExchangeId};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, error};

use crate::traits::{BalanceProvider, ExchangeResult};
use crate::ExchangeError;

type HmacSha256 = Hmac<Sha256>;

const DEFAULT_BASE_URL: &str = "https://api.kucoin.com";
const ACCOUNTS_PATH: &str = "/api/v1/accounts";
const SUCCESS_CODE: &str = "200000";

#[derive(Debug, Deserialize)]
struct KucoinResponse<T> {
    code: String,
    #[serde(default)]
    msg: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct KucoinAccount {
    currency: String,
    balance: String,
}

/// KuCoin 거래소 클라이언트.
pub struct KucoinClient {
    credential: ApiCredential,
    passphrase: String,
    client: Client,
    base_url: String,
}

impl KucoinClient {
    /// 새 KuCoin 클라이언트 생성.
    ///
    /// # Errors
    /// passphrase가 없으면 `ExchangeError::MissingCredentials`를 반환합니다.
    pub fn new(credential: ApiCredential, timeout_secs: u64) -> Result<Self, ExchangeError> {
        let passphrase = credential
            .passphrase
            .clone()
            .ok_or(ExchangeError::MissingCredentials(ExchangeId::Kucoin))?;

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| {
                ExchangeError::NetworkError(format!("HTTP 클라이언트 생성 실패: {}", e))
            })?;

        Ok(Self {
            credential,
            passphrase,
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// 기본 URL 재정의 (테스트용).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn timestamp_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards")
            .as_millis() as u64
    }

    fn hmac_base64(&self, payload: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.credential.api_secret.as_bytes())
            .expect("Invalid key");
        mac.update(payload.as_bytes());
        BASE64.encode(mac.finalize().into_bytes())
    }

    /// `timestamp + METHOD + endpoint + body` 프리해시 서명.
    fn sign(&self, timestamp: &str, method: &str, endpoint: &str, body: &str) -> String {
        self.hmac_base64(&format!("{}{}{}{}", timestamp, method, endpoint, body))
    }

    /// v2 서명 passphrase 생성.
    fn signed_passphrase(&self) -> String {
        self.hmac_base64(&self.passphrase)
    }

    fn parse_decimal(s: &str) -> Decimal {
        s.parse().unwrap_or(Decimal::ZERO)
    }
}

// 시크릿 노출 방지를 위한 수동 Debug 구현
impl std::fmt::Debug for KucoinClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KucoinClient")
            .field("credential", &self.credential)
            .field("passphrase", &"***")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl BalanceProvider for KucoinClient {
    fn exchange_id(&self) -> ExchangeId {
        ExchangeId::Kucoin
    }

    async fn fetch_balances(&self) -> ExchangeResult<BalanceSnapshot> {
        let timestamp = Self::timestamp_ms().to_string();
        let signature = self.sign(&timestamp, "GET", ACCOUNTS_PATH, "");

        debug!("GET (signed) {}", ACCOUNTS_PATH);

        let response = self
            .client
            .get(format!("{}{}", self.base_url, ACCOUNTS_PATH))
            .header("KC-API-KEY", &self.credential.api_key)
            .header("KC-API-SIGN", signature)
            .header("KC-API-TIMESTAMP", timestamp)
            .header("KC-API-PASSPHRASE", self.signed_passphrase())
            .header("KC-API-KEY-VERSION", "2")
            .send()
            .await
            .map_err(ExchangeError::from)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ExchangeError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            return Err(ExchangeError::Unavailable {
                exchange: ExchangeId::Kucoin,
                message: format!("HTTP {}: {}", status.as_u16(), body),
            });
        }

        let envelope: KucoinResponse<Vec<KucoinAccount>> =
            serde_json::from_str(&body).map_err(|e| {
                error!("Failed to parse kucoin response: {} - Body: {}", e, body);
                ExchangeError::MalformedResponse {
                    exchange: ExchangeId::Kucoin,
                    message: e.to_string(),
                }
            })?;

        if envelope.code != SUCCESS_CODE {
            return Err(ExchangeError::Unavailable {
                exchange: ExchangeId::Kucoin,
                message: format!(
                    "API error {}: {}",
                    envelope.code,
                    envelope.msg.unwrap_or_default()
                ),
            });
        }

        let accounts = envelope.data.ok_or_else(|| ExchangeError::MalformedResponse {
            exchange: ExchangeId::Kucoin,
            message: "missing data field".to_string(),
        })?;

        // 동일 통화가 main/trade 계좌로 나뉘어 있으면 합산
        let mut snapshot = BalanceSnapshot::new();
        for account in accounts {
            snapshot.add_asset(account.currency, Self::parse_decimal(&account.balance));
        }

        Ok(snapshot)
    }
}
