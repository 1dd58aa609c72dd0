//! Coinbase Pro 거래소 커넥터.
//!
//! Coinbase Exchange 계좌 API 구현. 타임스탬프는 초 단위이고 시크릿은
//! base64로 디코딩한 뒤 HMAC-SHA256 키로 사용합니다.

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

const DEFAULT_BASE_URL: &str = "https://api.exchange.coinbase.com";
const ACCOUNTS_PATH: &str = "/accounts";

#[derive(Debug, Deserialize)]
struct CbproAccount {
    currency: String,
    balance: String,
}

/// Coinbase Pro 거래소 클라이언트.
pub struct CbproClient {
    credential: ApiCredential,
    passphrase: String,
    client: Client,
    base_url: String,
}

impl CbproClient {
    /// 새 Coinbase Pro 클라이언트 생성.
    ///
    /// # Errors
    /// passphrase가 없으면 `ExchangeError::MissingCredentials`를 반환합니다.
    pub fn new(credential: ApiCredential, timeout_secs: u64) -> Result<Self, ExchangeError> {
        let passphrase = credential
            .passphrase
            .clone()
            .ok_or(ExchangeError::MissingCredentials(ExchangeId::Cbpro))?;

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

    /// 현재 타임스탬프(초) 반환.
    fn timestamp_secs() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards")
            .as_secs()
    }

    /// `timestamp + METHOD + requestPath + body` 프리해시 서명.
    fn sign(
        &self,
        timestamp: &str,
        method: &str,
        request_path: &str,
        body: &str,
    ) -> Result<String, ExchangeError> {
        let secret = BASE64.decode(&self.credential.api_secret).map_err(|e| {
            ExchangeError::InvalidCredentials {
                exchange: ExchangeId::Cbpro,
                message: format!("secret is not valid base64: {}", e),
            }
        })?;

        let prehash = format!("{}{}{}{}", timestamp, method, request_path, body);
        let mut mac = HmacSha256::new_from_slice(&secret).expect("Invalid key");
        mac.update(prehash.as_bytes());
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }

    fn parse_decimal(s: &str) -> Decimal {
        s.parse().unwrap_or(Decimal::ZERO)
    }
}

// 시크릿 노출 방지를 위한 수동 Debug 구현
impl std::fmt::Debug for CbproClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CbproClient")
            .field("credential", &self.credential)
            .field("passphrase", &"***")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl BalanceProvider for CbproClient {
    fn exchange_id(&self) -> ExchangeId {
        ExchangeId::Cbpro
    }

    async fn fetch_balances(&self) -> ExchangeResult<BalanceSnapshot> {
        let timestamp = Self::timestamp_secs().to_string();
        let signature = self.sign(&timestamp, "GET", ACCOUNTS_PATH, "")?;

        debug!("GET (signed) {}", ACCOUNTS_PATH);

        let response = self
            .client
            .get(format!("{}{}", self.base_url, ACCOUNTS_PATH))
            .header("CB-ACCESS-KEY", &self.credential.api_key)
            .header("CB-ACCESS-SIGN", signature)
            .header("CB-ACCESS-TIMESTAMP", timestamp)
            .header("CB-ACCESS-PASSPHRASE", &self.passphrase)
            .header("User-Agent", "trading-journal/0.1")
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
                exchange: ExchangeId::Cbpro,
                message: format!("HTTP {}: {}", status.as_u16(), body),
            });
        }

        let accounts: Vec<CbproAccount> = serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse cbpro response: {} - Body: {}", e, body);
            ExchangeError::MalformedResponse {
                exchange: ExchangeId::Cbpro,
                message: e.to_string(),
            }
        })?;

        let mut snapshot = BalanceSnapshot::new();
        for account in accounts {
            snapshot.add_asset(account.currency, Self::parse_decimal(&account.balance));
        }

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_client() -> CbproClient {
        // 시크릿은 base64 인코딩 형식 ("test-secret-key-0123"의 인코딩)
        CbproClient::new(
            ApiCredential::new("test-key", "dGVzdC1zZWNyZXQta2V5LTAxMjM=")
                .with_passphrase("test-pass"),
            10,
        )
        .expect("테스트용 클라이언트 생성 실패")
    }

    #[test]
    fn test_missing_passphrase_is_rejected() {
        let err = CbproClient::new(ApiCredential::new("k", "s"), 10).unwrap_err();
        assert!(err.is_missing_credentials());
    }

    #[test]
    fn test_sign_components() {
        let client = test_client();
        let a = client.sign("1700000000", "GET", ACCOUNTS_PATH, "").unwrap();
        assert_eq!(a, client.sign("1700000000", "GET", ACCOUNTS_PATH, "").unwrap());
        assert_ne!(a, client.sign("1700000001", "GET", ACCOUNTS_PATH, "").unwrap());
        assert_ne!(a, client.sign("1700000000", "POST", ACCOUNTS_PATH, "").unwrap());
    }

    #[test]
    fn test_sign_rejects_invalid_base64_secret() {
        let client = CbproClient::new(
            ApiCredential::new("k", "not base64 !!!").with_passphrase("p"),
            10,
        )
        .unwrap();
        let err = client.sign("1", "GET", ACCOUNTS_PATH, "").unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidCredentials { .. }));
    }

    #[tokio::test]
    async fn test_fetch_balances_filters_empty_accounts() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", ACCOUNTS_PATH)
            .match_header("CB-ACCESS-KEY", "test-key")
            .with_status(200)
            .with_body(
                r#"[
                    {"currency":"BTC","balance":"0.0050000000000000"},
                    {"currency":"USD","balance":"0.0000000000000000"}
                ]"#,
            )
            .create_async()
            .await;

        let client = test_client().with_base_url(server.url());
        let snapshot = client.fetch_balances().await.unwrap();

        mock.assert_async().await;
        assert_eq!(snapshot.assets.len(), 1);
        assert_eq!(snapshot.assets["BTC"], dec!(0.005));
    }

    #[tokio::test]
    async fn test_fetch_balances_http_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", ACCOUNTS_PATH)
            .with_status(401)
            .with_body(r#"{"message":"Invalid API Key"}"#)
            .create_async()
            .await;

        let client = test_client().with_base_url(server.url());
        let err = client.fetch_balances().await.unwrap_err();
        assert!(matches!(err, ExchangeError::Unavailable { .. }));
    }
}
