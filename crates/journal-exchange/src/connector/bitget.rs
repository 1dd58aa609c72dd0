//! Bitget 거래소 커넥터.
//!
//! Bitget USDT 선물 계좌 API 구현. `timestamp + METHOD + requestPath + body`
//! 프리해시를 HMAC-SHA256으로 서명한 뒤 base64로 인코딩하며, 타임스탬프는
//! 요청마다 새로 생성합니다.

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

const DEFAULT_BASE_URL: &str = "https://api.bitget.com";
const SUCCESS_CODE: &str = "00000";

// ============================================================================
// API 응답 타입
// ============================================================================

#[derive(Debug, Deserialize)]
struct BitgetResponse<T> {
    code: String,
    msg: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BitgetFuturesAccount {
    margin_coin: String,
    available: String,
    #[serde(default)]
    locked: String,
    usdt_equity: String,
}

// ============================================================================
// Bitget 클라이언트
// ============================================================================

/// Bitget 거래소 클라이언트.
pub struct BitgetClient {
    credential: ApiCredential,
    passphrase: String,
    client: Client,
    base_url: String,
}

impl BitgetClient {
    /// 새 Bitget 클라이언트 생성.
    ///
    /// # Errors
    /// passphrase가 없으면 `ExchangeError::MissingCredentials`를 반환합니다.
    pub fn new(credential: ApiCredential, timeout_secs: u64) -> Result<Self, ExchangeError> {
        let passphrase = credential
            .passphrase
            .clone()
            .ok_or(ExchangeError::MissingCredentials(ExchangeId::Bitget))?;

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

    /// 현재 타임스탬프(밀리초) 반환.
    fn timestamp_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards")
            .as_millis() as u64
    }

    /// `timestamp + METHOD + requestPath + body` 프리해시 서명.
    fn sign(&self, timestamp: &str, method: &str, request_path: &str, body: &str) -> String {
        let prehash = format!("{}{}{}{}", timestamp, method, request_path, body);
        let mut mac = HmacSha256::new_from_slice(self.credential.api_secret.as_bytes())
            .expect("Invalid key");
        mac.update(prehash.as_bytes());
        BASE64.encode(mac.finalize().into_bytes())
    }

    /// 서명된 GET 요청. 쿼리 문자열은 프리해시의 requestPath에 포함됩니다.
    async fn signed_get<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        query: &str,
    ) -> ExchangeResult<T> {
        let request_path = if query.is_empty() {
            endpoint.to_string()
        } else {
            format!("{}?{}", endpoint, query)
        };

        // 서명 재사용 방지, 시도마다 새 타임스탬프
        let timestamp = Self::timestamp_ms().to_string();
        let signature = self.sign(&timestamp, "GET", &request_path, "");

        debug!("GET (signed) {}", endpoint);

        let response = self
            .client
            .get(format!("{}{}", self.base_url, request_path))
            .header("ACCESS-KEY", &self.credential.api_key)
            .header("ACCESS-SIGN", signature)
            .header("ACCESS-TIMESTAMP", timestamp)
            .header("ACCESS-PASSPHRASE", &self.passphrase)
            .header("Content-Type", "application/json")
            .header("locale", "en-US")
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
                exchange: ExchangeId::Bitget,
                message: format!("HTTP {}: {}", status.as_u16(), body),
            });
        }

        let envelope: BitgetResponse<T> = serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse bitget response: {} - Body: {}", e, body);
            ExchangeError::MalformedResponse {
                exchange: ExchangeId::Bitget,
                message: e.to_string(),
            }
        })?;

        if envelope.code != SUCCESS_CODE {
            return Err(ExchangeError::Unavailable {
                exchange: ExchangeId::Bitget,
                message: format!("API error {}: {}", envelope.code, envelope.msg),
            });
        }

        envelope.data.ok_or_else(|| ExchangeError::MalformedResponse {
            exchange: ExchangeId::Bitget,
            message: "missing data field".to_string(),
        })
    }

    fn parse_decimal(s: &str) -> Decimal {
        s.parse().unwrap_or(Decimal::ZERO)
    }
}

// 시크릿 노출 방지를 위한 수동 Debug 구현
impl std::fmt::Debug for BitgetClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitgetClient")
            .field("credential", &self.credential)
            .field("passphrase", &"***")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl BalanceProvider for BitgetClient {
    fn exchange_id(&self) -> ExchangeId {
        ExchangeId::Bitget
    }

    async fn fetch_balances(&self) -> ExchangeResult<BalanceSnapshot> {
        let accounts: Vec<BitgetFuturesAccount> = self
            .signed_get("/api/mix/v1/account/accounts", "productType=umcbl")
            .await?;

        let mut snapshot = BalanceSnapshot::new();
        let mut total_usdt = Decimal::ZERO;
        for account in accounts {
            let total =
                Self::parse_decimal(&account.available) + Self::parse_decimal(&account.locked);
            snapshot.add_asset(account.margin_coin, total);
            total_usdt += Self::parse_decimal(&account.usdt_equity);
        }
        snapshot.total_usdt = Some(total_usdt);

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_client() -> BitgetClient {
        BitgetClient::new(
            ApiCredential::new("test-key", "test-secret").with_passphrase("test-pass"),
            10,
        )
        .expect("테스트용 클라이언트 생성 실패")
    }

    #[test]
    fn test_missing_passphrase_is_rejected() {
        let err = BitgetClient::new(ApiCredential::new("k", "s"), 10).unwrap_err();
        assert!(err.is_missing_credentials());
    }

    #[test]
    fn test_debug_masks_secrets() {
        let out = format!("{:?}", test_client());
        assert!(!out.contains("test-secret"));
        assert!(!out.contains("test-pass"));
    }

    #[test]
    fn test_sign_deterministic_for_fixed_inputs() {
        let client = test_client();
        let a = client.sign("1700000000000", "GET", "/api/mix/v1/account/accounts?productType=umcbl", "");
        let b = client.sign("1700000000000", "GET", "/api/mix/v1/account/accounts?productType=umcbl", "");
        assert_eq!(a, b);

        // 프리해시의 각 구성 요소가 서명에 반영되는지 확인
        assert_ne!(a, client.sign("1700000000001", "GET", "/api/mix/v1/account/accounts?productType=umcbl", ""));
        assert_ne!(a, client.sign("1700000000000", "POST", "/api/mix/v1/account/accounts?productType=umcbl", ""));
        assert_ne!(a, client.sign("1700000000000", "GET", "/api/mix/v1/account/accounts", ""));
        assert_ne!(a, client.sign("1700000000000", "GET", "/api/mix/v1/account/accounts?productType=umcbl", "{}"));
    }

    #[tokio::test]
    async fn test_fetch_balances_reads_usdt_equity() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/mix/v1/account/accounts")
            .match_query(mockito::Matcher::UrlEncoded(
                "productType".into(),
                "umcbl".into(),
            ))
            .match_header("ACCESS-KEY", "test-key")
            .match_header("ACCESS-PASSPHRASE", "test-pass")
            .with_status(200)
            .with_body(
                r#"{"code":"00000","msg":"success","data":[
                    {"marginCoin":"USDT","available":"150.5","locked":"10","usdtEquity":"160.5"}
                ]}"#,
            )
            .create_async()
            .await;

        let client = test_client().with_base_url(server.url());
        let snapshot = client.fetch_balances().await.unwrap();

        mock.assert_async().await;
        assert_eq!(snapshot.assets["USDT"], dec!(160.5));
        assert_eq!(snapshot.total_usdt, Some(dec!(160.5)));
    }

    #[tokio::test]
    async fn test_fetch_balances_vendor_error_code() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/mix/v1/account/accounts")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"code":"40012","msg":"apikey/password is incorrect","data":null}"#)
            .create_async()
            .await;

        let client = test_client().with_base_url(server.url());
        let err = client.fetch_balances().await.unwrap_err();
        assert!(matches!(err, ExchangeError::Unavailable { .. }));
        assert!(err.display_message().contains("40012"));
    }
}
