//! MEXC 거래소 커넥터.
//!
//! MEXC 현물 계좌 API 구현. 서버 시간을 먼저 조회한 뒤 양수 오프셋을
//! 더한 `req_time`으로 요청하며, 서명은 알파벳순으로 정렬한 파라미터
//! 문자열에 시크릿을 이어붙인 MD5 해시(대문자 16진수)입니다.

use async_trait::async_trait;
use journal_core::{ApiCredential, BalanceSnapshot, ExchangeId};
use md5::{Digest, Md5};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, error};

use crate::traits::{BalanceProvider, ExchangeResult};
use crate::ExchangeError;

const DEFAULT_BASE_URL: &str = "https://www.mexc.com";
const TIME_PATH: &str = "/open/api/v2/common/timestamp";
const ACCOUNT_PATH: &str = "/open/api/v2/account/info";
const SUCCESS_CODE: i64 = 200;

/// 서버 시간에 더하는 기본 오프셋(밀리초). 과거 타임스탬프 거부를 피합니다.
const DEFAULT_TIME_OFFSET_MS: u64 = 1000;

#[derive(Debug, Deserialize)]
struct MexcResponse<T> {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct MexcAssetBalance {
    available: String,
    frozen: String,
}

/// MEXC 거래소 클라이언트.
pub struct MexcClient {
    credential: ApiCredential,
    client: Client,
    base_url: String,
    time_offset_ms: u64,
}

impl MexcClient {
    /// 새 MEXC 클라이언트 생성.
    pub fn new(credential: ApiCredential, timeout_secs: u64) -> Result<Self, ExchangeError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| {
                ExchangeError::NetworkError(format!("HTTP 클라이언트 생성 실패: {}", e))
            })?;

        Ok(Self {
            credential,
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            time_offset_ms: DEFAULT_TIME_OFFSET_MS,
        })
    }

    /// 기본 URL 재정의 (테스트용).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// 서버 시간 오프셋(밀리초) 재정의. 항상 양수여야 합니다.
    pub fn with_time_offset_ms(mut self, offset_ms: u64) -> Self {
        self.time_offset_ms = offset_ms.max(1);
        self
    }

    /// 파라미터를 알파벳순으로 정렬해 서명.
    fn sign(&self, params: &[(&str, &str)]) -> String {
        let mut sorted: Vec<_> = params.to_vec();
        sorted.sort_by_key(|(k, _)| *k);

        let canonical = sorted
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Md5::new();
        hasher.update(canonical.as_bytes());
        hasher.update(self.credential.api_secret.as_bytes());
        hex::encode_upper(hasher.finalize())
    }

    /// 서버 시간(밀리초) 조회.
    async fn server_time_ms(&self) -> ExchangeResult<u64> {
        debug!("GET {}", TIME_PATH);

        let response = self
            .client
            .get(format!("{}{}", self.base_url, TIME_PATH))
            .send()
            .await
            .map_err(ExchangeError::from)?;

        let body = response
            .text()
            .await
            .map_err(|e| ExchangeError::NetworkError(e.to_string()))?;

        let parsed: MexcResponse<u64> = serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse mexc timestamp: {} - Body: {}", e, body);
            ExchangeError::MalformedResponse {
                exchange: ExchangeId::Mexc,
                message: e.to_string(),
            }
        })?;

        parsed.data.ok_or_else(|| ExchangeError::MalformedResponse {
            exchange: ExchangeId::Mexc,
            message: "missing server time".to_string(),
        })
    }

    fn parse_decimal(s: &str) -> Decimal {
        s.parse().unwrap_or(Decimal::ZERO)
    }
}

// 시크릿 노출 방지를 위한 수동 Debug 구현
impl std::fmt::Debug for MexcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MexcClient")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .field("time_offset_ms", &self.time_offset_ms)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl BalanceProvider for MexcClient {
    fn exchange_id(&self) -> ExchangeId {
        ExchangeId::Mexc
    }

    async fn fetch_balances(&self) -> ExchangeResult<BalanceSnapshot> {
        let req_time = (self.server_time_ms().await? + self.time_offset_ms).to_string();
        let sign = self.sign(&[
            ("api_key", self.credential.api_key.as_str()),
            ("req_time", req_time.as_str()),
        ]);

        debug!("GET (signed) {}", ACCOUNT_PATH);

        let response = self
            .client
            .get(format!("{}{}", self.base_url, ACCOUNT_PATH))
            .query(&[
                ("api_key", self.credential.api_key.as_str()),
                ("req_time", req_time.as_str()),
                ("sign", sign.as_str()),
            ])
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
                exchange: ExchangeId::Mexc,
                message: format!("HTTP {}: {}", status.as_u16(), body),
            });
        }

        let envelope: MexcResponse<HashMap<String, MexcAssetBalance>> =
            serde_json::from_str(&body).map_err(|e| {
                error!("Failed to parse mexc response: {} - Body: {}", e, body);
                ExchangeError::MalformedResponse {
                    exchange: ExchangeId::Mexc,
                    message: e.to_string(),
                }
            })?;

        if envelope.code != SUCCESS_CODE {
            return Err(ExchangeError::Unavailable {
                exchange: ExchangeId::Mexc,
                message: format!(
                    "API error {}: {}",
                    envelope.code,
                    envelope.msg.unwrap_or_default()
                ),
            });
        }

        let balances = envelope.data.ok_or_else(|| ExchangeError::MalformedResponse {
            exchange: ExchangeId::Mexc,
            message: "missing data field".to_string(),
        })?;

        let mut snapshot = BalanceSnapshot::new();
        for (asset, balance) in balances {
            let total =
                Self::parse_decimal(&balance.available) + Self::parse_decimal(&balance.frozen);
            snapshot.add_asset(asset, total);
        }

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_client() -> MexcClient {
        MexcClient::new(ApiCredential::new("test-key", "test-secret"), 10)
            .expect("테스트용 클라이언트 생성 실패")
    }

    #[test]
    fn test_sign_is_uppercase_hex() {
        let client = test_client();
        let sign = client.sign(&[("api_key", "test-key"), ("req_time", "1700000000000")]);
        assert_eq!(sign.len(), 32);
        assert!(sign.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_sign_is_order_invariant() {
        let client = test_client();
        let a = client.sign(&[("api_key", "test-key"), ("req_time", "1700000000000")]);
        let b = client.sign(&[("req_time", "1700000000000"), ("api_key", "test-key")]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_sign_changes_with_req_time() {
        let client = test_client();
        let a = client.sign(&[("api_key", "test-key"), ("req_time", "1700000000000")]);
        let b = client.sign(&[("api_key", "test-key"), ("req_time", "1700000000001")]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_time_offset_is_always_positive() {
        let client = test_client().with_time_offset_ms(0);
        assert_eq!(client.time_offset_ms, 1);
    }

    #[tokio::test]
    async fn test_fetch_balances_sums_available_and_frozen() {
        let mut server = mockito::Server::new_async().await;
        let time_mock = server
            .mock("GET", TIME_PATH)
            .with_status(200)
            .with_body(r#"{"code":200,"data":1700000000000}"#)
            .create_async()
            .await;
        let account_mock = server
            .mock("GET", "/open/api/v2/account/info")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("api_key".into(), "test-key".into()),
                mockito::Matcher::UrlEncoded("req_time".into(), "1700000001000".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"code":200,"data":{
                    "BTC":{"available":"0.1","frozen":"0.05"},
                    "USDT":{"available":"0","frozen":"0"}
                }}"#,
            )
            .create_async()
            .await;

        let client = test_client().with_base_url(server.url());
        let snapshot = client.fetch_balances().await.unwrap();

        time_mock.assert_async().await;
        account_mock.assert_async().await;
        assert_eq!(snapshot.assets.len(), 1);
        assert_eq!(snapshot.assets["BTC"], dec!(0.15));
    }

    #[tokio::test]
    async fn test_fetch_balances_vendor_error_code() {
        let mut server = mockito::Server::new_async().await;
        let _time = server
            .mock("GET", TIME_PATH)
            .with_status(200)
            .with_body(r#"{"code":200,"data":1700000000000}"#)
            .create_async()
            .await;
        let _account = server
            .mock("GET", ACCOUNT_PATH)
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"code":10072,"msg":"invalid api key"}"#)
            .create_async()
            .await;

        let client = test_client().with_base_url(server.url());
        let err = client.fetch_balances().await.unwrap_err();
        assert!(err.display_message().contains("10072"));
    }
}
