//! Kraken 거래소 커넥터.
//!
//! Kraken 현물 계좌 API 구현. 서명은 base64로 디코딩한 시크릿을 키로
//! `path + SHA256(nonce + postdata)`에 HMAC-SHA512를 적용합니다.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use journal_core::{ApiCredential, BalanceSnapshot, ExchangeId};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use sha2::{Digest, Sha256, Sha512};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, error};

use crate::traits::{BalanceProvider, ExchangeResult};
use crate::ExchangeError;

type HmacSha512 = Hmac<Sha512>;

const DEFAULT_BASE_URL: &str = "https://api.kraken.com";
const BALANCE_PATH: &str = "/0/private/Balance";

#[derive(Debug, Deserialize)]
struct KrakenResponse {
    error: Vec<String>,
    result: Option<HashMap<String, String>>,
}

/// Kraken 거래소 클라이언트.
pub struct KrakenClient {
    credential: ApiCredential,
    client: Client,
    base_url: String,
}

impl KrakenClient {
    /// 새 Kraken 클라이언트 생성.
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
        })
    }

    /// 기본 URL 재정의 (테스트용).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// nonce용 현재 타임스탬프(밀리초) 반환.
    fn nonce() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards")
            .as_millis() as u64
    }

    /// Kraken API 서명 생성.
    ///
    /// 시크릿은 base64로 인코딩되어 있어 서명 전에 디코딩해야 합니다.
    fn sign(&self, path: &str, nonce: &str, postdata: &str) -> Result<String, ExchangeError> {
        let secret = BASE64.decode(&self.credential.api_secret).map_err(|e| {
            ExchangeError::InvalidCredentials {
                exchange: ExchangeId::Kraken,
                message: format!("secret is not valid base64: {}", e),
            }
        })?;

        let mut sha256 = Sha256::new();
        sha256.update(nonce.as_bytes());
        sha256.update(postdata.as_bytes());
        let digest = sha256.finalize();

        let mut mac = HmacSha512::new_from_slice(&secret).expect("Invalid key");
        mac.update(path.as_bytes());
        mac.update(&digest);
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }

    fn parse_decimal(s: &str) -> Decimal {
        s.parse().unwrap_or(Decimal::ZERO)
    }
}

// 시크릿 노출 방지를 위한 수동 Debug 구현
impl std::fmt::Debug for KrakenClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KrakenClient")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl BalanceProvider for KrakenClient {
    fn exchange_id(&self) -> ExchangeId {
        ExchangeId::Kraken
    }

    async fn fetch_balances(&self) -> ExchangeResult<BalanceSnapshot> {
        let nonce = Self::nonce().to_string();
        let postdata = format!("nonce={}", nonce);
        let signature = self.sign(BALANCE_PATH, &nonce, &postdata)?;

        debug!("POST (signed) {}", BALANCE_PATH);

        let response = self
            .client
            .post(format!("{}{}", self.base_url, BALANCE_PATH))
            .header("API-Key", &self.credential.api_key)
            .header("API-Sign", signature)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(postdata)
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
                exchange: ExchangeId::Kraken,
                message: format!("HTTP {}", status.as_u16()),
            });
        }

        let parsed: KrakenResponse = serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse kraken response: {} - Body: {}", e, body);
            ExchangeError::MalformedResponse {
                exchange: ExchangeId::Kraken,
                message: e.to_string(),
            }
        })?;

        if !parsed.error.is_empty() {
            return Err(ExchangeError::Unavailable {
                exchange: ExchangeId::Kraken,
                message: parsed.error.join(", "),
            });
        }

        let result = parsed.result.ok_or_else(|| ExchangeError::MalformedResponse {
            exchange: ExchangeId::Kraken,
            message: "missing result field".to_string(),
        })?;

        let mut snapshot = BalanceSnapshot::new();
        for (asset, amount) in result {
            snapshot.add_asset(asset, Self::parse_decimal(&amount));
        }

        Ok(snapshot)
    }
}
