//! Binance 거래소 커넥터.
//!
//! Binance Spot 계좌 API 구현. 쿼리 문자열을 HMAC-SHA256으로 서명하고
//! `X-MBX-APIKEY` 헤더로 인증합니다.

use async_trait::async_trait;
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

const DEFAULT_BASE_URL: &str = "https://api.binance.com";
const RECV_WINDOW_MS: u64 = 5000;

// ============================================================================
// API 응답 타입
// ============================================================================

#[derive(Debug, Deserialize)]
struct BinanceAccountBalance {
    asset: String,
    free: String,
    locked: String,
}

#[derive(Debug, Deserialize)]
struct BinanceAccountInfo {
    balances: Vec<BinanceAccountBalance>,
}

#[derive(Debug, Deserialize)]
struct BinanceError {
    code: i32,
    msg: String,
}

// ============================================================================
// Binance 클라이언트
// ============================================================================

/// Binance 거래소 클라이언트.
pub struct BinanceClient {
    credential: ApiCredential,
    client: Client,
    base_url: String,
}

impl BinanceClient {
    /// 새 Binance 클라이언트 생성.
    ///
    /// # Errors
    /// HTTP 클라이언트 생성에 실패하면 `ExchangeError::NetworkError`를 반환합니다.
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

    /// 현재 타임스탬프(밀리초) 반환.
    fn timestamp_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards")
            .as_millis() as u64
    }

    /// HMAC-SHA256으로 쿼리 문자열 서명.
    fn sign(&self, query: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.credential.api_secret.as_bytes())
            .expect("Invalid key");
        mac.update(query.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// 서명된 GET 요청.
    async fn signed_get<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
    ) -> ExchangeResult<T> {
        let query = format!(
            "timestamp={}&recvWindow={}",
            Self::timestamp_ms(),
            RECV_WINDOW_MS
        );
        let signature = self.sign(&query);
        let full_url = format!("{}{}?{}&signature={}", self.base_url, endpoint, query, signature);

        debug!("GET (signed) {}", endpoint);

        let response = self
            .client
            .get(&full_url)
            .header("X-MBX-APIKEY", &self.credential.api_key)
            .send()
            .await
            .map_err(ExchangeError::from)?;

        self.handle_response(response).await
    }

    /// API 응답 처리.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> ExchangeResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ExchangeError::NetworkError(e.to_string()))?;

        if status.is_success() {
            serde_json::from_str(&body).map_err(|e| {
                error!("Failed to parse binance response: {} - Body: {}", e, body);
                ExchangeError::MalformedResponse {
                    exchange: ExchangeId::Binance,
                    message: e.to_string(),
                }
            })
        } else if let Ok(error) = serde_json::from_str::<BinanceError>(&body) {
            Err(ExchangeError::Unavailable {
                exchange: ExchangeId::Binance,
                message: format!("API error {}: {}", error.code, error.msg),
            })
        } else {
            Err(ExchangeError::Unavailable {
                exchange: ExchangeId::Binance,
                message: format!("HTTP {}", status.as_u16()),
            })
        }
    }

    /// 문자열에서 Decimal 파싱.
    fn parse_decimal(s: &str) -> Decimal {
        s.parse().unwrap_or(Decimal::ZERO)
    }
}

// 시크릿 노출 방지를 위한 수동 Debug 구현 (ApiCredential의 마스킹 위임)
impl std::fmt::Debug for BinanceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinanceClient")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl BalanceProvider for BinanceClient {
    fn exchange_id(&self) -> ExchangeId {
        ExchangeId::Binance
    }

    async fn fetch_balances(&self) -> ExchangeResult<BalanceSnapshot> {
        let account: BinanceAccountInfo = self.signed_get("/api/v3/account").await?;

        let mut snapshot = BalanceSnapshot::new();
        for balance in account.balances {
            let total = Self::parse_decimal(&balance.free) + Self::parse_decimal(&balance.locked);
            snapshot.add_asset(balance.asset, total);
        }

        Ok(snapshot)
    }
}
