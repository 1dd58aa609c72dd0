//! 거래소 에러 타입.

use journal_core::ExchangeId;
use thiserror::Error;

/// 거래소 관련 에러.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// 자격증명이 저장되어 있지 않고 환경 변수에도 없음
    #[error("Missing credentials for {0}")]
    MissingCredentials(ExchangeId),

    /// 자격증명 유효성 에러 (passphrase 누락 등)
    #[error("Invalid credentials for {exchange}: {message}")]
    InvalidCredentials {
        exchange: ExchangeId,
        message: String,
    },

    /// 거래소 호출 실패 (HTTP 에러, 벤더 에러 코드 등)
    #[error("{exchange} unavailable: {message}")]
    Unavailable {
        exchange: ExchangeId,
        message: String,
    },

    /// 네트워크/연결 에러
    #[error("Network error: {0}")]
    NetworkError(String),

    /// 타임아웃
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// 벤더 응답이 기대한 형태가 아님
    #[error("Malformed response from {exchange}: {message}")]
    MalformedResponse {
        exchange: ExchangeId,
        message: String,
    },

    /// 파싱/역직렬화 에러
    #[error("Parse error: {0}")]
    ParseError(String),

    /// 알 수 없는 에러
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl ExchangeError {
    /// 자격증명 부재로 인한 에러인지 확인.
    pub fn is_missing_credentials(&self) -> bool {
        matches!(self, ExchangeError::MissingCredentials(_))
    }

    /// 집계 결과에 표시할 사용자용 메시지.
    ///
    /// 벤더 응답의 구조적 결함은 모두 "no data"로 평탄화되고,
    /// 호출 실패는 원인 메시지를 그대로 노출합니다.
    pub fn display_message(&self) -> String {
        match self {
            ExchangeError::MalformedResponse { .. } | ExchangeError::ParseError(_) => {
                "no data".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExchangeError::Timeout(err.to_string())
        } else if err.is_connect() {
            ExchangeError::NetworkError(err.to_string())
        } else {
            ExchangeError::Unknown(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ExchangeError {
    fn from(err: serde_json::Error) -> Self {
        ExchangeError::ParseError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_response_displays_as_no_data() {
        let err = ExchangeError::MalformedResponse {
            exchange: ExchangeId::Kraken,
            message: "missing result field".to_string(),
        };
        assert_eq!(err.display_message(), "no data");
    }

    #[test]
    fn test_unavailable_preserves_message() {
        let err = ExchangeError::Unavailable {
            exchange: ExchangeId::Binance,
            message: "HTTP 502".to_string(),
        };
        assert!(err.display_message().contains("HTTP 502"));
    }
}
