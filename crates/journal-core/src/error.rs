//! 트레이딩 저널의 코어 에러 타입.
//!
//! 설정 로드와 로깅 초기화 등 코어 인프라 경로의 실패를 표현합니다.
//! 거래소/저장소 계층은 각자의 에러 타입을 사용합니다.

use thiserror::Error;

/// 핵심 저널 에러.
#[derive(Debug, Error)]
pub enum JournalError {
    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 내부 에러 (로깅 초기화 실패 등)
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// 저널 작업을 위한 Result 타입.
pub type JournalResult<T> = Result<T, JournalError>;

impl From<config::ConfigError> for JournalError {
    fn from(err: config::ConfigError) -> Self {
        JournalError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_conversion() {
        let err: JournalError = config::ConfigError::Message("bad value".to_string()).into();
        assert!(matches!(err, JournalError::Config(_)));
        assert!(err.to_string().contains("bad value"));
    }
}
