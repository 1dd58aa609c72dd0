//! 거래소 식별자.

use serde::{Deserialize, Serialize};

/// 지원되는 거래소.
///
/// variant 선언 순서는 식별자의 사전순과 일치하며, `Ord`를 통해
/// 집계 결과의 결정적 순서를 보장합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeId {
    /// Binance 현물
    Binance,
    /// Bitget USDT 선물
    Bitget,
    /// Coinbase Pro (Coinbase Exchange)
    Cbpro,
    /// Kraken 현물
    Kraken,
    /// KuCoin 현물
    Kucoin,
    /// MEXC 현물
    Mexc,
}

impl ExchangeId {
    /// 지원되는 모든 거래소 (사전순).
    pub const ALL: [ExchangeId; 6] = [
        ExchangeId::Binance,
        ExchangeId::Bitget,
        ExchangeId::Cbpro,
        ExchangeId::Kraken,
        ExchangeId::Kucoin,
        ExchangeId::Mexc,
    ];

    /// 소문자 식별자 반환.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeId::Binance => "binance",
            ExchangeId::Bitget => "bitget",
            ExchangeId::Cbpro => "cbpro",
            ExchangeId::Kraken => "kraken",
            ExchangeId::Kucoin => "kucoin",
            ExchangeId::Mexc => "mexc",
        }
    }

    /// 환경 변수 접두사 반환 (예: `BINANCE_API_KEY`의 "BINANCE").
    pub fn env_prefix(&self) -> &'static str {
        match self {
            ExchangeId::Binance => "BINANCE",
            ExchangeId::Bitget => "BITGET",
            ExchangeId::Cbpro => "CBPRO",
            ExchangeId::Kraken => "KRAKEN",
            ExchangeId::Kucoin => "KUCOIN",
            ExchangeId::Mexc => "MEXC",
        }
    }

    /// 서명 스킴이 passphrase를 요구하는 거래소인지 확인.
    ///
    /// 해당 거래소에서 passphrase 부재는 null-ok 상태가 아니라
    /// 검증 에러입니다.
    pub fn requires_passphrase(&self) -> bool {
        matches!(
            self,
            ExchangeId::Bitget | ExchangeId::Cbpro | ExchangeId::Kucoin
        )
    }
}

impl std::fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExchangeId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "binance" => Ok(ExchangeId::Binance),
            "bitget" => Ok(ExchangeId::Bitget),
            "cbpro" => Ok(ExchangeId::Cbpro),
            "kraken" => Ok(ExchangeId::Kraken),
            "kucoin" => Ok(ExchangeId::Kucoin),
            "mexc" => Ok(ExchangeId::Mexc),
            _ => Err(format!("지원되지 않는 거래소: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_str() {
        for id in ExchangeId::ALL {
            assert_eq!(id.as_str().parse::<ExchangeId>().unwrap(), id);
        }
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let mut sorted = ExchangeId::ALL;
        sorted.sort();
        let names: Vec<_> = sorted.iter().map(|e| e.as_str()).collect();
        let mut lexicographic = names.clone();
        lexicographic.sort();
        assert_eq!(names, lexicographic);
    }

    #[test]
    fn test_passphrase_requirement() {
        assert!(ExchangeId::Bitget.requires_passphrase());
        assert!(ExchangeId::Cbpro.requires_passphrase());
        assert!(ExchangeId::Kucoin.requires_passphrase());
        assert!(!ExchangeId::Binance.requires_passphrase());
        assert!(!ExchangeId::Kraken.requires_passphrase());
        assert!(!ExchangeId::Mexc.requires_passphrase());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&ExchangeId::Kucoin).unwrap();
        assert_eq!(json, r#""kucoin""#);
    }
}
