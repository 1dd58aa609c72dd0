//! 거래소 API 자격증명.

use serde::{Deserialize, Serialize};

/// 거래소 API 자격증명.
///
/// 평문으로는 커넥터 생성 시점에서만 다뤄지며, 저장소에서는
/// AES-256-GCM으로 암호화된 형태로만 존재합니다.
#[derive(Clone, Serialize, Deserialize)]
pub struct ApiCredential {
    pub api_key: String,
    pub api_secret: String,
    /// Bitget / Coinbase Pro / KuCoin 전용.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passphrase: Option<String>,
}

impl ApiCredential {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            passphrase: None,
        }
    }

    pub fn with_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase = Some(passphrase.into());
        self
    }
}

// 시크릿 노출 방지를 위한 수동 Debug 구현
impl std::fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredential")
            .field("api_key", &mask(&self.api_key))
            .field("api_secret", &"***")
            .field("passphrase", &self.passphrase.as_ref().map(|_| "***"))
            .finish()
    }
}

// 바이트가 아닌 문자 단위로 자름 (멀티바이트 키에서 패닉 방지)
fn mask(s: &str) -> String {
    if s.chars().count() <= 4 {
        "***".to_string()
    } else {
        let prefix: String = s.chars().take(4).collect();
        format!("{}***", prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_masks_secrets() {
        let cred = ApiCredential::new("abcdef123456", "topsecret").with_passphrase("pass");
        let out = format!("{:?}", cred);
        assert!(out.contains("abcd***"));
        assert!(!out.contains("topsecret"));
        assert!(!out.contains("pass\""));
    }

    #[test]
    fn test_debug_handles_multibyte_key() {
        let cred = ApiCredential::new("aкде1234", "secret");
        let out = format!("{:?}", cred);
        assert!(out.contains("aкде***"));
        assert!(!out.contains("1234"));
    }

    #[test]
    fn test_passphrase_omitted_from_json_when_none() {
        let cred = ApiCredential::new("k", "s");
        let json = serde_json::to_string(&cred).unwrap();
        assert!(!json.contains("passphrase"));
    }
}
