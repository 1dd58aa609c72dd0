//! # 암호화 모듈
//!
//! AES-256-GCM을 사용한 거래소 자격증명 암호화/복호화 기능을 제공합니다.
//!
//! ## 보안 고려사항
//! - 마스터 키는 환경변수 또는 보안 저장소에서 로드
//! - 각 암호화마다 고유한 nonce (12바이트) 사용
//! - 암호화된 데이터와 nonce를 함께 저장

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use thiserror::Error;

/// 암호화 에러
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Invalid master key length: expected 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Invalid nonce length: expected 12 bytes, got {0}")]
    InvalidNonceLength(usize),

    #[error("Base64 decode error: {0}")]
    Base64DecodeError(#[from] base64::DecodeError),

    #[error("UTF-8 decode error: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),
}

/// AES-256-GCM nonce 크기 (바이트)
pub const NONCE_SIZE: usize = 12;

/// AES-256 키 크기 (바이트)
pub const KEY_SIZE: usize = 32;

/// 자격증명 암호화 관리자
pub struct CredentialEncryptor {
    cipher: Aes256Gcm,
}

impl CredentialEncryptor {
    /// 마스터 키로 암호화 관리자 생성
    ///
    /// # Arguments
    /// * `master_key` - Base64로 인코딩된 32바이트 마스터 키
    pub fn new(master_key: &str) -> Result<Self, CryptoError> {
        let key_bytes = Self::decode_key(master_key)?;
        let cipher = Aes256Gcm::new_from_slice(&key_bytes)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        Ok(Self { cipher })
    }

    /// Base64로 인코딩된 마스터 키 디코드
    fn decode_key(master_key: &str) -> Result<Vec<u8>, CryptoError> {
        use base64::Engine;
        let key_bytes = base64::engine::general_purpose::STANDARD.decode(master_key)?;

        if key_bytes.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength(key_bytes.len()));
        }

        Ok(key_bytes)
    }

    /// 랜덤 nonce 생성
    pub fn generate_nonce() -> [u8; NONCE_SIZE] {
        let mut nonce = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);
        nonce
    }

    /// 문자열 암호화
    ///
    /// # Returns
    /// * `(encrypted_data, nonce)` - 암호화된 데이터와 사용된 nonce
    pub fn encrypt(&self, plaintext: &str) -> Result<(Vec<u8>, [u8; NONCE_SIZE]), CryptoError> {
        let nonce_bytes = Self::generate_nonce();
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        Ok((ciphertext, nonce_bytes))
    }

    /// 암호화된 데이터 복호화
    pub fn decrypt(&self, ciphertext: &[u8], nonce: &[u8]) -> Result<String, CryptoError> {
        if nonce.len() != NONCE_SIZE {
            return Err(CryptoError::InvalidNonceLength(nonce.len()));
        }

        let nonce = Nonce::from_slice(nonce);

        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;

        String::from_utf8(plaintext).map_err(CryptoError::from)
    }

    /// JSON 암호화 (자격증명 구조체용)
    pub fn encrypt_json<T: serde::Serialize>(
        &self,
        data: &T,
    ) -> Result<(Vec<u8>, [u8; NONCE_SIZE]), CryptoError> {
        let json = serde_json::to_string(data)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;
        self.encrypt(&json)
    }

    /// 암호화된 JSON 복호화
    pub fn decrypt_json<T: serde::de::DeserializeOwned>(
        &self,
        ciphertext: &[u8],
        nonce: &[u8],
    ) -> Result<T, CryptoError> {
        let json = self.decrypt(ciphertext, nonce)?;
        serde_json::from_str(&json).map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
    }
}
