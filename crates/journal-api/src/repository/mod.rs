//! 데이터베이스 Repository 계층.
//!
//! sqlx/PostgreSQL 기반 사용자 및 거래소 자격증명 저장소.

mod credentials;
mod users;

pub use credentials::{CredentialRepository, CredentialSummary, StoredCredentialSource};
pub use users::{NewUser, UserRepository, UserRow};

use journal_core::crypto::CryptoError;

/// Repository 계층 에러.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("데이터베이스 에러: {0}")]
    Database(#[from] sqlx::Error),
    #[error("자격증명 암호화/복호화 실패: {0}")]
    Crypto(#[from] CryptoError),
}
