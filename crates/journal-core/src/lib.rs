//! # Journal Core
//!
//! 트레이딩 저널의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 거래소 식별자 및 자격증명 타입
//! - 정규화된 잔고 구조체
//! - 설정 관리
//! - 로깅 인프라
//! - 자격증명 암호화

pub mod config;
pub mod crypto;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use crypto::{CredentialEncryptor, CryptoError};
pub use error::*;
pub use logging::*;
pub use types::*;
