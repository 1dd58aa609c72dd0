//! 거래소 자격증명 Repository.
//!
//! # 보안 설계
//! 평문 자격증명(`ApiCredential`)은 JSON으로 직렬화한 후 전체가
//! AES-256-GCM으로 암호화되어 `exchange_api_keys`에 저장됩니다.
//! 조회 API에는 항상 마스킹된 형태로만 노출됩니다.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use journal_core::crypto::CredentialEncryptor;
use journal_core::{ApiCredential, ExchangeId};
use journal_exchange::{CredentialSource, ExchangeError};
use serde::Serialize;
use sqlx::PgPool;
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

use super::RepositoryError;

/// DB에서 조회한 자격증명 row.
#[derive(sqlx::FromRow)]
struct CredentialRow {
    exchange_id: String,
    encrypted_credentials: Vec<u8>,
    encryption_nonce: Vec<u8>,
    updated_at: DateTime<Utc>,
}

/// 목록/업서트 응답용 자격증명 요약 (키 마스킹).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CredentialSummary {
    /// 거래소 식별자 (소문자)
    pub exchange: String,
    /// 마스킹된 API 키 (앞 4자 + "***")
    pub api_key_masked: String,
    /// passphrase 등록 여부
    pub has_passphrase: bool,
    /// 마지막 갱신 시각
    pub updated_at: DateTime<Utc>,
}

// 바이트가 아닌 문자 단위로 자름 (멀티바이트 키에서 패닉 방지)
fn mask_key(key: &str) -> String {
    if key.chars().count() <= 4 {
        "***".to_string()
    } else {
        let prefix: String = key.chars().take(4).collect();
        format!("{}***", prefix)
    }
}

/// 거래소 자격증명 Repository.
pub struct CredentialRepository;

impl CredentialRepository {
    /// 자격증명 업서트.
    ///
    /// (user_id, exchange_id) 기준으로 존재하면 모든 필드를 교체합니다.
    /// 이전에 passphrase가 저장되어 있었더라도 새 자격증명에 없으면 제거됩니다.
    pub async fn upsert(
        pool: &PgPool,
        encryptor: &CredentialEncryptor,
        user_id: Uuid,
        exchange: ExchangeId,
        credential: &ApiCredential,
    ) -> Result<CredentialSummary, RepositoryError> {
        let (ciphertext, nonce) = encryptor.encrypt_json(credential)?;

        let row = sqlx::query_as::<_, CredentialRow>(
            r#"
            INSERT INTO exchange_api_keys
                (id, user_id, exchange_id, encrypted_credentials, encryption_nonce)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, exchange_id) DO UPDATE
            SET encrypted_credentials = EXCLUDED.encrypted_credentials,
                encryption_nonce = EXCLUDED.encryption_nonce,
                updated_at = NOW()
            RETURNING exchange_id, encrypted_credentials, encryption_nonce, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(exchange.as_str())
        .bind(&ciphertext)
        .bind(nonce.as_slice())
        .fetch_one(pool)
        .await?;

        Ok(CredentialSummary {
            exchange: row.exchange_id,
            api_key_masked: mask_key(&credential.api_key),
            has_passphrase: credential.passphrase.is_some(),
            updated_at: row.updated_at,
        })
    }

    /// 저장된 자격증명 복호화 조회.
    ///
    /// 등록되어 있지 않으면 Ok(None)을 반환합니다 ("미설정"은 에러가 아님).
    pub async fn find(
        pool: &PgPool,
        encryptor: &CredentialEncryptor,
        user_id: Uuid,
        exchange: ExchangeId,
    ) -> Result<Option<ApiCredential>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT exchange_id, encrypted_credentials, encryption_nonce, updated_at
            FROM exchange_api_keys
            WHERE user_id = $1 AND exchange_id = $2
            "#,
        )
        .bind(user_id)
        .bind(exchange.as_str())
        .fetch_optional(pool)
        .await?;

        match row {
            Some(row) => {
                let credential: ApiCredential =
                    encryptor.decrypt_json(&row.encrypted_credentials, &row.encryption_nonce)?;
                Ok(Some(credential))
            }
            None => Ok(None),
        }
    }

    /// 사용자가 등록한 자격증명 목록 (마스킹).
    pub async fn list(
        pool: &PgPool,
        encryptor: &CredentialEncryptor,
        user_id: Uuid,
    ) -> Result<Vec<CredentialSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT exchange_id, encrypted_credentials, encryption_nonce, updated_at
            FROM exchange_api_keys
            WHERE user_id = $1
            ORDER BY exchange_id
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        let mut summaries = Vec::with_capacity(rows.len());
        for row in rows {
            let credential: ApiCredential =
                encryptor.decrypt_json(&row.encrypted_credentials, &row.encryption_nonce)?;
            summaries.push(CredentialSummary {
                exchange: row.exchange_id,
                api_key_masked: mask_key(&credential.api_key),
                has_passphrase: credential.passphrase.is_some(),
                updated_at: row.updated_at,
            });
        }

        Ok(summaries)
    }

    /// 자격증명 삭제.
    ///
    /// # Returns
    ///
    /// 실제로 삭제된 row가 있으면 true
    pub async fn delete(
        pool: &PgPool,
        user_id: Uuid,
        exchange: ExchangeId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            DELETE FROM exchange_api_keys
            WHERE user_id = $1 AND exchange_id = $2
            "#,
        )
        .bind(user_id)
        .bind(exchange.as_str())
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// DB 저장소 기반 `CredentialSource` 구현.
///
/// 특정 사용자로 스코프가 고정되며, 집계기는 이 소스를 통해
/// 등록된 거래소만 조회 대상으로 삼습니다.
pub struct StoredCredentialSource {
    pool: PgPool,
    encryptor: Arc<CredentialEncryptor>,
    user_id: Uuid,
}

impl StoredCredentialSource {
    pub fn new(pool: PgPool, encryptor: Arc<CredentialEncryptor>, user_id: Uuid) -> Self {
        Self {
            pool,
            encryptor,
            user_id,
        }
    }
}

#[async_trait]
impl CredentialSource for StoredCredentialSource {
    async fn credential(
        &self,
        exchange: ExchangeId,
    ) -> Result<Option<ApiCredential>, ExchangeError> {
        CredentialRepository::find(&self.pool, &self.encryptor, self.user_id, exchange)
            .await
            .map_err(|e| {
                warn!("Failed to load credential for {}: {}", exchange, e);
                ExchangeError::Unknown(format!("credential store error: {e}"))
            })
    }
}
