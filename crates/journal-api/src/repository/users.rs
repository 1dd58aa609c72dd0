//! 사용자 Repository.
//!
//! users 테이블에 대한 생성/조회/프로필 갱신.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::RepositoryError;

/// DB에서 조회한 사용자 row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub date_of_birth: NaiveDate,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 신규 사용자 생성 요청.
#[derive(Debug)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub date_of_birth: NaiveDate,
}

/// 사용자 Repository.
pub struct UserRepository;

impl UserRepository {
    /// 사용자 생성.
    ///
    /// username UNIQUE 제약 위반은 `sqlx::Error::Database`로 전달됩니다.
    pub async fn create(pool: &PgPool, new_user: &NewUser) -> Result<UserRow, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, username, password_hash, date_of_birth)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, password_hash, date_of_birth, email, phone, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.username)
        .bind(&new_user.password_hash)
        .bind(new_user.date_of_birth)
        .fetch_one(pool)
        .await?;

        Ok(row)
    }

    /// username으로 사용자 조회.
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<UserRow>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, password_hash, date_of_birth, email, phone, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }

    /// id로 사용자 조회.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<UserRow>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, password_hash, date_of_birth, email, phone, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }

    /// 프로필(이메일/전화번호) 갱신.
    ///
    /// None으로 전달된 필드는 기존 값을 유지합니다.
    pub async fn update_profile(
        pool: &PgPool,
        id: Uuid,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Option<UserRow>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET email = COALESCE($2, email),
                phone = COALESCE($3, phone),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, username, password_hash, date_of_birth, email, phone, created_at
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(phone)
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }
}
