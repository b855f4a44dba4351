//! Account repository for database operations

use crate::auth::{PasswordService, TokenProfile};
use account_auth_shared::AccountProfile;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Account record from the store, credential fields included
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccountRecord {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: String,
    pub password_hash: String,
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AccountRecord {
    /// Compare a plaintext password with the stored hash
    pub async fn is_password_correct(&self, password: &str) -> Result<bool> {
        PasswordService::verify_async(password.to_string(), self.password_hash.clone()).await
    }

    /// Claims embedded in this account's access tokens
    pub fn token_profile(&self) -> TokenProfile {
        TokenProfile {
            username: self.username.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
        }
    }

    /// Public view with password hash and refresh token stripped
    pub fn profile(&self) -> AccountProfile {
        AccountProfile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            avatar: self.avatar.clone(),
            cover_image: self.cover_image.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Input for creating an account. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: String,
    pub password_hash: String,
}

/// Account store.
///
/// Every write is a single-row update keyed by id, so consistency relies on
/// per-row atomicity only. `swap_refresh_token` is the one conditional write.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AccountRecord>>;

    /// Match on username or email, whichever is given
    async fn find_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<AccountRecord>>;

    /// Returns `None` when the username or email is already taken
    async fn create(&self, account: NewAccount) -> Result<Option<AccountRecord>>;

    /// Overwrite (or clear) the stored refresh token. `false` if no such account.
    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> Result<bool>;

    /// Replace the stored refresh token only if it still equals `expected`
    async fn swap_refresh_token(&self, id: Uuid, expected: &str, next: &str) -> Result<bool>;

    /// Store a new password hash, optionally clearing the refresh token in the same write
    async fn update_password_hash(
        &self,
        id: Uuid,
        password_hash: &str,
        revoke_refresh_token: bool,
    ) -> Result<bool>;

    /// Check the store is reachable
    async fn ping(&self) -> Result<()>;
}

/// Postgres-backed account repository
#[derive(Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AccountRecord>> {
        let account = sqlx::query_as::<_, AccountRecord>(
            r#"
            SELECT id, username, email, full_name, avatar, cover_image,
                   password_hash, refresh_token, created_at, updated_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn find_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<AccountRecord>> {
        if username.is_none() && email.is_none() {
            return Ok(None);
        }

        let account = sqlx::query_as::<_, AccountRecord>(
            r#"
            SELECT id, username, email, full_name, avatar, cover_image,
                   password_hash, refresh_token, created_at, updated_at
            FROM accounts
            WHERE ($1::TEXT IS NOT NULL AND username = $1)
               OR ($2::TEXT IS NOT NULL AND email = $2)
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(username)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn create(&self, account: NewAccount) -> Result<Option<AccountRecord>> {
        let created = sqlx::query_as::<_, AccountRecord>(
            r#"
            INSERT INTO accounts (id, username, email, full_name, avatar, cover_image, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT DO NOTHING
            RETURNING id, username, email, full_name, avatar, cover_image,
                      password_hash, refresh_token, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.full_name)
        .bind(&account.avatar)
        .bind(&account.cover_image)
        .bind(&account.password_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(created)
    }

    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE accounts SET refresh_token = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn swap_refresh_token(&self, id: Uuid, expected: &str, next: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE accounts SET refresh_token = $3, updated_at = NOW()
            WHERE id = $1 AND refresh_token = $2
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(next)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_password_hash(
        &self,
        id: Uuid,
        password_hash: &str,
        revoke_refresh_token: bool,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE accounts SET
                password_hash = $2,
                refresh_token = CASE WHEN $3 THEN NULL ELSE refresh_token END,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .bind(revoke_refresh_token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn ping(&self) -> Result<()> {
        crate::db::health_check(&self.pool).await
    }
}
