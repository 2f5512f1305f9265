/// User records and the store that owns them

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    /// SHA-256 hex digest of the pending email verification token
    pub verification_token_hash: Option<String>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Everything needed to create a user; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub verification_token_hash: String,
}

/// Public view of a user, safe to return over HTTP
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub is_verified: bool,
    pub created_at: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            is_verified: user.is_verified,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Lookup and persistence of users, keyed by username
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    /// # Errors
    /// A duplicate username or email is a unique-constraint violation.
    async fn insert(&self, user: NewUser) -> Result<User, AppError>;

    /// Mark the user's email as verified and drop the pending token.
    async fn mark_verified(&self, username: &str) -> Result<(), AppError>;
}

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, verification_token_hash, is_verified, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn insert(&self, user: NewUser) -> Result<User, AppError> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, password_hash, verification_token_hash, is_verified, created_at)
            VALUES ($1, $2, $3, $4, $5, false, $6)
            RETURNING id, username, email, password_hash, verification_token_hash, is_verified, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.verification_token_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(user_id = %created.id, "New user saved");
        Ok(created)
    }

    async fn mark_verified(&self, username: &str) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET is_verified = true, verification_token_hash = NULL
            WHERE username = $1
            "#,
        )
        .bind(username)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("User"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_response_hides_secrets() {
        let user = User {
            id: Uuid::new_v4(),
            username: "test".to_string(),
            email: "test@example.com".to_string(),
            password_hash: "$2b$04$secret".to_string(),
            verification_token_hash: Some("abc".to_string()),
            is_verified: false,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(UserResponse::from(&user)).unwrap();
        assert_eq!(json["username"], "test");
        assert_eq!(json["email"], "test@example.com");
        assert!(json.get("password_hash").is_none());
        assert!(json.get("verification_token_hash").is_none());
    }
}
