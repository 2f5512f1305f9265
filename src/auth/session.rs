/// Session issuing
///
/// Turns credentials into access tokens, refreshes tokens, and resolves the
/// user a token belongs to. Tokens are never revoked: a refreshed token
/// lives alongside the old one until each expires.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::codec::{Claims, TokenCodec};
use crate::auth::credentials::authenticate;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};
use crate::users::{User, UserStore};

pub const TOKEN_TYPE: &str = "bearer";
pub const DEFAULT_ACCESS_TOKEN_TTL_MINUTES: i64 = 30;

/// Body returned by the login and refresh endpoints
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Clone)]
pub struct SessionIssuer {
    codec: TokenCodec,
    users: Arc<dyn UserStore>,
    access_token_ttl: Duration,
}

impl SessionIssuer {
    pub fn new(codec: TokenCodec, users: Arc<dyn UserStore>, access_token_ttl: Duration) -> Self {
        Self {
            codec,
            users,
            access_token_ttl,
        }
    }

    pub fn from_settings(settings: &JwtSettings, users: Arc<dyn UserStore>) -> Result<Self, AppError> {
        let minutes = if settings.access_token_expire_minutes > 0 {
            settings.access_token_expire_minutes
        } else {
            DEFAULT_ACCESS_TOKEN_TTL_MINUTES
        };
        Ok(Self::new(
            TokenCodec::from_settings(settings)?,
            users,
            Duration::minutes(minutes),
        ))
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Exchange a username and password for an access token.
    ///
    /// # Errors
    /// `AuthError::IncorrectCredentials` when the pair does not match.
    pub async fn login(&self, username: &str, password: &str) -> Result<AccessToken, AppError> {
        let user = authenticate(self.users.as_ref(), username, password)
            .await?
            .ok_or(AuthError::IncorrectCredentials)?;

        let token = self.issue_for(&user.username)?;
        tracing::info!(user_id = %user.id, "User logged in");
        Ok(token)
    }

    /// Mint a fresh token for the subject of `current_token`.
    ///
    /// The subject is not looked up again; any token with a valid signature
    /// and a `sub` is enough.
    ///
    /// # Errors
    /// `AuthError::CouldNotValidateCredentials` for an invalid token or one
    /// without a subject.
    pub async fn refresh(&self, current_token: &str) -> Result<AccessToken, AppError> {
        let claims = self.codec.verify(current_token)?;
        let subject = subject(&claims)?;

        let token = self.issue_for(subject)?;
        tracing::info!(subject = %subject, "Access token refreshed");
        Ok(token)
    }

    /// Find the user a token was issued to.
    ///
    /// # Errors
    /// `AuthError::CouldNotValidateCredentials` for an invalid token, a
    /// missing subject, or a subject with no matching user.
    pub async fn resolve_current_user(&self, token: &str) -> Result<User, AppError> {
        let claims = self.codec.verify(token)?;
        let username = subject(&claims)?;

        self.users
            .find_by_username(username)
            .await?
            .ok_or_else(|| {
                tracing::warn!(subject = %username, "Token subject has no matching user");
                AuthError::CouldNotValidateCredentials.into()
            })
    }

    /// Gate for routes that need an active user. Users carry no activity
    /// flag, so only an absent user is rejected.
    ///
    /// # Errors
    /// `AuthError::InactiveUser`
    pub fn require_active(&self, user: Option<User>) -> Result<User, AppError> {
        user.ok_or_else(|| AuthError::InactiveUser.into())
    }

    fn issue_for(&self, username: &str) -> Result<AccessToken, AppError> {
        let mut claims = Claims::new();
        claims.insert("sub".to_string(), Value::from(username));
        // keeps two tokens minted in the same second distinct
        claims.insert("jti".to_string(), Value::from(Uuid::new_v4().to_string()));

        Ok(AccessToken {
            access_token: self.codec.issue(&claims, self.access_token_ttl)?,
            token_type: TOKEN_TYPE.to_string(),
        })
    }
}

fn subject(claims: &Claims) -> Result<&str, AppError> {
    claims
        .get("sub")
        .and_then(Value::as_str)
        .ok_or_else(|| AuthError::CouldNotValidateCredentials.into())
}
