/// Registration Routes
///
/// Account creation and email verification.

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::auth::{hash_password_blocking, validate_password_strength};
use crate::email_client::EmailClient;
use crate::error::{AppError, AuthError, DatabaseError, ErrorContext};
use crate::logger::RequestId;
use crate::startup::ApplicationBaseUrl;
use crate::users::{NewUser, UserResponse, UserStore};
use crate::validators::{is_valid_email, is_valid_username};
use crate::verification_token::{matches_digest, VerificationToken};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct VerifyPath {
    pub username: String,
    pub token: String,
}

/// POST /register
///
/// Email a verification link, then store the unverified account. A failed
/// send stores nothing, so the same registration can simply be retried.
///
/// # Errors
/// - 400: Invalid username/email or weak password
/// - 409: Username or email already registered
/// - 503: The verification email could not be delivered
pub async fn register(
    body: web::Json<RegisterRequest>,
    users: web::Data<dyn UserStore>,
    email_client: web::Data<EmailClient>,
    base_url: web::Data<ApplicationBaseUrl>,
    request_id: RequestId,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let username = is_valid_username(&body.username)?;
    let email = is_valid_email(&body.email)?;
    validate_password_strength(&body.password)?;

    let context =
        ErrorContext::new(request_id.as_str(), "user_registration").with_username(username.as_str());

    if users.find_by_username(&username).await?.is_some() {
        return Err(DatabaseError::UniqueConstraintViolation(format!(
            "username '{}' is taken",
            username
        ))
        .into());
    }

    let password_hash = hash_password_blocking(body.password).await?;
    let verification_token = VerificationToken::generate();
    let verification_link = format!(
        "{}/verify/{}/{}",
        base_url.0.trim_end_matches('/'),
        username,
        verification_token.as_str()
    );

    email_client
        .send_verification_email(&email, &username, &verification_link)
        .await
        .map_err(|e| {
            let e = AppError::from(e);
            context.log_error(&e);
            e
        })?;

    let user = users
        .insert(NewUser {
            username,
            email,
            password_hash,
            verification_token_hash: verification_token.digest(),
        })
        .await
        .map_err(|e| {
            context.log_error(&e);
            e
        })?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user.id,
        "User registered, verification email sent"
    );

    Ok(HttpResponse::Created().json(UserResponse::from(&user)))
}

/// GET /verify/{username}/{token}
///
/// # Errors
/// - 404: Unknown user
/// - 400: Token does not match, or the account is already verified
pub async fn verify_email(
    path: web::Path<VerifyPath>,
    users: web::Data<dyn UserStore>,
    request_id: RequestId,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new(request_id.as_str(), "email_verification")
        .with_username(path.username.as_str());

    let user = users
        .find_by_username(&path.username)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    let token_matches = user
        .verification_token_hash
        .as_deref()
        .map(|stored| matches_digest(&path.token, stored))
        .unwrap_or(false);

    if user.is_verified || !token_matches {
        let e = AppError::Auth(AuthError::InvalidVerificationToken);
        context.log_error(&e);
        return Err(e);
    }

    users.mark_verified(&user.username).await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user.id,
        "Email verified"
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Email verified, you can now log in"
    })))
}

