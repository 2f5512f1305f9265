/// Authentication Routes
///
/// Token login, token refresh, and the current user's profile.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::auth::SessionIssuer;
use crate::error::{AppError, AuthError, ErrorContext};
use crate::logger::RequestId;
use crate::middleware::bearer_token;
use crate::users::{User, UserResponse};

/// OAuth2 password-flow form
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// POST /token
///
/// Exchange a username and password (form-encoded) for a bearer token.
///
/// # Errors
/// - 401: Incorrect username or password. Unknown usernames get the same
///   response after the same bcrypt work, so they cannot be enumerated.
pub async fn login(
    form: web::Form<LoginForm>,
    issuer: web::Data<SessionIssuer>,
    request_id: RequestId,
) -> Result<HttpResponse, AppError> {
    let context =
        ErrorContext::new(request_id.as_str(), "token_login").with_username(form.username.as_str());

    let token = issuer
        .login(form.username.trim(), &form.password)
        .await
        .map_err(|e| {
            context.log_error(&e);
            e
        })?;

    Ok(HttpResponse::Ok().json(token))
}

/// POST /refresh-token
///
/// Mint a new bearer token from the one in the Authorization header. The
/// presented token remains valid until its own expiry.
///
/// # Errors
/// - 401: Missing, invalid or expired token, or a token without a subject
pub async fn refresh(
    req: HttpRequest,
    issuer: web::Data<SessionIssuer>,
    request_id: RequestId,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new(request_id.as_str(), "token_refresh");

    let current_token = bearer_token(req.headers()).ok_or(AuthError::MissingToken)?;
    let token = issuer.refresh(&current_token).await.map_err(|e| {
        context.log_error(&e);
        e
    })?;

    Ok(HttpResponse::Ok().json(token))
}

/// GET /users/me
///
/// **Requires a bearer token**; the user is injected by `AuthMiddleware`.
pub async fn current_user(user: web::ReqData<User>) -> HttpResponse {
    HttpResponse::Ok().json(UserResponse::from(&*user))
}
