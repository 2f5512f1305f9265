/// Bearer Authentication Middleware
///
/// Resolves the user behind `Authorization: Bearer <token>` and injects it
/// into request extensions, where handlers read it as `web::ReqData<User>`.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderMap, AUTHORIZATION},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::SessionIssuer;
use crate::error::{AppError, AuthError};

/// Extract the token from a `Bearer` authorization header. The scheme is
/// matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token.to_string())
    } else {
        None
    }
}

pub struct AuthMiddleware {
    issuer: SessionIssuer,
}

impl AuthMiddleware {
    pub fn new(issuer: SessionIssuer) -> Self {
        Self { issuer }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            issuer: self.issuer.clone(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    issuer: SessionIssuer,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let issuer = self.issuer.clone();

        Box::pin(async move {
            let Some(token) = bearer_token(req.headers()) else {
                tracing::warn!(path = %req.path(), "Missing or malformed Authorization header");
                return Err(AppError::Auth(AuthError::MissingToken).into());
            };

            let user = issuer.resolve_current_user(&token).await?;
            let user = issuer.require_active(Some(user))?;

            tracing::debug!(user_id = %user.id, "Bearer token accepted");
            req.extensions_mut().insert(user);

            service.call(req).await
        })
    }
}
