/// Middleware module
///
/// Bearer-token authentication for protected routes.

mod auth_middleware;

pub use auth_middleware::{bearer_token, AuthMiddleware};
