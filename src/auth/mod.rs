/// Authentication module
///
/// Token signing and verification, password hashing, credential checks,
/// and the session issuer that ties them together.

mod codec;
mod credentials;
mod password;
mod session;

pub use codec::{Claims, InvalidToken, TokenCodec};
pub use credentials::authenticate;
pub use password::{
    hash_password, hash_password_blocking, validate_password_strength, verify_password,
    verify_password_blocking,
};
pub use session::{AccessToken, SessionIssuer, DEFAULT_ACCESS_TOKEN_TTL_MINUTES, TOKEN_TYPE};
