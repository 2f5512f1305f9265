/// Signed, expiring token codec
///
/// Wraps `jsonwebtoken` with a fixed secret and HMAC algorithm. Claims are
/// an open JSON object; the codec only owns the `exp` field.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError, ConfigError};

/// Claim set carried by a token
pub type Claims = Map<String, Value>;

/// The only failure `verify` reports. Expired, forged and malformed tokens
/// are indistinguishable to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidToken;

impl fmt::Display for InvalidToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid token")
    }
}

impl std::error::Error for InvalidToken {}

impl From<InvalidToken> for AppError {
    fn from(_: InvalidToken) -> Self {
        AppError::Auth(AuthError::CouldNotValidateCredentials)
    }
}

#[derive(Clone)]
pub struct TokenCodec {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Build a codec from a shared secret and an algorithm name such as
    /// `"HS256"`.
    ///
    /// # Errors
    /// Returns a configuration error if the secret is empty or the
    /// algorithm is unknown or not an HMAC variant.
    pub fn new(secret: &str, algorithm: &str) -> Result<Self, AppError> {
        if secret.is_empty() {
            return Err(ConfigError::MissingRequired("SECRET_KEY".to_string()).into());
        }

        let algorithm = Algorithm::from_str(algorithm.trim()).map_err(|_| {
            ConfigError::InvalidValue(format!("unknown signing algorithm '{}'", algorithm))
        })?;
        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(ConfigError::InvalidValue(format!(
                "signing algorithm {:?} needs a key pair, only HS256/HS384/HS512 are supported",
                algorithm
            ))
            .into());
        }

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        })
    }

    pub fn from_settings(settings: &JwtSettings) -> Result<Self, AppError> {
        Self::new(&settings.secret, &settings.algorithm)
    }

    /// Sign `claims` plus an `exp` of now + `ttl`.
    pub fn issue(&self, claims: &Claims, ttl: Duration) -> Result<String, AppError> {
        self.issue_at(claims, ttl, Utc::now())
    }

    /// Same as [`issue`](Self::issue) against an explicit clock reading.
    pub fn issue_at(
        &self,
        claims: &Claims,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let mut payload = claims.clone();
        let exp = (now + ttl).timestamp();
        payload.insert("exp".to_string(), Value::from(exp));

        encode(&Header::new(self.algorithm), &payload, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }

    /// Check signature, algorithm and expiry; return the full claim set.
    pub fn verify(&self, token: &str) -> Result<Claims, InvalidToken> {
        self.verify_at(token, Utc::now())
    }

    /// Same as [`verify`](Self::verify) against an explicit clock reading.
    /// A token is expired once `now >= exp`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, InvalidToken> {
        let mut validation = Validation::new(self.algorithm);
        // Expiry is checked below against `now`, without leeway.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Token rejected");
                InvalidToken
            })?;

        match claims.get("exp").and_then(Value::as_i64) {
            Some(exp) if now.timestamp() < exp => Ok(claims),
            Some(_) => {
                tracing::debug!("Token rejected: expired");
                Err(InvalidToken)
            }
            None => {
                tracing::debug!("Token rejected: exp is not an integer");
                Err(InvalidToken)
            }
        }
    }
}
