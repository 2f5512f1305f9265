/// Password Hashing and Verification
///
/// Passwords are stored only as bcrypt hashes. Strength rules apply to new
/// passwords at registration, never at login.

use actix_web::web;
use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::{AppError, ValidationError};

const MIN_PASSWORD_LENGTH: usize = 8;
// bcrypt only looks at the first 72 bytes
const MAX_PASSWORD_LENGTH: usize = 72;

/// Hash a password using bcrypt
///
/// # Errors
/// Returns error if bcrypt hashing fails
pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its hash
///
/// # Errors
/// Returns error if the stored hash is malformed
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
}

/// [`hash_password`] on the blocking thread pool; bcrypt is CPU-bound.
pub async fn hash_password_blocking(password: String) -> Result<String, AppError> {
    web::block(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
}

/// [`verify_password`] on the blocking thread pool.
pub async fn verify_password_blocking(password: String, hash: String) -> Result<bool, AppError> {
    web::block(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?
}

/// Validate password strength requirements
///
/// Requirements:
/// - 8 to 72 bytes
/// - At least one digit
/// - At least one lowercase letter
/// - At least one uppercase letter
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort("password", MIN_PASSWORD_LENGTH));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong("password", MAX_PASSWORD_LENGTH));
    }

    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_lowercase = password.chars().any(|c| c.is_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_uppercase());

    if !has_digit || !has_lowercase || !has_uppercase {
        return Err(ValidationError::WeakPassword);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let password = "ValidPassword123";
        let hash = hash_password(password).expect("Failed to hash password");

        assert_ne!(password, hash);
        assert!(hash.starts_with("$2"));
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_password("ValidPassword123").unwrap();
        let second = hash_password("ValidPassword123").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("ValidPassword123").expect("Failed to hash password");

        assert!(verify_password("ValidPassword123", &hash).unwrap());
        assert!(!verify_password("WrongPassword123", &hash).unwrap());
    }

    #[tokio::test]
    async fn test_blocking_variants_agree() {
        let hash = hash_password_blocking("ValidPassword123".to_string())
            .await
            .unwrap();

        assert!(verify_password_blocking("ValidPassword123".to_string(), hash.clone())
            .await
            .unwrap());
        assert!(!verify_password_blocking("WrongPassword123".to_string(), hash)
            .await
            .unwrap());
    }

    #[test]
    fn test_verify_against_malformed_hash() {
        assert!(verify_password("testpassword", "testpassword").is_err());
    }

    #[test]
    fn test_password_strength() {
        assert!(validate_password_strength("ValidPassword123").is_ok());
        assert_eq!(
            validate_password_strength("Short1"),
            Err(ValidationError::TooShort("password", MIN_PASSWORD_LENGTH))
        );
        assert!(validate_password_strength(&("A1".to_string() + &"a".repeat(71))).is_err());
        assert_eq!(
            validate_password_strength("NoDigitsPassword"),
            Err(ValidationError::WeakPassword)
        );
        assert!(validate_password_strength("NOLOWERCASE1").is_err());
        assert!(validate_password_strength("nouppercase1").is_err());
    }
}
