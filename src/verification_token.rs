use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use sha2::{Digest, Sha256};

const TOKEN_LENGTH: usize = 64;

/// Email verification token
///
/// The plaintext goes out in the verification link; only the SHA-256
/// digest is stored.
#[derive(Clone, Debug)]
pub struct VerificationToken {
    token: String,
}

impl VerificationToken {
    pub fn generate() -> Self {
        let token = thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LENGTH)
            .map(char::from)
            .collect();

        Self { token }
    }

    pub fn as_str(&self) -> &str {
        &self.token
    }

    pub fn digest(&self) -> String {
        digest(&self.token)
    }
}

/// SHA-256 hex digest of a token
pub fn digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Compare a presented token against a stored digest.
pub fn matches_digest(token: &str, stored_digest: &str) -> bool {
    // constant-time over the hex digests
    let presented = digest(token);
    presented.len() == stored_digest.len()
        && presented
            .bytes()
            .zip(stored_digest.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}
