use crate::auth::password::verify_password_blocking;
use crate::error::AppError;
use crate::users::{User, UserStore};

/// bcrypt hash (cost 12, same as new accounts) checked when the username is
/// unknown, so both outcomes cost one verify.
const DUMMY_PASSWORD_HASH: &str =
    "$2b$12$DiMeYkkDRz6HiKc7g4yfeO94nfka0T450kpFGIl.9jEmQfnnMIaI.";

/// Check a username/password pair against the store.
///
/// Returns `Ok(None)` both for an unknown username and for a wrong
/// password; deciding how to report that is up to the caller.
///
/// # Errors
/// Store failures and malformed stored hashes.
pub async fn authenticate(
    users: &dyn UserStore,
    username: &str,
    password: &str,
) -> Result<Option<User>, AppError> {
    let user = users.find_by_username(username).await?;
    let stored_hash = stored_hash_or_dummy(user.as_ref()).to_string();
    let matches = verify_password_blocking(password.to_string(), stored_hash).await?;

    match user {
        Some(user) if matches => Ok(Some(user)),
        Some(user) => {
            tracing::debug!(user_id = %user.id, "Login attempt with wrong password");
            Ok(None)
        }
        None => {
            tracing::debug!("Login attempt for unknown username");
            Ok(None)
        }
    }
}

fn stored_hash_or_dummy(user: Option<&User>) -> &str {
    user.map_or(DUMMY_PASSWORD_HASH, |u| u.password_hash.as_str())
}
