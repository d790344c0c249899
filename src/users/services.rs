use lazy_static::lazy_static;
use regex::Regex;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::users::password;
use crate::users::repo_types::{NewUser, User};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Validate signup data and hash the password, returning a pending record.
///
/// Nothing is persisted here: uniqueness of username and email is only
/// checked when the record is inserted, so callers must be prepared for
/// `DuplicateKey` from [`NewUser::insert`] rather than from this call.
/// A missing (empty) password fails immediately with `MissingPassword`.
pub fn signup(
    username: &str,
    email: &str,
    password: &str,
    image_url: Option<&str>,
) -> Result<NewUser> {
    if password.is_empty() {
        warn!(username, "signup without password");
        return Err(Error::MissingPassword);
    }

    let email = email.trim().to_lowercase();
    if !is_valid_email(&email) {
        warn!(username, email = %email, "signup with invalid email");
        return Err(Error::validation("invalid email address"));
    }

    let password_hash = password::hash(password)?;
    Ok(NewUser {
        username: username.to_string(),
        email,
        password_hash,
        image_url: image_url.map(|u| u.to_string()),
    })
}

/// Look up by username and check the password. Unknown username and wrong
/// password both come back as `Ok(None)` so the caller cannot tell which
/// usernames exist.
pub async fn authenticate(
    db: &SqlitePool,
    username: &str,
    password: &str,
) -> Result<Option<User>> {
    let Some(user) = User::find_by_username(db, username).await? else {
        debug!(username, "authenticate: unknown username");
        return Ok(None);
    };

    if password::verify(password, &user.password_hash)? {
        debug!(user_id = user.id, "authenticate: ok");
        Ok(Some(user))
    } else {
        debug!(user_id = user.id, "authenticate: password mismatch");
        Ok(None)
    }
}
