//! Authentication validator
//!
//! Checks USER and PASS arguments against the user database.

use super::credentials::{UserDatabase, UserRecord};
use crate::error::AuthError;

/// Longest login or password accepted on the control channel.
pub const MAX_CREDENTIAL_LENGTH: usize = 128;

/// Performs basic input sanitation on logins and passwords.
fn is_valid_input(input: &str) -> bool {
    input.len() <= MAX_CREDENTIAL_LENGTH && !input.contains(['\r', '\n', '\0'])
}

/// Looks up the login in the user database.
///
/// Logins failing sanitation are reported as unknown; only a blank login is
/// malformed.
pub fn validate_user<'a>(
    users: &'a UserDatabase,
    login: &str,
) -> Result<&'a UserRecord, AuthError> {
    if login.trim().is_empty() {
        return Err(AuthError::MalformedInput("Invalid username format".into()));
    }

    if !is_valid_input(login) {
        return Err(AuthError::UnknownUser(login.to_string()));
    }

    users
        .get(login)
        .ok_or_else(|| AuthError::UnknownUser(login.to_string()))
}

/// Checks the submitted password for a pending login.
pub fn validate_password(record: &UserRecord, password: &str) -> Result<(), AuthError> {
    if is_valid_input(password) && record.accepts(password) {
        Ok(())
    } else {
        Err(AuthError::InvalidPassword(record.login().to_string()))
    }
}
