//! Authentication system
//!
//! Handles the user database and credential validation.

pub mod credentials;
pub mod validator;

pub use credentials::{ANONYMOUS_LOGIN, UserDatabase, UserRecord};
pub use validator::{validate_password, validate_user};
