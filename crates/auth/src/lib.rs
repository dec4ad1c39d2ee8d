//! `featreq-auth`: password verification and session lifecycle.
//!
//! This crate is decoupled from HTTP; storage is reached only through the
//! [`AuthStore`] port.

pub mod error;
pub mod password;
pub mod session;
pub mod store;
pub mod token;
pub mod user;

pub use error::AuthError;
pub use password::{compare_passwords, hash_password, hash_password_with};
pub use session::{SessionConfig, SessionManager};
pub use store::{AuthStore, InMemoryAuthStore};
pub use token::{generate_token, DEFAULT_TOKEN_SIZE};
pub use user::{Credentials, Session, User};
