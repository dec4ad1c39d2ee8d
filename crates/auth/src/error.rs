use thiserror::Error;

use featreq_core::{DispatchError, StoreError};

/// Authentication failure.
///
/// Credential failures are deliberately vague: the message never says whether
/// the username or the password was wrong.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Incorrect username or password.")]
    InvalidCredentials,

    #[error("Username and password are required!")]
    MissingCredentials,

    /// Unknown, expired, or absent session token.
    #[error("Invalid session token.")]
    InvalidSession,

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthError {
    /// True for failures the caller should see as 401 rather than 500.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials | AuthError::MissingCredentials | AuthError::InvalidSession
        )
    }
}

impl From<AuthError> for DispatchError {
    fn from(value: AuthError) -> Self {
        if value.is_rejection() {
            return DispatchError::authentication(value.to_string());
        }
        match value {
            AuthError::Store(e) => e.into(),
            other => DispatchError::internal(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_map_to_authentication_errors() {
        for err in [
            AuthError::InvalidCredentials,
            AuthError::MissingCredentials,
            AuthError::InvalidSession,
        ] {
            assert!(err.is_rejection());
            let message = err.to_string();
            let dispatch: DispatchError = err.into();
            assert_eq!(dispatch.status().code(), 401);
            assert_eq!(dispatch.to_string(), message);
        }
    }

    #[test]
    fn store_failures_stay_internal() {
        let err = AuthError::from(StoreError::backend("down"));
        assert!(!err.is_rejection());
        let dispatch: DispatchError = err.into();
        assert_eq!(dispatch.status().code(), 500);
    }

    #[test]
    fn hash_failures_are_internal_with_their_text() {
        let err = AuthError::Hash("salt too short".into());
        assert!(!err.is_rejection());
        let dispatch: DispatchError = err.into();
        assert_eq!(dispatch.status().code(), 500);
        assert_eq!(dispatch.to_string(), "password hashing failed: salt too short");
    }
}
