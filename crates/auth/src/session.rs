//! Login and session lifecycle.
//!
//! Per username:
//!
//! ```text
//! NoSession --login--> Active(token) --logout | expiry--> NoSession
//!                      Active(token) --login--> Active(new token)
//! ```
//!
//! Resolving a token never extends its lifetime. Expired rows are not purged;
//! they are ignored at lookup and replaced on the next login.

use chrono::{DateTime, Duration, Utc};
use tracing::instrument;

use crate::password::{compare_passwords, DECOY_HASH};
use crate::store::AuthStore;
use crate::token::{generate_token, DEFAULT_TOKEN_SIZE};
use crate::{AuthError, Session, User};

/// Session lifetime and token size.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Maximum age of a session, measured from creation.
    pub timeout: Duration,
    /// Random bytes per token (before base64).
    pub token_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::hours(1),
            token_size: DEFAULT_TOKEN_SIZE,
        }
    }
}

/// Authentication engine: credential checks and session lifecycle over an [`AuthStore`].
///
/// Time is passed in explicitly so expiry is deterministic under test.
#[derive(Debug)]
pub struct SessionManager<S> {
    store: S,
    config: SessionConfig,
}

impl<S> SessionManager<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, SessionConfig::default())
    }

    pub fn with_config(store: S, config: SessionConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: AuthStore> SessionManager<S> {
    /// Verify a username/password pair and return the public user.
    #[instrument(skip(self, password))]
    pub fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let credentials = self.store.find_credentials(username)?;
        let hash = credentials
            .as_ref()
            .map_or(DECOY_HASH, |c| c.password_hash.as_str());
        let verified = compare_passwords(password, hash);

        match credentials {
            Some(credentials) if verified => Ok(credentials.into_user()),
            _ => {
                tracing::info!("login rejected");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Replace any session for `username` with a fresh one and return its token.
    ///
    /// The delete and the insert are separate store calls; two concurrent
    /// logins for one user can briefly leave two rows.
    #[instrument(skip(self, now))]
    pub fn create_session(&self, username: &str, now: DateTime<Utc>) -> Result<String, AuthError> {
        self.destroy_session(username)?;

        let token = generate_token(self.config.token_size);
        self.store.insert_session(&Session {
            username: username.to_string(),
            token: token.clone(),
            created: now,
        })?;

        tracing::debug!("session created");
        Ok(token)
    }

    /// Remove all sessions for `username`. Removing nothing is not an error.
    #[instrument(skip(self))]
    pub fn destroy_session(&self, username: &str) -> Result<(), AuthError> {
        let removed = self.store.delete_sessions(username)?;
        tracing::debug!(removed, "sessions destroyed");
        Ok(())
    }

    /// Resolve a token to its user, rejecting unknown and expired sessions.
    #[instrument(skip_all)]
    pub fn resolve_session(&self, token: &str, now: DateTime<Utc>) -> Result<User, AuthError> {
        let (session, user) = self
            .store
            .find_session(token)?
            .ok_or(AuthError::InvalidSession)?;

        if session.age(now) >= self.config.timeout {
            tracing::debug!(username = %session.username, "session expired");
            return Err(AuthError::InvalidSession);
        }

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::password::{fast_params, hash_password_with};
    use crate::{Credentials, InMemoryAuthStore};

    const USERNAME: &str = "__test";
    const PASSWORD: &str = "test";

    fn manager() -> SessionManager<Arc<InMemoryAuthStore>> {
        let store = Arc::new(InMemoryAuthStore::new());
        store
            .add_user(Credentials {
                username: USERNAME.to_string(),
                full_name: "Test User".to_string(),
                password_hash: hash_password_with(PASSWORD, fast_params()).unwrap(),
                administrator: false,
            })
            .unwrap();
        SessionManager::new(store)
    }

    #[test]
    fn login_returns_user_without_hash() {
        let auth = manager();
        let user = auth.login(USERNAME, PASSWORD).unwrap();
        assert_eq!(user.username, USERNAME);
        assert_eq!(user.full_name, "Test User");
        assert!(!user.administrator);
    }

    #[test]
    fn bad_password_and_unknown_user_fail_identically() {
        let auth = manager();
        let wrong_password = auth.login(USERNAME, "nope").unwrap_err();
        let unknown_user = auth.login("bad", "login").unwrap_err();

        assert_eq!(wrong_password, AuthError::InvalidCredentials);
        assert_eq!(wrong_password, unknown_user);
        assert_eq!(wrong_password.to_string(), "Incorrect username or password.");
    }

    #[test]
    fn session_resolves_to_logged_in_user() {
        let auth = manager();
        let now = Utc::now();
        let user = auth.login(USERNAME, PASSWORD).unwrap();
        let token = auth.create_session(USERNAME, now).unwrap();

        assert_eq!(auth.resolve_session(&token, now).unwrap(), user);
    }

    #[test]
    fn second_session_replaces_first() {
        let auth = manager();
        let now = Utc::now();
        let first = auth.create_session(USERNAME, now).unwrap();
        let second = auth.create_session(USERNAME, now).unwrap();

        assert_ne!(first, second);
        assert_eq!(auth.store().session_count(USERNAME), 1);
        assert_eq!(auth.resolve_session(&first, now).unwrap_err(), AuthError::InvalidSession);
        assert!(auth.resolve_session(&second, now).is_ok());
    }

    #[test]
    fn session_expires_after_timeout() {
        let auth = manager();
        let created = Utc::now();
        let token = auth.create_session(USERNAME, created).unwrap();

        let just_before = created + Duration::hours(1) - Duration::seconds(1);
        assert!(auth.resolve_session(&token, just_before).is_ok());

        let at_timeout = created + Duration::hours(1);
        assert_eq!(auth.resolve_session(&token, at_timeout).unwrap_err(), AuthError::InvalidSession);
    }

    #[test]
    fn resolving_does_not_extend_expiry() {
        let auth = manager();
        let created = Utc::now();
        let token = auth.create_session(USERNAME, created).unwrap();

        for minutes in [10, 30, 59] {
            assert!(auth.resolve_session(&token, created + Duration::minutes(minutes)).is_ok());
        }
        assert!(auth.resolve_session(&token, created + Duration::minutes(61)).is_err());
    }

    #[test]
    fn custom_timeout_is_honoured() {
        let store = Arc::new(InMemoryAuthStore::new());
        store
            .add_user(Credentials {
                username: "u".into(),
                full_name: "U".into(),
                password_hash: String::new(),
                administrator: false,
            })
            .unwrap();
        let auth = SessionManager::with_config(
            store,
            SessionConfig {
                timeout: Duration::seconds(5),
                token_size: 16,
            },
        );

        let now = Utc::now();
        let token = auth.create_session("u", now).unwrap();
        assert!(auth.resolve_session(&token, now + Duration::seconds(4)).is_ok());
        assert!(auth.resolve_session(&token, now + Duration::seconds(5)).is_err());
    }

    #[test]
    fn unknown_token_is_invalid() {
        let auth = manager();
        assert_eq!(
            auth.resolve_session("bad token", Utc::now()).unwrap_err(),
            AuthError::InvalidSession
        );
    }

    #[test]
    fn logout_destroys_session_and_is_idempotent() {
        let auth = manager();
        let now = Utc::now();
        let token = auth.create_session(USERNAME, now).unwrap();

        auth.destroy_session(USERNAME).unwrap();
        auth.destroy_session(USERNAME).unwrap();
        assert!(auth.resolve_session(&token, now).is_err());
        assert_eq!(auth.store().session_count(USERNAME), 0);
    }

    #[test]
    fn user_with_unparseable_hash_cannot_log_in() {
        let store = InMemoryAuthStore::new();
        store
            .add_user(Credentials {
                username: "legacy".into(),
                full_name: "Legacy".into(),
                password_hash: "$2b$12$notargon".into(),
                administrator: false,
            })
            .unwrap();
        let auth = SessionManager::new(store);
        assert_eq!(auth.login("legacy", "anything").unwrap_err(), AuthError::InvalidCredentials);
    }
}
