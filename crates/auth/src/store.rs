//! Storage port for credentials and sessions.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use featreq_core::StoreError;

use crate::{Credentials, Session, User};

/// Credential and session persistence as seen by the authentication engine.
///
/// Implementations are autocommit: each call stands alone, and nothing here
/// groups calls into a transaction.
pub trait AuthStore: Send + Sync {
    /// Credential record for `username`, hash included.
    fn find_credentials(&self, username: &str) -> Result<Option<Credentials>, StoreError>;

    fn insert_session(&self, session: &Session) -> Result<(), StoreError>;

    /// Remove every session row for `username`; returns how many were removed.
    fn delete_sessions(&self, username: &str) -> Result<u64, StoreError>;

    /// Session row for `token`, joined with its user's public fields.
    fn find_session(&self, token: &str) -> Result<Option<(Session, User)>, StoreError>;
}

impl<S> AuthStore for Arc<S>
where
    S: AuthStore + ?Sized,
{
    fn find_credentials(&self, username: &str) -> Result<Option<Credentials>, StoreError> {
        (**self).find_credentials(username)
    }

    fn insert_session(&self, session: &Session) -> Result<(), StoreError> {
        (**self).insert_session(session)
    }

    fn delete_sessions(&self, username: &str) -> Result<u64, StoreError> {
        (**self).delete_sessions(username)
    }

    fn find_session(&self, token: &str) -> Result<Option<(Session, User)>, StoreError> {
        (**self).find_session(token)
    }
}

/// In-memory credential/session store for tests and local development.
///
/// Like the SQL schema, nothing stops two session rows for one username; the
/// one-session rule is enforced by the session engine.
#[derive(Debug, Default)]
pub struct InMemoryAuthStore {
    users: RwLock<HashMap<String, Credentials>>,
    sessions: RwLock<Vec<Session>>,
}

impl InMemoryAuthStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a credential record.
    pub fn add_user(&self, credentials: Credentials) -> Result<(), StoreError> {
        let mut users = self.users.write().map_err(|_| poisoned())?;
        users.insert(credentials.username.clone(), credentials);
        Ok(())
    }

    /// Number of session rows currently held for `username`.
    pub fn session_count(&self, username: &str) -> usize {
        self.sessions
            .read()
            .map(|sessions| sessions.iter().filter(|s| s.username == username).count())
            .unwrap_or(0)
    }
}

fn poisoned() -> StoreError {
    StoreError::backend("lock poisoned")
}

impl AuthStore for InMemoryAuthStore {
    fn find_credentials(&self, username: &str) -> Result<Option<Credentials>, StoreError> {
        let users = self.users.read().map_err(|_| poisoned())?;
        Ok(users.get(username).cloned())
    }

    fn insert_session(&self, session: &Session) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().map_err(|_| poisoned())?;
        sessions.push(session.clone());
        Ok(())
    }

    fn delete_sessions(&self, username: &str) -> Result<u64, StoreError> {
        let mut sessions = self.sessions.write().map_err(|_| poisoned())?;
        let before = sessions.len();
        sessions.retain(|s| s.username != username);
        Ok((before - sessions.len()) as u64)
    }

    fn find_session(&self, token: &str) -> Result<Option<(Session, User)>, StoreError> {
        let sessions = self.sessions.read().map_err(|_| poisoned())?;
        let Some(session) = sessions.iter().find(|s| s.token == token).cloned() else {
            return Ok(None);
        };
        drop(sessions);

        let users = self.users.read().map_err(|_| poisoned())?;
        Ok(users
            .get(&session.username)
            .cloned()
            .map(|credentials| (session, credentials.into_user())))
    }
}
