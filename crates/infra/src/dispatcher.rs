//! Request dispatch: routing plus authentication gating.
//!
//! ```text
//! (method, path, body?, token?)
//!   ↓
//! 1. Route: split path, parse verb, look up (verb, endpoint, arity)
//!   ↓
//! 2. Resolve token → user (unknown/expired token → anonymous)
//!   ↓
//! 3. Gate: requires-auth && anonymous → Authentication error, handler not called
//!   ↓
//! 4. Invoke: coerce args, attach payload/user, call, default {"status":"OK"}
//! ```
//!
//! The dispatcher holds no per-request state; the registry is read-only once
//! the dispatcher is built, so one instance can serve requests from many
//! threads.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use tracing::instrument;

use featreq_auth::{AuthError, AuthStore, SessionManager, User};
use featreq_core::{DispatchError, DispatchResult, Registry};

/// Name of the cookie that carries the session token.
pub const SESSION_COOKIE: &str = "session";

/// Routes decoded requests to registered handlers.
#[derive(Debug)]
pub struct Dispatcher<S> {
    registry: Arc<Registry<User>>,
    sessions: Arc<SessionManager<S>>,
}

impl<S> Clone for Dispatcher<S> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            sessions: self.sessions.clone(),
        }
    }
}

impl<S> Dispatcher<S> {
    /// Freeze `registry` and pair it with the session engine.
    pub fn new(registry: Registry<User>, sessions: Arc<SessionManager<S>>) -> Self {
        Self {
            registry: Arc::new(registry),
            sessions,
        }
    }

    pub fn registry(&self) -> &Registry<User> {
        &self.registry
    }

    pub fn sessions(&self) -> &Arc<SessionManager<S>> {
        &self.sessions
    }
}

impl<S: AuthStore> Dispatcher<S> {
    /// Handle one request at the current time.
    pub fn handle(
        &self,
        method: &str,
        path: &str,
        body: Option<&str>,
        session_token: Option<&str>,
    ) -> DispatchResult<JsonValue> {
        self.handle_at(method, path, body, session_token, Utc::now())
    }

    /// Handle one request, judging session expiry against `now`.
    #[instrument(skip(self, body, session_token, now), fields(anonymous = session_token.is_none()))]
    pub fn handle_at(
        &self,
        method: &str,
        path: &str,
        body: Option<&str>,
        session_token: Option<&str>,
        now: DateTime<Utc>,
    ) -> DispatchResult<JsonValue> {
        let (registration, route) = self.registry.route(method, path)?;

        let user = self.resolve_user(session_token, now)?;
        if registration.is_auth_required() && user.is_none() {
            tracing::debug!("rejected unauthenticated request");
            return Err(DispatchError::authentication("Authentication required."));
        }

        registration.invoke(&route.args, body, user)
    }

    /// Unknown and expired tokens are treated as anonymous; storage failures are not.
    fn resolve_user(&self, token: Option<&str>, now: DateTime<Utc>) -> DispatchResult<Option<User>> {
        let Some(token) = token else {
            return Ok(None);
        };

        match self.sessions.resolve_session(token, now) {
            Ok(user) => Ok(Some(user)),
            Err(AuthError::InvalidSession) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
