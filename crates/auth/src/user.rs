//! Users, stored credentials, and session rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Public view of an account. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub full_name: String,
    pub administrator: bool,
}

/// A credential record as held by the store.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub full_name: String,
    pub password_hash: String,
    pub administrator: bool,
}

impl Credentials {
    /// Drop the hash, keeping only the public fields.
    pub fn into_user(self) -> User {
        User {
            username: self.username,
            full_name: self.full_name,
            administrator: self.administrator,
        }
    }
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("full_name", &self.full_name)
            .field("password_hash", &"<redacted>")
            .field("administrator", &self.administrator)
            .finish()
    }
}

/// A persisted login session.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub token: String,
    pub created: DateTime<Utc>,
}

impl Session {
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.created
    }
}

impl core::fmt::Debug for Session {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .field("created", &self.created)
            .finish()
    }
}
