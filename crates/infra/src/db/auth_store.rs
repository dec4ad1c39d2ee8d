//! [`AuthStore`] over the `feature_request.users` / `feature_request.sessions` tables.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use featreq_auth::{AuthStore, Credentials, Session, User};
use featreq_core::StoreError;

use super::{decode, Database};

const FIND_CREDENTIALS: &str = "
    SELECT username, full_name, password_hash, administrator
    FROM feature_request.users
    WHERE username = $1
";

const INSERT_SESSION: &str = "
    INSERT INTO feature_request.sessions (username, token, created)
    VALUES ($1, $2, $3::timestamptz)
";

const DELETE_SESSIONS: &str = "
    DELETE FROM feature_request.sessions
    WHERE username = $1
";

const FIND_SESSION: &str = "
    SELECT users.username, users.full_name, users.administrator,
           sessions.token, sessions.created
    FROM feature_request.sessions
    JOIN feature_request.users ON users.username = sessions.username
    WHERE sessions.token = $1
";

#[derive(Debug, Deserialize)]
struct SessionRow {
    username: String,
    full_name: String,
    administrator: bool,
    token: String,
    created: DateTime<Utc>,
}

/// SQL-backed credential and session store.
#[derive(Debug, Clone)]
pub struct SqlAuthStore<D> {
    db: D,
}

impl<D> SqlAuthStore<D> {
    pub fn new(db: D) -> Self {
        Self { db }
    }
}

impl<D: Database> AuthStore for SqlAuthStore<D> {
    fn find_credentials(&self, username: &str) -> Result<Option<Credentials>, StoreError> {
        self.db
            .query_one(FIND_CREDENTIALS, &[json!(username)])?
            .map(decode)
            .transpose()
    }

    fn insert_session(&self, session: &Session) -> Result<(), StoreError> {
        self.db.execute(
            INSERT_SESSION,
            &[
                json!(session.username),
                json!(session.token),
                json!(session.created.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    fn delete_sessions(&self, username: &str) -> Result<u64, StoreError> {
        self.db.execute(DELETE_SESSIONS, &[json!(username)])
    }

    fn find_session(&self, token: &str) -> Result<Option<(Session, User)>, StoreError> {
        let Some(row) = self.db.query_one(FIND_SESSION, &[json!(token)])? else {
            return Ok(None);
        };
        let row: SessionRow = decode(row)?;

        let session = Session {
            username: row.username.clone(),
            token: row.token,
            created: row.created,
        };
        let user = User {
            username: row.username,
            full_name: row.full_name,
            administrator: row.administrator,
        };
        Ok(Some((session, user)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;
    use featreq_auth::{hash_password_with, AuthError, SessionManager};

    use super::*;
    use crate::db::testing::ScriptedDatabase;

    fn store() -> (Arc<ScriptedDatabase>, SqlAuthStore<Arc<ScriptedDatabase>>) {
        let db = Arc::new(ScriptedDatabase::new());
        (db.clone(), SqlAuthStore::new(db))
    }

    #[test]
    fn credentials_are_fetched_by_username() {
        let (db, store) = store();
        db.push_rows(vec![json!({
            "username": "__test",
            "full_name": "Test User",
            "password_hash": "$argon2id$...",
            "administrator": false
        })]);

        let found = store.find_credentials("__test").unwrap().unwrap();
        assert_eq!(found.full_name, "Test User");

        let statements = db.statements();
        assert!(statements[0].0.contains("FROM feature_request.users WHERE username = $1"));
        assert_eq!(statements[0].1, vec![json!("__test")]);
    }

    #[test]
    fn missing_user_is_none() {
        let (_db, store) = store();
        assert!(store.find_credentials("nobody").unwrap().is_none());
    }

    #[test]
    fn session_row_is_split_into_session_and_user() {
        let (db, store) = store();
        db.push_rows(vec![json!({
            "username": "__test",
            "full_name": "Test User",
            "administrator": true,
            "token": "abc",
            "created": "2024-03-01T12:00:00.123456+00:00"
        })]);

        let (session, user) = store.find_session("abc").unwrap().unwrap();
        assert_eq!(session.token, "abc");
        assert_eq!(session.created.to_rfc3339(), "2024-03-01T12:00:00.123456+00:00");
        assert_eq!(user.username, "__test");
        assert!(user.administrator);
    }

    #[test]
    fn malformed_session_row_is_a_decode_error() {
        let (db, store) = store();
        db.push_rows(vec![json!({"username": "x", "created": "yesterday"})]);
        assert!(matches!(store.find_session("abc"), Err(StoreError::Decode(_))));
    }

    #[test]
    fn create_session_deletes_before_inserting() {
        let (db, store) = store();
        let auth = SessionManager::new(store);
        let now = Utc::now();

        let token = auth.create_session("__test", now).unwrap();

        let statements = db.statements();
        assert_eq!(statements.len(), 2);
        assert!(statements[0].0.starts_with("DELETE FROM feature_request.sessions"));
        assert!(statements[1].0.starts_with("INSERT INTO feature_request.sessions"));
        assert_eq!(
            statements[1].1,
            vec![json!("__test"), json!(token), json!(now.to_rfc3339())]
        );
    }

    #[test]
    fn expired_row_from_storage_is_rejected() {
        let (db, store) = store();
        let auth = SessionManager::new(store);
        let created = Utc::now() - Duration::hours(2);
        db.push_rows(vec![json!({
            "username": "__test",
            "full_name": "Test User",
            "administrator": false,
            "token": "abc",
            "created": created.to_rfc3339()
        })]);

        assert_eq!(
            auth.resolve_session("abc", Utc::now()).unwrap_err(),
            AuthError::InvalidSession
        );
    }

    #[test]
    fn login_verifies_against_stored_hash() {
        let (db, store) = store();
        let params = argon2_test_params();
        let hash = hash_password_with("test", params).unwrap();
        db.push_rows(vec![json!({
            "username": "__test",
            "full_name": "Test User",
            "password_hash": hash,
            "administrator": false
        })]);

        let auth = SessionManager::new(store);
        let user = auth.login("__test", "test").unwrap();
        assert_eq!(user.username, "__test");
    }

    fn argon2_test_params() -> argon2::Params {
        argon2::Params::new(1024, 1, 1, None).unwrap()
    }
}
