//! `POST /login` and `POST /logout`.

use chrono::Utc;
use serde_json::Value as JsonValue;

use featreq_auth::{AuthError, User};
use featreq_core::{DispatchError, Method, Registration, Registry};

use super::SharedSessions;

pub fn register(registry: &mut Registry<User>, sessions: SharedSessions) {
    let login_sessions = sessions.clone();
    registry.register(
        Registration::create("login", move |inv| {
            let payload = inv.payload()?;
            let (Some(username), Some(password)) = (field(payload, "username"), field(payload, "password")) else {
                return Err(AuthError::MissingCredentials.into());
            };

            let user = login_sessions.login(username, password)?;
            let token = login_sessions.create_session(&user.username, Utc::now())?;

            let mut response = serde_json::to_value(&user).map_err(DispatchError::internal)?;
            if let Some(fields) = response.as_object_mut() {
                fields.insert("token".to_string(), JsonValue::String(token));
            }
            Ok(Some(response))
        })
        .public(),
    );

    registry.register(
        Registration::new(Method::Post, "logout", move |inv: featreq_core::Invocation<User>| {
            sessions.destroy_session(&inv.require_user()?.username)?;
            Ok(None)
        })
        .user(),
    );
}

/// A non-empty string field; anything else counts as missing.
fn field<'a>(payload: &'a JsonValue, name: &str) -> Option<&'a str> {
    payload
        .get(name)
        .and_then(JsonValue::as_str)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use argon2::Params;
    use chrono::Utc;
    use featreq_auth::{hash_password_with, Credentials, InMemoryAuthStore, SessionManager};
    use serde_json::json;

    use super::*;
    use crate::app::SharedAuthStore;

    fn setup() -> (Registry<User>, Arc<InMemoryAuthStore>, SharedSessions) {
        let store = Arc::new(InMemoryAuthStore::new());
        store
            .add_user(Credentials {
                username: "__test".into(),
                full_name: "Test User".into(),
                password_hash: hash_password_with("secret", Params::new(1024, 1, 1, None).unwrap()).unwrap(),
                administrator: true,
            })
            .unwrap();

        let shared: SharedAuthStore = store.clone();
        let sessions = Arc::new(SessionManager::new(shared));
        let mut registry = Registry::new();
        register(&mut registry, sessions.clone());
        (registry, store, sessions)
    }

    #[test]
    fn login_returns_user_with_token_and_no_hash() {
        let (registry, store, sessions) = setup();
        let reg = registry.lookup(Method::Post, "login", 0).unwrap();

        let response = reg
            .invoke(&[], Some(r#"{"username": "__test", "password": "secret"}"#), None)
            .unwrap();

        assert_eq!(response["username"], "__test");
        assert_eq!(response["full_name"], "Test User");
        assert_eq!(response["administrator"], true);
        assert!(response.get("password_hash").is_none());

        let token = response["token"].as_str().unwrap();
        assert_eq!(sessions.resolve_session(token, Utc::now()).unwrap().username, "__test");
        assert_eq!(store.session_count("__test"), 1);
    }

    #[test]
    fn missing_fields_are_rejected_before_lookup() {
        let (registry, ..) = setup();
        let reg = registry.lookup(Method::Post, "login", 0).unwrap();

        for body in [r#"{}"#, r#"{"username": "__test"}"#, r#"{"username": "", "password": "secret"}"#, "[]"] {
            let err = reg.invoke(&[], Some(body), None).unwrap_err();
            assert_eq!(err.status().code(), 401);
            assert_eq!(err.to_string(), "Username and password are required!");
        }
    }

    #[test]
    fn wrong_password_and_unknown_user_fail_identically() {
        let (registry, ..) = setup();
        let reg = registry.lookup(Method::Post, "login", 0).unwrap();

        let wrong = reg
            .invoke(&[], Some(r#"{"username": "__test", "password": "nope"}"#), None)
            .unwrap_err();
        let unknown = reg
            .invoke(&[], Some(r#"{"username": "__nobody", "password": "secret"}"#), None)
            .unwrap_err();

        assert_eq!(wrong.status().code(), 401);
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[test]
    fn logout_destroys_the_session() {
        let (registry, store, sessions) = setup();
        let token = sessions.create_session("__test", Utc::now()).unwrap();
        let user = sessions.resolve_session(&token, Utc::now()).unwrap();

        let reg = registry.lookup(Method::Post, "logout", 0).unwrap();
        assert_eq!(reg.invoke(&[], None, Some(user)).unwrap(), json!({"status": "OK"}));

        assert_eq!(store.session_count("__test"), 0);
        assert!(sessions.resolve_session(&token, Utc::now()).is_err());
    }
}
