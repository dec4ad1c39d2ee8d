//! Resource endpoints, registered explicitly at startup.

use std::sync::Arc;

use serde_json::Value as JsonValue;

use featreq_auth::{SessionManager, User};
use featreq_core::{HandlerResult, Registry};
use featreq_infra::db::Database;

use super::{SharedAuthStore, SharedDatabase};

pub mod clients;
pub mod feature_requests;
pub mod login;
pub mod product_areas;

pub type SharedSessions = Arc<SessionManager<SharedAuthStore>>;

/// Register every endpoint the server exposes.
pub fn register_all(registry: &mut Registry<User>, db: SharedDatabase, sessions: SharedSessions) {
    login::register(registry, sessions);
    clients::register(registry, db.clone());
    product_areas::register(registry, db.clone());
    feature_requests::register(registry, db);
}

/// Run `sql` and return every row as a JSON array.
pub(crate) fn rows(db: &dyn Database, sql: &str, params: &[JsonValue]) -> HandlerResult {
    let rows = db
        .query(sql, params)?
        .into_iter()
        .map(JsonValue::Object)
        .collect();
    Ok(Some(JsonValue::Array(rows)))
}
