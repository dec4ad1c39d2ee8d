use serde_json::{json, Value as JsonValue};

use featreq_auth::User;
use featreq_core::{Coercion, Registration, Registry};

use super::rows;
use crate::app::SharedDatabase;

const ALL_CLIENTS: &str = "
    SELECT _id, name
    FROM feature_request.clients
    ORDER BY _id
";

const ONE_CLIENT: &str = "
    SELECT _id, name
    FROM feature_request.clients
    WHERE _id = $1
";

pub fn register(registry: &mut Registry<User>, db: SharedDatabase) {
    let all = db.clone();
    registry.register(Registration::retrieve("clients", move |_| rows(&*all, ALL_CLIENTS, &[])));

    // An unknown id yields `null`.
    registry.register(
        Registration::retrieve("clients", move |inv| {
            let client = db.query_one(ONE_CLIENT, &[json!(inv.int(0)?)])?;
            Ok(Some(client.map(JsonValue::Object).unwrap_or(JsonValue::Null)))
        })
        .param("_id", Coercion::Integer),
    );
}
