//! Feature request CRUD.
//!
//! Requests are ordered by client, then by the client's priority. Identifiers
//! are assigned by the server on create.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use featreq_auth::User;
use featreq_core::{Coercion, DispatchError, DispatchResult, Registration, Registry};

use super::rows;
use crate::app::SharedDatabase;

const ALL_REQUESTS: &str = "
    SELECT _id, title, description, client_id, client_priority,
           target_date, ticket_url, product_area_id
    FROM feature_request.feature_requests
    ORDER BY client_id, client_priority
";

const REQUESTS_FOR_CLIENT: &str = "
    SELECT _id, title, description, client_id, client_priority,
           target_date, ticket_url, product_area_id
    FROM feature_request.feature_requests
    WHERE client_id = $1
    ORDER BY client_priority
";

const INSERT_REQUEST: &str = "
    INSERT INTO feature_request.feature_requests
        (_id, title, description, client_id, client_priority,
         target_date, ticket_url, product_area_id)
    VALUES ($1::uuid, $2, $3, $4, $5, $6::date, $7, $8)
";

const UPDATE_REQUEST: &str = "
    UPDATE feature_request.feature_requests
    SET title = $2,
        description = $3,
        client_id = $4,
        client_priority = $5,
        target_date = $6::date,
        ticket_url = $7,
        product_area_id = $8
    WHERE _id = $1::uuid
";

const UPDATE_PRIORITY: &str = "
    UPDATE feature_request.feature_requests
    SET client_priority = $2
    WHERE _id = $1::uuid
";

const DELETE_REQUEST: &str = "
    DELETE FROM feature_request.feature_requests
    WHERE _id = $1::uuid
";

/// Writable fields of a feature request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRequestInput {
    pub title: String,
    pub description: String,
    pub client_id: i64,
    pub client_priority: i64,
    /// `YYYY-MM-DD`.
    pub target_date: NaiveDate,
    #[serde(default)]
    pub ticket_url: Option<String>,
    pub product_area_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRequest {
    pub _id: Uuid,
    #[serde(flatten)]
    pub fields: FeatureRequestInput,
}

#[derive(Debug, Deserialize)]
struct PriorityInput {
    client_priority: i64,
}

impl FeatureRequest {
    fn params(&self) -> Vec<JsonValue> {
        let f = &self.fields;
        vec![
            json!(self._id.to_string()),
            json!(f.title),
            json!(f.description),
            json!(f.client_id),
            json!(f.client_priority),
            json!(f.target_date.to_string()),
            json!(f.ticket_url),
            json!(f.product_area_id),
        ]
    }
}

fn parse<T: serde::de::DeserializeOwned>(payload: JsonValue) -> DispatchResult<T> {
    serde_json::from_value(payload).map_err(|e| DispatchError::bad_request(format!("invalid feature request: {e}")))
}

fn to_response<T: Serialize>(value: &T) -> DispatchResult<Option<JsonValue>> {
    serde_json::to_value(value).map(Some).map_err(DispatchError::internal)
}

fn id_arg(inv: &featreq_core::Invocation<User>) -> DispatchResult<Uuid> {
    inv.arg(0)?
        .as_uuid()
        .ok_or_else(|| DispatchError::internal("argument #0 is not a uuid"))
}

pub fn register(registry: &mut Registry<User>, db: SharedDatabase) {
    let list = db.clone();
    registry.register(Registration::retrieve("feature_requests", move |_| {
        rows(&*list, ALL_REQUESTS, &[])
    }));

    let for_client = db.clone();
    registry.register(
        Registration::retrieve("feature_requests", move |inv| {
            rows(&*for_client, REQUESTS_FOR_CLIENT, &[json!(inv.int(0)?)])
        })
        .param("client_id", Coercion::Integer),
    );

    let create = db.clone();
    registry.register(Registration::create("feature_requests", move |mut inv| {
        let request = FeatureRequest {
            _id: Uuid::now_v7(),
            fields: parse(inv.take_payload()?)?,
        };
        create.execute(INSERT_REQUEST, &request.params())?;
        tracing::info!(id = %request._id, client_id = request.fields.client_id, "feature request created");
        to_response(&request)
    }));

    let update = db.clone();
    registry.register(
        Registration::update("feature_requests", move |mut inv| {
            let request = FeatureRequest {
                _id: id_arg(&inv)?,
                fields: parse(inv.take_payload()?)?,
            };
            update.execute(UPDATE_REQUEST, &request.params())?;
            to_response(&request)
        })
        .param("_id", Coercion::Uuid),
    );

    let reprioritize = db.clone();
    registry.register(
        Registration::update("feature_requests_priority", move |mut inv| {
            let id = id_arg(&inv)?;
            let priority: PriorityInput = parse(inv.take_payload()?)?;
            reprioritize.execute(UPDATE_PRIORITY, &[json!(id.to_string()), json!(priority.client_priority)])?;
            Ok(Some(json!({ "_id": id, "client_priority": priority.client_priority })))
        })
        .param("_id", Coercion::Uuid),
    );

    registry.register(
        Registration::delete("feature_requests", move |inv| {
            let id = id_arg(&inv)?;
            let removed = db.execute(DELETE_REQUEST, &[json!(id.to_string())])?;
            tracing::info!(%id, removed, "feature request deleted");
            Ok(None)
        })
        .param("_id", Coercion::Uuid),
    );
}
