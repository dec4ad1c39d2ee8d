use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use featreq_core::DispatchError;

/// Map a dispatch failure to its status and `{"status":"ERR","message":..}` body.
///
/// Internal errors surface their text as the message.
pub fn dispatch_error_to_response(err: DispatchError) -> axum::response::Response {
    let status = StatusCode::from_u16(err.status().code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if status.is_server_error() {
        tracing::error!(error = %err, "request failed");
    } else {
        tracing::debug!(%status, error = %err, "request rejected");
    }

    json_error(status, err.to_string())
}

pub fn json_error(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "status": "ERR",
            "message": message.into(),
        })),
    )
        .into_response()
}
