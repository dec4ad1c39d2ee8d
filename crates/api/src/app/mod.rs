//! HTTP boundary.
//!
//! There is no per-route axum routing: a single fallback handler takes every
//! request, whatever its method, and hands the decoded
//! `(method, path, body, session cookie)` tuple to the [`Dispatcher`], which
//! owns routing and authentication.
//!
//! - `errors.rs`: `{"status":"ERR","message":..}` responses
//! - `routes/`: resource handlers, one file per endpoint family

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use encoding_rs::Encoding;
use serde_json::Value as JsonValue;

use featreq_auth::AuthStore;
use featreq_core::{DispatchError, DispatchResult, RoutePath};
use featreq_infra::db::Database;
use featreq_infra::{Dispatcher, SESSION_COOKIE};

pub mod errors;
pub mod routes;

pub type SharedDatabase = Arc<dyn Database>;
pub type SharedAuthStore = Arc<dyn AuthStore>;
pub type AppDispatcher = Dispatcher<SharedAuthStore>;

/// Build the HTTP router around a fully populated dispatcher.
pub fn build_app(dispatcher: AppDispatcher) -> Router {
    Router::new().fallback(handle).with_state(dispatcher)
}

async fn handle(
    State(dispatcher): State<AppDispatcher>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let decoded = decode_path(uri.path()).and_then(|path| Ok((path, decode_body(&headers, &body)?)));
    let (path, body) = match decoded {
        Ok(decoded) => decoded,
        Err(err) => return errors::dispatch_error_to_response(err),
    };
    let token = session_cookie(&headers);
    let method = method.as_str().to_string();

    // Handlers and the database adapter block; keep them off the async workers.
    let outcome = tokio::task::spawn_blocking({
        let (method, path) = (method.clone(), path.clone());
        move || dispatcher.handle(&method, &path, body.as_deref(), token.as_deref())
    })
    .await;

    match outcome {
        Ok(Ok(value)) => success(&method, &path, value),
        Ok(Err(err)) => errors::dispatch_error_to_response(err),
        Err(join) => errors::dispatch_error_to_response(DispatchError::internal(join)),
    }
}

fn success(method: &str, path: &str, value: JsonValue) -> Response {
    let cookie = if method.eq_ignore_ascii_case("POST") {
        match RoutePath::parse(path).endpoint {
            "login" => value
                .get("token")
                .and_then(JsonValue::as_str)
                .map(|token| format!("{SESSION_COOKIE}={token}; HttpOnly; Path=/")),
            "logout" => Some(format!("{SESSION_COOKIE}=; HttpOnly; Path=/; Max-Age=0")),
            _ => None,
        }
    } else {
        None
    };

    let mut response = (StatusCode::OK, Json(value)).into_response();
    if let Some(cookie) = cookie.and_then(|c| HeaderValue::from_str(&c).ok()) {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    response
}

/// Value of the `session` cookie, if the request carries a non-empty one.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

/// Percent-decode the request path before it is split into segments.
pub fn decode_path(raw: &str) -> DispatchResult<String> {
    urlencoding::decode(raw)
        .map(|path| path.into_owned())
        .map_err(|_| DispatchError::bad_request(format!("request path is not valid utf-8: '{raw}'")))
}

/// Decode the body with the charset named in `Content-Type`. An empty body is `None`.
///
/// Without a charset the bytes are read as ISO-8859-1, one char per byte. A
/// named charset is resolved by its WHATWG label.
pub fn decode_body(headers: &HeaderMap, bytes: &[u8]) -> DispatchResult<Option<String>> {
    if bytes.is_empty() {
        return Ok(None);
    }

    let label = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(charset_param);

    let Some(label) = label else {
        return Ok(Some(bytes.iter().map(|&b| char::from(b)).collect()));
    };

    let encoding = Encoding::for_label(label.as_bytes())
        .ok_or_else(|| DispatchError::bad_request(format!("unsupported charset '{label}'")))?;

    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(DispatchError::bad_request(format!(
            "request body is not valid {}",
            encoding.name()
        )));
    }
    Ok(Some(text.into_owned()))
}

fn charset_param(content_type: &str) -> Option<&str> {
    content_type
        .split(';')
        .skip(1)
        .filter_map(|param| param.trim().split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("charset"))
        .map(|(_, value)| value.trim().trim_matches('"'))
}
