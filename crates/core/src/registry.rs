//! Handler registry keyed by (verb, endpoint, arity).
//!
//! Registrations are made with explicit calls during startup. Once the registry
//! is shared (typically behind an `Arc`) it is only ever read, so lookups need
//! no locking.
//!
//! ```text
//! "/feature_requests/7"
//!   ↓ split
//! endpoint = "feature_requests", args = ["7"]
//!   ↓ lookup (GET, "feature_requests", 1)
//! Registration { params: [client_id: Integer], .. }
//!   ↓ coerce
//! [Arg::Int(7)] + payload? + user?
//!   ↓ invoke
//! handler result, or {"status":"OK"} when it returns nothing
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::arg::{Arg, Coercion};
use crate::error::{DispatchError, DispatchResult};
use crate::method::Method;

/// What a handler returns: a JSON value to serialize, or nothing.
pub type HandlerResult = DispatchResult<Option<JsonValue>>;

/// Type-erased handler. `U` is the resolved user type.
pub type Handler<U> = Arc<dyn Fn(Invocation<U>) -> HandlerResult + Send + Sync>;

/// Canonical acknowledgement for handlers that return nothing.
pub fn ok_ack() -> JsonValue {
    serde_json::json!({ "status": "OK" })
}

/// Non-positional inputs a registration may ask for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Special {
    /// The request body, parsed as a JSON document.
    Payload,
    /// The user resolved from the session token (possibly absent).
    User,
}

/// A declared positional parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub coercion: Coercion,
}

/// Everything a handler receives for one call.
#[derive(Debug, Clone)]
pub struct Invocation<U> {
    pub args: Vec<Arg>,
    pub payload: Option<JsonValue>,
    pub user: Option<U>,
}

impl<U> Invocation<U> {
    pub fn arg(&self, idx: usize) -> DispatchResult<&Arg> {
        self.args
            .get(idx)
            .ok_or_else(|| DispatchError::internal(format!("missing argument #{idx}")))
    }

    pub fn int(&self, idx: usize) -> DispatchResult<i64> {
        self.arg(idx)?
            .as_int()
            .ok_or_else(|| DispatchError::internal(format!("argument #{idx} is not an integer")))
    }

    pub fn text(&self, idx: usize) -> DispatchResult<&str> {
        self.arg(idx)?
            .as_str()
            .ok_or_else(|| DispatchError::internal(format!("argument #{idx} is not text")))
    }

    pub fn payload(&self) -> DispatchResult<&JsonValue> {
        self.payload
            .as_ref()
            .ok_or_else(|| DispatchError::internal("handler did not declare a payload"))
    }

    pub fn take_payload(&mut self) -> DispatchResult<JsonValue> {
        self.payload
            .take()
            .ok_or_else(|| DispatchError::internal("handler did not declare a payload"))
    }

    /// The resolved user, or an authentication error when the request was anonymous.
    pub fn require_user(&self) -> DispatchResult<&U> {
        self.user
            .as_ref()
            .ok_or_else(|| DispatchError::authentication("Authentication required."))
    }
}

/// A handler bound to (verb, endpoint, arity) with its calling contract.
pub struct Registration<U> {
    method: Method,
    endpoint: String,
    params: Vec<Param>,
    specials: Vec<Special>,
    requires_auth: bool,
    handler: Handler<U>,
}

impl<U> Registration<U> {
    /// New registration with no parameters, no specials, and authentication required.
    pub fn new<F>(method: Method, endpoint: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Invocation<U>) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            method,
            endpoint: endpoint.into(),
            params: Vec::new(),
            specials: Vec::new(),
            requires_auth: true,
            handler: Arc::new(handler),
        }
    }

    pub fn create<F>(endpoint: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Invocation<U>) -> HandlerResult + Send + Sync + 'static,
    {
        Self::new(Method::Post, endpoint, handler).payload()
    }

    pub fn retrieve<F>(endpoint: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Invocation<U>) -> HandlerResult + Send + Sync + 'static,
    {
        Self::new(Method::Get, endpoint, handler)
    }

    pub fn update<F>(endpoint: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Invocation<U>) -> HandlerResult + Send + Sync + 'static,
    {
        Self::new(Method::Put, endpoint, handler).payload()
    }

    pub fn delete<F>(endpoint: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Invocation<U>) -> HandlerResult + Send + Sync + 'static,
    {
        Self::new(Method::Delete, endpoint, handler)
    }

    /// Declare the next positional parameter. Arity grows by one.
    pub fn param(mut self, name: impl Into<String>, coercion: Coercion) -> Self {
        self.params.push(Param {
            name: name.into(),
            coercion,
        });
        self
    }

    pub fn payload(self) -> Self {
        self.special(Special::Payload)
    }

    pub fn user(self) -> Self {
        self.special(Special::User)
    }

    fn special(mut self, special: Special) -> Self {
        if !self.specials.contains(&special) {
            self.specials.push(special);
        }
        self
    }

    pub fn requires_auth(mut self, required: bool) -> Self {
        self.requires_auth = required;
        self
    }

    /// Shorthand for `requires_auth(false)`.
    pub fn public(self) -> Self {
        self.requires_auth(false)
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn accepts(&self, special: Special) -> bool {
        self.specials.contains(&special)
    }

    pub fn is_auth_required(&self) -> bool {
        self.requires_auth
    }

    fn key(&self) -> RouteKey {
        RouteKey {
            method: self.method,
            endpoint: self.endpoint.clone(),
            arity: self.params.len(),
        }
    }

    /// Coerce arguments positionally by declared parameter order.
    pub fn coerce(&self, raw: &[&str]) -> DispatchResult<Vec<Arg>> {
        if raw.len() != self.params.len() {
            return Err(DispatchError::internal(format!(
                "expected {} arguments, got {}",
                self.params.len(),
                raw.len()
            )));
        }

        self.params
            .iter()
            .zip(raw)
            .map(|(param, value)| param.coercion.apply(&param.name, value))
            .collect()
    }

    /// Coerce, attach specials, call the handler, and substitute the default
    /// acknowledgement when it returns nothing.
    ///
    /// Authentication gating is the caller's job; `user` is passed as given.
    pub fn invoke(&self, raw_args: &[&str], body: Option<&str>, user: Option<U>) -> DispatchResult<JsonValue> {
        let args = self.coerce(raw_args)?;

        let payload = if self.accepts(Special::Payload) {
            Some(parse_payload(body)?)
        } else {
            None
        };

        let user = if self.accepts(Special::User) { user } else { None };

        let response = (self.handler)(Invocation { args, payload, user })?;
        Ok(response.unwrap_or_else(ok_ack))
    }
}

impl<U> core::fmt::Debug for Registration<U> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Registration")
            .field("method", &self.method)
            .field("endpoint", &self.endpoint)
            .field("params", &self.params)
            .field("specials", &self.specials)
            .field("requires_auth", &self.requires_auth)
            .finish_non_exhaustive()
    }
}

fn parse_payload(body: Option<&str>) -> DispatchResult<JsonValue> {
    let body = body.unwrap_or_default();
    serde_json::from_str(body)
        .map_err(|e| DispatchError::bad_request(format!("request body is not a JSON document: {e}")))
}

/// A request path split into its endpoint name and ordinal argument strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePath<'a> {
    pub endpoint: &'a str,
    pub args: Vec<&'a str>,
}

impl<'a> RoutePath<'a> {
    /// Split on `/`, dropping the (empty) segment before the endpoint name.
    ///
    /// `"/foo/1/2"` → endpoint `"foo"`, args `["1", "2"]`. Trailing slashes are
    /// significant: `"/foo/"` has one empty argument.
    pub fn parse(path: &'a str) -> Self {
        let mut segments = path.split('/');
        segments.next();
        let endpoint = segments.next().unwrap_or_default();
        Self {
            endpoint,
            args: segments.collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RouteKey {
    method: Method,
    endpoint: String,
    arity: usize,
}

/// Lookup table of registrations.
pub struct Registry<U> {
    routes: HashMap<RouteKey, Registration<U>>,
}

impl<U> Registry<U> {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    /// Store a registration. A registration with the same (verb, endpoint,
    /// arity) is replaced: last registration wins.
    pub fn register(&mut self, registration: Registration<U>) {
        let key = registration.key();
        let (method, arity) = (key.method, key.arity);
        let endpoint = key.endpoint.clone();

        if self.routes.insert(key, registration).is_some() {
            tracing::debug!(%method, %endpoint, arity, "registration replaced an existing handler");
        }
    }

    pub fn lookup(&self, method: Method, endpoint: &str, arity: usize) -> Option<&Registration<U>> {
        self.routes.get(&RouteKey {
            method,
            endpoint: endpoint.to_string(),
            arity,
        })
    }

    /// Resolve a raw verb + path to its registration and argument strings.
    pub fn route<'p>(&self, method: &str, path: &'p str) -> DispatchResult<(&Registration<U>, RoutePath<'p>)> {
        let route = RoutePath::parse(path);
        let method: Method = method.parse()?;

        let registration = self
            .lookup(method, route.endpoint, route.args.len())
            .ok_or_else(|| DispatchError::NotFound(path.to_string()))?;

        Ok((registration, route))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<U> Default for Registry<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U> core::fmt::Debug for Registry<U> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.routes.values()).finish()
    }
}
