//! Dispatch error model.

use thiserror::Error;

/// Result type returned by handlers and by the dispatch pipeline.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// HTTP-facing status class of a failure.
///
/// The core never speaks HTTP itself; this is the label the boundary maps to a
/// wire status.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Status {
    BadRequest,
    Unauthorized,
    NotFound,
    MethodNotAllowed,
    InternalServerError,
}

impl Status {
    pub fn code(self) -> u16 {
        match self {
            Status::BadRequest => 400,
            Status::Unauthorized => 401,
            Status::NotFound => 404,
            Status::MethodNotAllowed => 405,
            Status::InternalServerError => 500,
        }
    }

    /// Full status line label, e.g. `"404 Not Found"`.
    pub fn label(self) -> &'static str {
        match self {
            Status::BadRequest => "400 Bad Request",
            Status::Unauthorized => "401 Unauthorized",
            Status::NotFound => "404 Not Found",
            Status::MethodNotAllowed => "405 Method Not Allowed",
            Status::InternalServerError => "500 Internal Server Error",
        }
    }
}

impl core::fmt::Display for Status {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// Failure while routing or executing a request.
///
/// Every variant is terminal for the current request only.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The verb is not one of the supported HTTP methods.
    #[error("Unknown method '{0}'")]
    MethodNotAllowed(String),

    /// No registration matches (verb, endpoint, arity).
    #[error("Unknown path '{0}'")]
    NotFound(String),

    /// A path argument could not be coerced, or the payload is not a JSON document.
    #[error("{0}")]
    BadRequest(String),

    /// Missing, invalid or expired credentials.
    #[error("{0}")]
    Authentication(String),

    /// Anything else. The message is surfaced verbatim at the boundary.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl DispatchError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    pub fn internal(msg: impl core::fmt::Display) -> Self {
        Self::Internal(anyhow::anyhow!("{msg}"))
    }

    pub fn status(&self) -> Status {
        match self {
            DispatchError::MethodNotAllowed(_) => Status::MethodNotAllowed,
            DispatchError::NotFound(_) => Status::NotFound,
            DispatchError::BadRequest(_) => Status::BadRequest,
            DispatchError::Authentication(_) => Status::Unauthorized,
            DispatchError::Internal(_) => Status::InternalServerError,
        }
    }
}

/// Persistence collaborator failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backend rejected or failed to run a statement.
    #[error("database error: {0}")]
    Backend(String),

    /// A row came back in a shape the caller could not decode.
    #[error("malformed record: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }
}

impl From<StoreError> for DispatchError {
    fn from(value: StoreError) -> Self {
        DispatchError::Internal(value.into())
    }
}
