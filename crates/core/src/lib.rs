//! `featreq-core`: request routing primitives.
//!
//! This crate knows nothing about HTTP transport, storage, or how users are
//! authenticated; the user type is a parameter of the registry.

pub mod arg;
pub mod error;
pub mod method;
pub mod registry;

pub use arg::{Arg, Coercion};
pub use error::{DispatchError, DispatchResult, Status, StoreError};
pub use method::Method;
pub use registry::{
    ok_ack, Handler, HandlerResult, Invocation, Param, Registration, Registry, RoutePath, Special,
};
