//! Infrastructure layer: configuration, database adapters, and the request dispatcher.

pub mod config;
pub mod db;
pub mod dispatcher;

pub use config::{AppConfig, ConfigError};
pub use dispatcher::{Dispatcher, SESSION_COOKIE};
