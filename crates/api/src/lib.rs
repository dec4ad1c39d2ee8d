//! HTTP API: server wiring and the resource endpoints.

pub mod app;
