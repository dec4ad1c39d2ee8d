//! Process-wide logging setup for the feature request server.

pub mod tracing;

pub use crate::tracing::DEFAULT_FILTER;

/// Install the JSON log subscriber. Later calls are no-ops.
pub fn init() {
    tracing::init(DEFAULT_FILTER);
}
