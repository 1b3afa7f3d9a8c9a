//! Errors of the simulation harness.

use spread_core::SpreadError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    /// Configuration error raised by the core
    #[error(transparent)]
    Spread(#[from] SpreadError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Patience of zero would stop before the first epoch
    #[error("Patience must be None or an integer > 0")]
    InvalidPatience,

    /// A simulator drives exactly one propagation
    #[error("Simulation already performed (state: {0})")]
    AlreadyRun(String),
}
