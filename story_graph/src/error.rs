//! Errors raised while loading or saving story data.

use thiserror::Error;

/// Error type for story graph (de)serialization.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The story JSON could not be parsed or produced.
    #[error("Story JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
