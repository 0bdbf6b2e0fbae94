//! Error types for the playback interpreter.
//!
//! Playback operations themselves never fail loudly: they log a warning and
//! return an inert value. These types cover the loading boundary and the
//! internal reasons an operation is skipped.

use story_graph::{GraphError, OperationKind, VariableId, VariableKind};
use thiserror::Error;

/// Errors raised while configuring the engine or loading a story.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The TOML engine configuration could not be parsed.
    #[error("Invalid engine configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// The story graph could not be loaded.
    #[error("Failed to load story: {0}")]
    Graph(#[from] GraphError),

    /// A variable operation could not be applied or reversed.
    #[error("Operation failed: {0}")]
    Operation(#[from] OperationError),
}

/// Reasons a variable operation was skipped or could not be reversed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OperationError {
    #[error("Unknown variable: {0}")]
    UnknownVariable(VariableId),

    #[error("Operation '{}' has no usable operand", .0.as_str())]
    MissingOperand(OperationKind),

    #[error(
        "Operation '{}' cannot apply to {} variable '{variable}'",
        .operation.as_str(),
        .kind.as_str()
    )]
    TypeMismatch {
        operation: OperationKind,
        kind: VariableKind,
        variable: VariableId,
    },

    /// No recorded previous value and no general inverse exists.
    #[error(
        "Operation '{}' on '{variable}' cannot be reversed without a recorded previous value",
        .operation.as_str()
    )]
    Irreversible {
        operation: OperationKind,
        variable: VariableId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_error_messages() {
        let err = OperationError::TypeMismatch {
            operation: OperationKind::Invert,
            kind: VariableKind::Integer,
            variable: VariableId::from("score"),
        };
        assert_eq!(
            err.to_string(),
            "Operation 'invert' cannot apply to integer variable 'score'"
        );

        let wrapped = PlaybackError::from(OperationError::UnknownVariable(VariableId::from("x")));
        assert_eq!(wrapped.to_string(), "Operation failed: Unknown variable: x");
    }

    #[test]
    fn test_graph_error_converts() {
        let err = story_graph::StoryData::from_json("{ not json").unwrap_err();
        assert!(matches!(PlaybackError::from(err), PlaybackError::Graph(_)));
    }
}
