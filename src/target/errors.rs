//! Error types for the target graph

use crate::executor::ToolError;
use thiserror::Error;

/// Errors raised while building or resolving a target graph.
///
/// These are always fatal and are reported before any action runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A target with the same identifier was already registered
    #[error("Target '{id}' is already registered")]
    DuplicateTarget {
        /// Identifier that collided.
        id: String,
    },

    /// A requested or depended-upon target does not exist
    #[error("{}", unknown_target_message(.id, .required_by.as_deref()))]
    UnknownTarget {
        /// Identifier that could not be found.
        id: String,
        /// Target that declared the dependency, if any.
        required_by: Option<String>,
    },

    /// Resolution revisited a target already on the resolution stack
    #[error("Dependency cycle detected: {}", .path.join(" -> "))]
    CycleDetected {
        /// Targets forming the cycle, first and last entries are equal.
        path: Vec<String>,
    },

    /// A target definition is malformed
    #[error("Invalid target '{id}': {reason}")]
    InvalidTarget {
        /// Identifier of the offending target.
        id: String,
        /// What is wrong with it.
        reason: String,
    },
}

fn unknown_target_message(id: &str, required_by: Option<&str>) -> String {
    match required_by {
        Some(parent) => format!("Unknown target '{id}' (required by '{parent}')"),
        None => format!("Unknown target '{id}'"),
    }
}

/// Errors raised by a target action.
#[derive(Error, Debug)]
pub enum ActionError {
    /// An external tool failed hard
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// A filesystem operation failed
    #[error("{context}: {source}")]
    Io {
        /// What was being done.
        context: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A staged artifact expected from an upstream target is missing
    #[error("Missing artifact: {0}")]
    MissingArtifact(String),

    /// Any other failure
    #[error("{0}")]
    Failed(String),
}

impl ActionError {
    /// Wraps an I/O error with a description of the operation.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Errors returned by [`TargetGraph::run`](super::TargetGraph::run).
#[derive(Error, Debug)]
pub enum RunError {
    /// The graph could not be resolved, nothing was executed
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// A target action failed hard and the run was aborted
    #[error("Target '{target}' failed: {cause}")]
    TargetExecution {
        /// Target whose action failed.
        target: String,
        /// The action's error.
        #[source]
        cause: ActionError,
    },
}

impl RunError {
    /// Returns the identifier of the failed target, if execution had started.
    #[must_use]
    pub fn failed_target(&self) -> Option<&str> {
        match self {
            Self::TargetExecution { target, .. } => Some(target),
            Self::Graph(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_target_message() {
        let err = GraphError::UnknownTarget {
            id: "Pack".to_string(),
            required_by: None,
        };
        assert_eq!(err.to_string(), "Unknown target 'Pack'");

        let err = GraphError::UnknownTarget {
            id: "Pack".to_string(),
            required_by: Some("Publish".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Unknown target 'Pack' (required by 'Publish')"
        );
    }

    #[test]
    fn test_cycle_message() {
        let err = GraphError::CycleDetected {
            path: vec!["A".into(), "B".into(), "A".into()],
        };
        assert_eq!(err.to_string(), "Dependency cycle detected: A -> B -> A");
    }

    #[test]
    fn test_run_error_failed_target() {
        let err = RunError::TargetExecution {
            target: "Compile".to_string(),
            cause: ActionError::Failed("boom".to_string()),
        };
        assert_eq!(err.failed_target(), Some("Compile"));
        assert_eq!(err.to_string(), "Target 'Compile' failed: boom");

        let err = RunError::from(GraphError::DuplicateTarget {
            id: "Clean".to_string(),
        });
        assert_eq!(err.failed_target(), None);
    }
}
