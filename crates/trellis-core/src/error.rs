//! Error types for the solver.

use thiserror::Error;

use crate::constraint::ConstraintId;

/// Errors that can occur during constraint solving.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverError {
    /// A required constraint could not be satisfied.
    #[error("required constraint cannot be satisfied")]
    RequiredFailure,

    /// A required constraint conflicts with the listed constraints.
    #[error("required constraint conflicts with {}", display_ids(.0))]
    RequiredFailureWithExplanation(Vec<ConstraintId>),

    /// The objective has no finite minimum.
    #[error("objective function is unbounded")]
    ObjectiveUnbound,

    /// The constraint is not in the solver.
    #[error("constraint {0} is not in the solver")]
    ConstraintNotFound(ConstraintId),

    /// The tableau is inconsistent. This is a bug, not bad input.
    #[error("internal solver error: {0}")]
    InternalError(&'static str),
}

fn display_ids(ids: &[ConstraintId]) -> String {
    if ids.is_empty() {
        return "the existing constraints".to_string();
    }
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result alias for solver operations.
pub type Result<T> = std::result::Result<T, SolverError>;
