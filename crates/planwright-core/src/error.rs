//! Error types for planwright

use thiserror::Error;

/// Main error type for planwright operations.
///
/// Every variant is fatal to the solving run that raised it: the working
/// solution can no longer be trusted, so it is never returned as a best
/// solution afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverError {
    /// Error in solver configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Shadow variables whose sources form a cycle.
    #[error("Cyclic shadow variable dependency between: {}", variables.join(", "))]
    CyclicShadowDependency { variables: Vec<String> },

    /// A shadow variable names a source that no entity descriptor declares.
    #[error("Shadow variable {shadow} refers to an unknown source variable {entity}.{variable}")]
    MissingSourceVariable {
        shadow: String,
        entity: String,
        variable: String,
    },

    /// No score inliner is registered for a score definition tag.
    #[error("No score inliner is registered for score definition '{0}'")]
    UnknownScoreInliner(String),

    /// Listener notifications were still queued when the score was requested.
    #[error(
        "Score calculation requested while {pending} variable listener notification(s) for \
         {listener} are still queued: shadow variables might be stale"
    )]
    NotificationQueueNotEmpty { listener: String, pending: usize },

    /// The working score differs from a trusted reference score.
    #[error("Score corruption after {context}: expected {expected} but was {actual}")]
    ScoreCorruption {
        context: String,
        expected: String,
        actual: String,
    },

    /// A shadow variable differs from its from-scratch value.
    #[error(
        "Shadow variable corruption after {context}: {entity}[{index}].{variable} \
         expected {expected} but was {actual}"
    )]
    ShadowCorruption {
        context: String,
        entity: String,
        index: usize,
        variable: String,
        expected: String,
        actual: String,
    },

    /// The externalized anchor supply and the anchor shadow variable disagree.
    #[error("Anchor disagreement for entity {entity}: supply has {supply}, shadow has {shadow}")]
    AnchorDisagreement {
        entity: usize,
        supply: String,
        shadow: String,
    },

    /// A move that was expected to be doable is not.
    #[error("Impossible situation: {0}")]
    MoveNotDoable(String),

    /// The solver thread was interrupted by an external termination request.
    #[error("The solver thread was interrupted: {0}")]
    Interrupted(String),

    /// A variable listener failed while recomputing a shadow variable.
    #[error("Variable listener for {listener} failed: {message}")]
    ListenerFailed { listener: String, message: String },

    /// A move evaluation thread failed or disappeared.
    #[error("Move thread {thread} failed: {message}")]
    WorkerFailed { thread: usize, message: String },

    /// Invalid operation for the current state
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl SolverError {
    /// Returns true for errors that report a configuration mistake rather
    /// than a failure during solving.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            SolverError::Config(_)
                | SolverError::CyclicShadowDependency { .. }
                | SolverError::MissingSourceVariable { .. }
                | SolverError::UnknownScoreInliner(_)
        )
    }

    /// Returns true for errors that mean the working solution is corrupted.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            SolverError::NotificationQueueNotEmpty { .. }
                | SolverError::ScoreCorruption { .. }
                | SolverError::ShadowCorruption { .. }
                | SolverError::AnchorDisagreement { .. }
        )
    }
}

/// Result type alias for planwright operations
pub type Result<T> = std::result::Result<T, SolverError>;
