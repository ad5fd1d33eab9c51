//! Operations the coordinator sends to move threads.

use std::fmt;

use planwright_core::PlanningSolution;

/// One unit of work for a move thread.
///
/// Every move thread receives each `ApplyStep` exactly once; an
/// `Evaluate` is taken by whichever thread is free.
pub enum MoveThreadOperation<S: PlanningSolution, M> {
    /// Score `mv` on the thread's own solution and undo it.
    Evaluate {
        step_index: u64,
        move_index: usize,
        mv: M,
    },
    /// Commit the step picked by the coordinator and move on to `step_index`.
    ApplyStep {
        step_index: u64,
        mv: M,
        score: S::Score,
    },
    /// Stop the thread.
    Destroy,
}

impl<S: PlanningSolution, M: Clone> Clone for MoveThreadOperation<S, M> {
    fn clone(&self) -> Self {
        match self {
            Self::Evaluate {
                step_index,
                move_index,
                mv,
            } => Self::Evaluate {
                step_index: *step_index,
                move_index: *move_index,
                mv: mv.clone(),
            },
            Self::ApplyStep {
                step_index,
                mv,
                score,
            } => Self::ApplyStep {
                step_index: *step_index,
                mv: mv.clone(),
                score: *score,
            },
            Self::Destroy => Self::Destroy,
        }
    }
}

impl<S: PlanningSolution, M: fmt::Debug> fmt::Debug for MoveThreadOperation<S, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Evaluate {
                step_index,
                move_index,
                mv,
            } => f
                .debug_struct("Evaluate")
                .field("step_index", step_index)
                .field("move_index", move_index)
                .field("mv", mv)
                .finish(),
            Self::ApplyStep {
                step_index,
                mv,
                score,
            } => f
                .debug_struct("ApplyStep")
                .field("step_index", step_index)
                .field("mv", mv)
                .field("score", score)
                .finish(),
            Self::Destroy => f.write_str("Destroy"),
        }
    }
}
