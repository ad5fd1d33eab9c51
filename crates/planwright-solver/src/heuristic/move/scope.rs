//! Move scope of a construction heuristic step.

use std::fmt;

use planwright_core::PlanningSolution;

/// A scored move of the current step.
///
/// `move_index` is the move's position in the placement, which the
/// forager and the ordered result queue both order by.
pub struct ConstructionMoveScope<S: PlanningSolution, M> {
    pub move_index: usize,
    pub mv: M,
    pub score: S::Score,
}

impl<S: PlanningSolution, M> ConstructionMoveScope<S, M> {
    pub fn new(move_index: usize, mv: M, score: S::Score) -> Self {
        Self {
            move_index,
            mv,
            score,
        }
    }
}

impl<S: PlanningSolution, M: Clone> Clone for ConstructionMoveScope<S, M> {
    fn clone(&self) -> Self {
        Self {
            move_index: self.move_index,
            mv: self.mv.clone(),
            score: self.score,
        }
    }
}

impl<S: PlanningSolution, M: fmt::Debug> fmt::Debug for ConstructionMoveScope<S, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructionMoveScope")
            .field("move_index", &self.move_index)
            .field("mv", &self.mv)
            .field("score", &self.score)
            .finish()
    }
}
