//! Score calculation backends.
//!
//! A backend observes every variable write made through the score director
//! (including shadow writes made by listeners) and produces the score on
//! demand. The director overrides the init score of whatever the backend
//! returns with its own count of unassigned genuine variables.
//!
//! # Backends
//!
//! - [`EasyScoreCalculator`] - Full recalculation on every request
//! - [`IncrementalScoreCalculator`] - User-supplied incremental hooks
//! - [`ConstraintScoreCalculator`] - Per-entity constraint matches with a
//!   dirty buffer, accumulated by a [`ScoreInliner`]

mod constraint;
mod easy;
mod incremental;
mod inliner;


use planwright_core::domain::listener::MutationObserver;
use planwright_core::{PlanningSolution, Result};

pub use constraint::{ConstraintScoreCalculator, EntityConstraint, MatchFn};
pub use easy::EasyScoreCalculator;
pub use incremental::{IncrementalScore, IncrementalScoreCalculator};
pub use inliner::{InlinerConstructor, InlinerRegistry, ScoreInliner, WeightedSumInliner};

/// A score calculation backend owned by one score director.
pub trait ScoreCalculator<S: PlanningSolution>: MutationObserver<S> + Send {
    /// Rebuilds all cached state from a newly installed working solution.
    fn reset_working_solution(&mut self, solution: &S);

    fn before_entity_added(&mut self, _solution: &S, _entity_descriptor: usize, _entity: usize) {}

    fn after_entity_added(&mut self, _solution: &S, _entity_descriptor: usize, _entity: usize) {}

    fn before_entity_removed(&mut self, _solution: &S, _entity_descriptor: usize, _entity: usize) {}

    fn after_entity_removed(&mut self, _solution: &S, _entity_descriptor: usize, _entity: usize) {}

    /// Calculates the score of the working solution.
    ///
    /// The init score of the result is ignored by the director.
    fn calculate_score(&mut self, solution: &S) -> Result<S::Score>;

    /// Returns true when observed changes are buffered and only folded into
    /// the score by [`calculate_score`](Self::calculate_score).
    fn requires_flushing(&self) -> bool {
        false
    }

    /// A new backend with the same configuration and no cached state.
    fn fresh(&self) -> Self
    where
        Self: Sized;
}
