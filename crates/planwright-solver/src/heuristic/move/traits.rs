//! Move trait definition.

use std::fmt::Debug;

use planwright_core::{PlanningSolution, Result};
use planwright_scoring::ScoreDirector;

/// A reversible operation on one or more planning variables.
///
/// # Type Parameters
/// * `S` - The planning solution type
///
/// # Implementation Notes
/// - Moves are lightweight values: they hold indices, never references
/// - Every write goes through the score director's before/after protocol
/// - Methods are generic over D so moves run on the solver's director and on
///   every move thread's child director alike
pub trait Move<S: PlanningSolution>: Send + Sync + Debug + Clone + 'static {
    /// Returns true if this move changes the current state.
    ///
    /// A move is not doable if:
    /// - The target value equals the current value (no change)
    /// - It would link a chained entity to itself
    fn is_doable<D: ScoreDirector<S>>(&self, score_director: &D) -> bool;

    /// Creates the move that restores the state this move is about to change.
    ///
    /// Must be called before the move is done.
    fn create_undo_move<D: ScoreDirector<S>>(&self, score_director: &D) -> Self;

    /// Writes the move's changes without batching listener triggers.
    fn do_move_only<D: ScoreDirector<S>>(&self, score_director: &mut D) -> Result<()>;

    /// Does the move as one batch and returns its undo move.
    ///
    /// Variable listeners run once, after every write of the move.
    fn do_move<D: ScoreDirector<S>>(&self, score_director: &mut D) -> Result<Self> {
        let undo = self.create_undo_move(score_director);
        score_director.open_batch();
        let result = self.do_move_only(score_director);
        let closed = score_director.close_batch();
        result?;
        closed?;
        Ok(undo)
    }

    /// Returns this move as it applies to another director of the same run.
    ///
    /// Index-based moves mean the same thing on every director.
    fn rebase<D: ScoreDirector<S>>(&self, _destination: &D) -> Self {
        self.clone()
    }
}
