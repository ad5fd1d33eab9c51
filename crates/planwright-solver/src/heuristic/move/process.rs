//! Doing a move and scoring the result.

use planwright_config::EnvironmentMode;
use planwright_core::{PlanningSolution, Result};
use planwright_scoring::ScoreDirector;

use super::Move;

/// Assertions run while evaluating moves and committing steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluationAsserts {
    pub move_score_from_scratch: bool,
    pub expected_undo_move_score: bool,
    pub step_score_from_scratch: bool,
    pub expected_step_score: bool,
    pub shadow_variables_not_stale: bool,
}

impl EvaluationAsserts {
    /// Fast assert mode checks scores against expectations; full assert mode
    /// also recalculates them from scratch.
    pub fn from_environment_mode(mode: EnvironmentMode) -> Self {
        let fast = mode.is_fast_asserted();
        let full = mode.is_full_asserted();
        Self {
            move_score_from_scratch: full,
            expected_undo_move_score: fast,
            step_score_from_scratch: full,
            expected_step_score: fast,
            shadow_variables_not_stale: fast,
        }
    }
}

/// Extension of every score director: do a move, score it, keep it done.
pub trait ProcessMove<S: PlanningSolution>: ScoreDirector<S> + Sized {
    /// Does `mv`, calculates the score and hands it to `on_scored`.
    ///
    /// The move is NOT undone: the returned undo move is the caller's to do
    /// or drop. With `assert_move_score_from_scratch` the score is checked
    /// against one calculated by a fresh score backend first.
    fn do_and_process_move<M: Move<S>>(
        &mut self,
        mv: &M,
        assert_move_score_from_scratch: bool,
        on_scored: impl FnOnce(S::Score),
    ) -> Result<M> {
        let undo = mv.do_move(self)?;
        let score = self.calculate_score()?;
        if assert_move_score_from_scratch {
            self.assert_working_score_from_scratch(&score, &format!("move ({:?})", mv))?;
        }
        on_scored(score);
        Ok(undo)
    }
}

impl<S, D> ProcessMove<S> for D
where
    S: PlanningSolution,
    D: ScoreDirector<S>,
{
}
