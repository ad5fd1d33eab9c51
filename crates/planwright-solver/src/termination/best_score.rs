//! Termination on reaching a target score.

use planwright_core::{PlanningSolution, Score};
use planwright_scoring::ScoreDirector;

use super::Termination;
use crate::scope::SolverScope;

/// Stops once the best solution is fully initialized and scores at least
/// `target`.
///
/// ```
/// use planwright_core::SimpleScore;
/// use planwright_solver::BestScoreTermination;
///
/// let termination = BestScoreTermination::new(SimpleScore::of(0));
/// assert_eq!(termination.target(), SimpleScore::of(0));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct BestScoreTermination<Sc: Score> {
    target: Sc,
}

impl<Sc: Score> BestScoreTermination<Sc> {
    pub fn new(target: Sc) -> Self {
        Self { target }
    }

    pub fn target(&self) -> Sc {
        self.target
    }
}

impl<S, D> Termination<S, D> for BestScoreTermination<S::Score>
where
    S: PlanningSolution,
    D: ScoreDirector<S>,
{
    fn is_solver_terminated(&self, solver_scope: &SolverScope<S, D>) -> bool {
        solver_scope
            .best_score()
            .is_some_and(|best| best.is_solution_initialized() && *best >= self.target)
    }
}
