//! Terminations decide when solving stops.
//!
//! The solver scope asks its termination between steps and between moves,
//! after checking its own terminate-early flag. Terminating never discards
//! work: the phase still commits the move picked so far.
//!
//! [`build_termination`] turns a [`TerminationConfig`] into one boxed
//! termination; several configured limits stop at whichever trips first.

mod best_score;
mod limits;

use std::fmt::{self, Debug};

use planwright_config::TerminationConfig;
use planwright_core::{ParseableScore, PlanningSolution, Result, SolverError};
use planwright_scoring::ScoreDirector;

use crate::scope::SolverScope;

pub use best_score::BestScoreTermination;
pub use limits::{StepCountTermination, TimeTermination};

/// A stop condition over the state of a [`SolverScope`].
///
/// # Type Parameters
/// * `S` - The planning solution type
/// * `D` - The score director type
pub trait Termination<S: PlanningSolution, D: ScoreDirector<S>>: Send + Debug {
    /// Returns true if solving should stop.
    fn is_solver_terminated(&self, solver_scope: &SolverScope<S, D>) -> bool;

    /// Fraction of the limit used so far, in `[0, 1]`.
    ///
    /// `None` when the limit gives no estimate of progress.
    fn time_gradient(&self, _solver_scope: &SolverScope<S, D>) -> Option<f64> {
        None
    }
}

/// Stops as soon as any child stops.
///
/// The gradient is the largest gradient among the children.
pub struct OrTermination<S: PlanningSolution, D: ScoreDirector<S>> {
    terminations: Vec<Box<dyn Termination<S, D>>>,
}

impl<S: PlanningSolution, D: ScoreDirector<S>> OrTermination<S, D> {
    pub fn new(terminations: Vec<Box<dyn Termination<S, D>>>) -> Self {
        Self { terminations }
    }

    pub fn len(&self) -> usize {
        self.terminations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terminations.is_empty()
    }
}

impl<S: PlanningSolution, D: ScoreDirector<S>> Debug for OrTermination<S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.terminations).finish()
    }
}

impl<S: PlanningSolution, D: ScoreDirector<S>> Termination<S, D> for OrTermination<S, D> {
    fn is_solver_terminated(&self, solver_scope: &SolverScope<S, D>) -> bool {
        self.terminations
            .iter()
            .any(|t| t.is_solver_terminated(solver_scope))
    }

    fn time_gradient(&self, solver_scope: &SolverScope<S, D>) -> Option<f64> {
        self.terminations
            .iter()
            .filter_map(|t| t.time_gradient(solver_scope))
            .reduce(f64::max)
    }
}

/// Builds the termination for the limits in `config`.
///
/// Returns `None` when no limit is set.
///
/// # Errors
///
/// [`SolverError::Config`] when `best_score_limit` does not parse as a
/// score of the solution.
pub fn build_termination<S, D>(
    config: &TerminationConfig,
) -> Result<Option<Box<dyn Termination<S, D>>>>
where
    S: PlanningSolution,
    S::Score: ParseableScore,
    D: ScoreDirector<S> + 'static,
{
    let mut terminations: Vec<Box<dyn Termination<S, D>>> = Vec::new();
    if let Some(limit) = config.time_limit() {
        terminations.push(Box::new(TimeTermination::new(limit)));
    }
    if let Some(limit) = config.step_count_limit {
        terminations.push(Box::new(StepCountTermination::new(limit)));
    }
    if let Some(limit) = &config.best_score_limit {
        let target = S::Score::parse(limit).map_err(|e| {
            SolverError::Config(format!("invalid best_score_limit {:?}: {}", limit, e))
        })?;
        terminations.push(Box::new(BestScoreTermination::new(target)));
    }
    Ok(match terminations.len() {
        0 => None,
        1 => terminations.pop(),
        _ => Some(Box::new(OrTermination::new(terminations))),
    })
}

#[cfg(test)]
mod tests;
