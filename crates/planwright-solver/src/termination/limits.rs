//! Limits on the time spent and on the number of steps taken.

use std::time::Duration;

use planwright_core::PlanningSolution;
use planwright_scoring::ScoreDirector;

use super::Termination;
use crate::scope::SolverScope;

/// Stops once the time since solving started reaches `limit`.
///
/// ```
/// use std::time::Duration;
/// use planwright_solver::TimeTermination;
///
/// let termination = TimeTermination::new(Duration::from_millis(1500));
/// assert_eq!(termination.limit(), Duration::from_millis(1500));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TimeTermination {
    limit: Duration,
}

impl TimeTermination {
    pub fn new(limit: Duration) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }
}

impl<S: PlanningSolution, D: ScoreDirector<S>> Termination<S, D> for TimeTermination {
    fn is_solver_terminated(&self, solver_scope: &SolverScope<S, D>) -> bool {
        solver_scope
            .elapsed()
            .is_some_and(|elapsed| elapsed >= self.limit)
    }

    fn time_gradient(&self, solver_scope: &SolverScope<S, D>) -> Option<f64> {
        let elapsed = solver_scope.elapsed()?;
        if self.limit.is_zero() {
            return Some(1.0);
        }
        Some((elapsed.as_secs_f64() / self.limit.as_secs_f64()).min(1.0))
    }
}

/// Stops once `limit` steps completed, counted over every phase.
#[derive(Debug, Clone, Copy)]
pub struct StepCountTermination {
    limit: u64,
}

impl StepCountTermination {
    pub fn new(limit: u64) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }
}

impl<S: PlanningSolution, D: ScoreDirector<S>> Termination<S, D> for StepCountTermination {
    fn is_solver_terminated(&self, solver_scope: &SolverScope<S, D>) -> bool {
        solver_scope.total_step_count() >= self.limit
    }

    fn time_gradient(&self, solver_scope: &SolverScope<S, D>) -> Option<f64> {
        if self.limit == 0 {
            return Some(1.0);
        }
        Some((solver_scope.total_step_count() as f64 / self.limit as f64).min(1.0))
    }
}
