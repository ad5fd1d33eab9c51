//! Full-recalculation backend.

use std::fmt;

use planwright_core::domain::listener::MutationObserver;
use planwright_core::{PlanningSolution, Result, VariableId};

use super::ScoreCalculator;

/// Recalculates the score from scratch on every request.
///
/// # Examples
///
/// ```
/// use planwright_core::{PlanningSolution, SimpleScore};
/// use planwright_scoring::calculator::{EasyScoreCalculator, ScoreCalculator};
///
/// #[derive(Clone)]
/// struct Sum {
///     values: Vec<i64>,
///     score: Option<SimpleScore>,
/// }
///
/// impl PlanningSolution for Sum {
///     type Score = SimpleScore;
///     fn score(&self) -> Option<Self::Score> { self.score }
///     fn set_score(&mut self, score: Option<Self::Score>) { self.score = score; }
/// }
///
/// let mut calculator = EasyScoreCalculator::new(|s: &Sum| SimpleScore::of(s.values.iter().sum()));
/// let solution = Sum { values: vec![1, 2, 3], score: None };
/// assert_eq!(calculator.calculate_score(&solution).unwrap(), SimpleScore::of(6));
/// ```
pub struct EasyScoreCalculator<S: PlanningSolution> {
    calculate: fn(&S) -> S::Score,
}

impl<S: PlanningSolution> EasyScoreCalculator<S> {
    pub fn new(calculate: fn(&S) -> S::Score) -> Self {
        Self { calculate }
    }
}

impl<S: PlanningSolution> Clone for EasyScoreCalculator<S> {
    fn clone(&self) -> Self {
        Self {
            calculate: self.calculate,
        }
    }
}

impl<S: PlanningSolution> fmt::Debug for EasyScoreCalculator<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EasyScoreCalculator").finish_non_exhaustive()
    }
}

impl<S: PlanningSolution> MutationObserver<S> for EasyScoreCalculator<S> {
    fn before_variable_changed(&mut self, _solution: &S, _variable: VariableId, _entity: usize) {}

    fn after_variable_changed(&mut self, _solution: &S, _variable: VariableId, _entity: usize) {}
}

impl<S: PlanningSolution> ScoreCalculator<S> for EasyScoreCalculator<S> {
    fn reset_working_solution(&mut self, _solution: &S) {}

    fn calculate_score(&mut self, solution: &S) -> Result<S::Score> {
        Ok((self.calculate)(solution))
    }

    fn fresh(&self) -> Self {
        self.clone()
    }
}
