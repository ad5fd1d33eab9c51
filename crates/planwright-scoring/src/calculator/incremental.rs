//! Backend driven by user-supplied incremental hooks.

use planwright_core::domain::listener::MutationObserver;
use planwright_core::{PlanningSolution, Result, VariableId};

use super::ScoreCalculator;

/// Incremental score logic supplied by the user.
///
/// The protocol mirrors the score director's: `before_*` is called while
/// the solution still holds the old value, `after_*` once it holds the new
/// one. Shadow variable writes are reported the same way as genuine ones.
pub trait IncrementalScore<S: PlanningSolution>: Clone + Send {
    /// Rebuilds the running score from scratch.
    fn reset_working_solution(&mut self, solution: &S);

    fn before_variable_changed(&mut self, solution: &S, variable: VariableId, entity: usize);

    fn after_variable_changed(&mut self, solution: &S, variable: VariableId, entity: usize);

    fn before_entity_added(&mut self, _solution: &S, _entity_descriptor: usize, _entity: usize) {}

    fn after_entity_added(&mut self, _solution: &S, _entity_descriptor: usize, _entity: usize) {}

    fn before_entity_removed(&mut self, _solution: &S, _entity_descriptor: usize, _entity: usize) {}

    fn after_entity_removed(&mut self, _solution: &S, _entity_descriptor: usize, _entity: usize) {}

    /// The running score.
    fn score(&self) -> S::Score;
}

/// Adapts an [`IncrementalScore`] to the [`ScoreCalculator`] protocol.
#[derive(Debug, Clone)]
pub struct IncrementalScoreCalculator<I> {
    template: I,
    inner: I,
}

impl<I> IncrementalScoreCalculator<I> {
    /// `inner` is kept as a template: [`fresh`](ScoreCalculator::fresh)
    /// clones it.
    pub fn new(inner: I) -> Self
    where
        I: Clone,
    {
        Self {
            template: inner.clone(),
            inner,
        }
    }

    pub fn inner(&self) -> &I {
        &self.inner
    }
}

impl<S, I> MutationObserver<S> for IncrementalScoreCalculator<I>
where
    S: PlanningSolution,
    I: IncrementalScore<S>,
{
    fn before_variable_changed(&mut self, solution: &S, variable: VariableId, entity: usize) {
        self.inner.before_variable_changed(solution, variable, entity);
    }

    fn after_variable_changed(&mut self, solution: &S, variable: VariableId, entity: usize) {
        self.inner.after_variable_changed(solution, variable, entity);
    }
}

impl<S, I> ScoreCalculator<S> for IncrementalScoreCalculator<I>
where
    S: PlanningSolution,
    I: IncrementalScore<S>,
{
    fn reset_working_solution(&mut self, solution: &S) {
        self.inner.reset_working_solution(solution);
    }

    fn before_entity_added(&mut self, solution: &S, entity_descriptor: usize, entity: usize) {
        self.inner.before_entity_added(solution, entity_descriptor, entity);
    }

    fn after_entity_added(&mut self, solution: &S, entity_descriptor: usize, entity: usize) {
        self.inner.after_entity_added(solution, entity_descriptor, entity);
    }

    fn before_entity_removed(&mut self, solution: &S, entity_descriptor: usize, entity: usize) {
        self.inner.before_entity_removed(solution, entity_descriptor, entity);
    }

    fn after_entity_removed(&mut self, solution: &S, entity_descriptor: usize, entity: usize) {
        self.inner.after_entity_removed(solution, entity_descriptor, entity);
    }

    fn calculate_score(&mut self, _solution: &S) -> Result<S::Score> {
        Ok(self.inner.score())
    }

    fn fresh(&self) -> Self {
        Self {
            template: self.template.clone(),
            inner: self.template.clone(),
        }
    }
}
