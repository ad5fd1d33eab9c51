//! Score director factory for creating score directors.

use std::sync::Arc;

use planwright_core::{PlanningSolution, Result, SolutionDescriptor};

use super::typed::TypedScoreDirector;
use crate::calculator::ScoreCalculator;

/// Creates score directors sharing one descriptor and one backend
/// configuration.
///
/// Every director gets its own [fresh](ScoreCalculator::fresh) backend.
pub struct ScoreDirectorFactory<S: PlanningSolution, C> {
    descriptor: Arc<SolutionDescriptor<S>>,
    calculator: C,
}

impl<S, C> ScoreDirectorFactory<S, C>
where
    S: PlanningSolution,
    C: ScoreCalculator<S>,
{
    /// Creates a new ScoreDirectorFactory.
    pub fn new(descriptor: Arc<SolutionDescriptor<S>>, calculator: C) -> Self {
        Self {
            descriptor,
            calculator,
        }
    }

    /// Creates a new score director for the given solution.
    pub fn build_score_director(&self, solution: S) -> Result<TypedScoreDirector<S, C>> {
        TypedScoreDirector::new(Arc::clone(&self.descriptor), self.calculator.fresh(), solution)
    }

    /// Returns a reference to the solution descriptor.
    pub fn descriptor(&self) -> &Arc<SolutionDescriptor<S>> {
        &self.descriptor
    }
}

impl<S: PlanningSolution, C: Clone> Clone for ScoreDirectorFactory<S, C> {
    fn clone(&self) -> Self {
        Self {
            descriptor: Arc::clone(&self.descriptor),
            calculator: self.calculator.clone(),
        }
    }
}
