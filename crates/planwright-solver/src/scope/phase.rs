//! Phase-level scope.

use std::time::Instant;

use planwright_core::{PlanningSolution, Result};
use planwright_scoring::ScoreDirector;

use super::SolverScope;

/// Scope for a single phase of solving.
///
/// # Type Parameters
/// * `'a` - Lifetime of the solver scope reference
/// * `S` - The planning solution type
/// * `D` - The score director type
pub struct PhaseScope<'a, S: PlanningSolution, D: ScoreDirector<S>> {
    solver_scope: &'a mut SolverScope<S, D>,
    phase_index: usize,
    starting_score: Option<S::Score>,
    last_completed_step_score: Option<S::Score>,
    step_count: u64,
    start_time: Instant,
}

impl<'a, S: PlanningSolution, D: ScoreDirector<S>> PhaseScope<'a, S, D> {
    pub fn new(solver_scope: &'a mut SolverScope<S, D>, phase_index: usize) -> Self {
        let starting_score = solver_scope.working_solution().score();
        Self {
            solver_scope,
            phase_index,
            starting_score,
            last_completed_step_score: starting_score,
            step_count: 0,
            start_time: Instant::now(),
        }
    }

    pub fn phase_index(&self) -> usize {
        self.phase_index
    }

    /// Returns the working score at the start of this phase.
    pub fn starting_score(&self) -> Option<&S::Score> {
        self.starting_score.as_ref()
    }

    /// Score of the last completed step, or the starting score before the
    /// first step completes.
    pub fn last_completed_step_score(&self) -> Option<S::Score> {
        self.last_completed_step_score
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Records a completed step with its score.
    pub fn complete_step(&mut self, step_score: Option<S::Score>) -> u64 {
        if step_score.is_some() {
            self.last_completed_step_score = step_score;
        }
        self.step_count += 1;
        self.solver_scope.increment_step_count();
        self.step_count
    }

    pub fn solver_scope(&self) -> &SolverScope<S, D> {
        self.solver_scope
    }

    pub fn solver_scope_mut(&mut self) -> &mut SolverScope<S, D> {
        self.solver_scope
    }

    pub fn score_director(&self) -> &D {
        self.solver_scope.score_director()
    }

    pub fn score_director_mut(&mut self) -> &mut D {
        self.solver_scope.score_director_mut()
    }

    pub fn calculate_score(&mut self) -> Result<S::Score> {
        self.solver_scope.calculate_score()
    }

    pub fn update_best_solution(&mut self) -> Result<bool> {
        self.solver_scope.update_best_solution()
    }

    pub fn is_terminated(&self) -> bool {
        self.solver_scope.is_terminated()
    }
}
