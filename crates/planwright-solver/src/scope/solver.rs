//! Solver-level scope.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use planwright_core::{PlanningSolution, Result};
use planwright_scoring::ScoreDirector;

use crate::termination::Termination;

/// Top-level scope for the entire solving process.
///
/// Owns the coordinator's score director, the best solution found so far,
/// the random source and the termination.
pub struct SolverScope<S: PlanningSolution, D: ScoreDirector<S>> {
    score_director: D,
    best_solution: Option<S>,
    best_score: Option<S::Score>,
    rng: ChaCha8Rng,
    start_time: Option<Instant>,
    total_step_count: u64,
    phase_count: usize,
    terminate_early_flag: Arc<AtomicBool>,
    termination: Option<Box<dyn Termination<S, D>>>,
}

impl<S: PlanningSolution, D: ScoreDirector<S>> SolverScope<S, D> {
    /// Creates a scope whose random source is seeded from the OS.
    pub fn new(score_director: D) -> Self {
        Self::with_rng(score_director, ChaCha8Rng::from_os_rng())
    }

    pub fn with_seed(score_director: D, seed: u64) -> Self {
        Self::with_rng(score_director, ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(score_director: D, rng: ChaCha8Rng) -> Self {
        Self {
            score_director,
            best_solution: None,
            best_score: None,
            rng,
            start_time: None,
            total_step_count: 0,
            phase_count: 0,
            terminate_early_flag: Arc::new(AtomicBool::new(false)),
            termination: None,
        }
    }

    pub fn with_termination(mut self, termination: Box<dyn Termination<S, D>>) -> Self {
        self.termination = Some(termination);
        self
    }

    /// Hands the termination back, leaving the scope without one.
    pub fn take_termination(&mut self) -> Option<Box<dyn Termination<S, D>>> {
        self.termination.take()
    }

    /// Shares `flag` as this scope's terminate-early flag.
    pub fn with_terminate_early_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.terminate_early_flag = flag;
        self
    }

    pub fn start_solving(&mut self) {
        self.start_time = Some(Instant::now());
        self.total_step_count = 0;
        self.phase_count = 0;
    }

    pub fn elapsed(&self) -> Option<Duration> {
        self.start_time.map(|t| t.elapsed())
    }

    pub fn score_director(&self) -> &D {
        &self.score_director
    }

    pub fn score_director_mut(&mut self) -> &mut D {
        &mut self.score_director
    }

    pub fn working_solution(&self) -> &S {
        self.score_director.working_solution()
    }

    pub fn calculate_score(&mut self) -> Result<S::Score> {
        self.score_director.calculate_score()
    }

    pub fn best_solution(&self) -> Option<&S> {
        self.best_solution.as_ref()
    }

    pub fn best_score(&self) -> Option<&S::Score> {
        self.best_score.as_ref()
    }

    /// Keeps a copy of the working solution if it beats the best so far.
    ///
    /// Uses the score stored on the working solution, calculating one only
    /// when none is stored. Returns whether the best solution changed.
    pub fn update_best_solution(&mut self) -> Result<bool> {
        let current_score = match self.working_solution().score() {
            Some(score) => score,
            None => self.score_director.calculate_score()?,
        };
        let is_better = match &self.best_score {
            None => true,
            Some(best) => current_score > *best,
        };
        if is_better {
            self.best_solution = Some(self.score_director.clone_working_solution());
            self.best_score = Some(current_score);
        }
        Ok(is_better)
    }

    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// Borrows the score director and the random source together.
    pub fn score_director_and_rng(&mut self) -> (&D, &mut ChaCha8Rng) {
        (&self.score_director, &mut self.rng)
    }

    pub fn increment_step_count(&mut self) -> u64 {
        self.total_step_count += 1;
        self.total_step_count
    }

    pub fn total_step_count(&self) -> u64 {
        self.total_step_count
    }

    /// Hands out the index of the next phase.
    pub fn start_next_phase(&mut self) -> usize {
        let phase_index = self.phase_count;
        self.phase_count += 1;
        phase_index
    }

    pub fn take_best_or_working_solution(self) -> S {
        self.best_solution
            .unwrap_or_else(|| self.score_director.clone_working_solution())
    }

    pub fn terminate_early_flag(&self) -> &Arc<AtomicBool> {
        &self.terminate_early_flag
    }

    pub fn is_terminate_early(&self) -> bool {
        self.terminate_early_flag.load(Ordering::Acquire)
    }

    /// True once terminate-early was requested or the termination trips.
    pub fn is_terminated(&self) -> bool {
        self.is_terminate_early()
            || self
                .termination
                .as_ref()
                .is_some_and(|termination| termination.is_solver_terminated(self))
    }

    /// Progress towards the configured termination, in `[0, 1]`.
    pub fn time_gradient(&self) -> Option<f64> {
        self.termination
            .as_ref()
            .and_then(|termination| termination.time_gradient(self))
    }
}

impl<S: PlanningSolution, D: ScoreDirector<S>> fmt::Debug for SolverScope<S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolverScope")
            .field("best_score", &self.best_score)
            .field("total_step_count", &self.total_step_count)
            .field("phase_count", &self.phase_count)
            .field("termination", &self.termination)
            .field("terminate_early", &self.is_terminate_early())
            .finish()
    }
}
