//! The loop a move thread runs.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Barrier};

use crossbeam::channel::Receiver;
use planwright_core::{PlanningSolution, Result, SolverError};
use planwright_scoring::ScoreDirector;
use tracing::{debug, trace, warn};

use super::{MoveThreadOperation, ResultSender};
use crate::heuristic::r#move::{EvaluationAsserts, Move, ProcessMove};

/// Evaluates moves against a private copy of the working solution.
///
/// The runner owns a child score director. Every `ApplyStep` meets the
/// other runners at a barrier before it is applied, so each runner takes
/// exactly one copy of it off the shared operation queue.
///
/// After a failure the runner keeps draining operations: it answers every
/// `Evaluate` with its error and keeps meeting the barrier, so the
/// coordinator and the other runners are never left waiting on it.
pub struct MoveThreadRunner<S: PlanningSolution, M, D> {
    thread_index: usize,
    score_director: D,
    operations: Receiver<MoveThreadOperation<S, M>>,
    results: ResultSender<S, M>,
    barrier: Arc<Barrier>,
    asserts: EvaluationAsserts,
    step_index: u64,
    last_step_score: Option<S::Score>,
    failure: Option<SolverError>,
}

impl<S, M, D> MoveThreadRunner<S, M, D>
where
    S: PlanningSolution,
    M: Move<S>,
    D: ScoreDirector<S>,
{
    pub fn new(
        thread_index: usize,
        score_director: D,
        operations: Receiver<MoveThreadOperation<S, M>>,
        results: ResultSender<S, M>,
        barrier: Arc<Barrier>,
        asserts: EvaluationAsserts,
    ) -> Self {
        Self {
            thread_index,
            score_director,
            operations,
            results,
            barrier,
            asserts,
            step_index: 0,
            last_step_score: None,
            failure: None,
        }
    }

    pub fn thread_index(&self) -> usize {
        self.thread_index
    }

    /// Runs until `Destroy` or until the coordinator drops the queue.
    ///
    /// Returns the number of score calculations this thread performed.
    pub fn run(mut self) -> u64 {
        debug!(event = "move_thread_start", thread = self.thread_index);
        match self.guarded(|runner| runner.score_director.calculate_score()) {
            Ok(score) => self.last_step_score = Some(score),
            Err(error) => self.fail(error),
        }

        while let Ok(operation) = self.operations.recv() {
            match operation {
                MoveThreadOperation::Destroy => break,
                MoveThreadOperation::ApplyStep {
                    step_index,
                    mv,
                    score,
                } => {
                    self.barrier.wait();
                    if self.failure.is_none() {
                        if let Err(error) = self.guarded(|runner| runner.apply_step(&mv, score)) {
                            self.fail(error);
                        }
                    }
                    self.step_index = step_index;
                }
                MoveThreadOperation::Evaluate {
                    step_index,
                    move_index,
                    mv,
                } => {
                    if let Some(error) = &self.failure {
                        self.results.add_error(error.clone());
                        continue;
                    }
                    if let Err(error) =
                        self.guarded(|runner| runner.evaluate(step_index, move_index, mv))
                    {
                        self.fail(error);
                    }
                }
            }
        }

        self.score_director.dispose();
        let calculation_count = self.score_director.calculation_count();
        debug!(
            event = "move_thread_end",
            thread = self.thread_index,
            calculation_count,
        );
        calculation_count
    }

    fn apply_step(&mut self, mv: &M, score: S::Score) -> Result<()> {
        let step = mv.rebase(&self.score_director);
        step.do_move(&mut self.score_director)?;
        self.score_director
            .working_solution_mut()
            .set_score(Some(score));

        let context = format!("step {} on move thread {}", self.step_index, self.thread_index);
        if self.asserts.step_score_from_scratch {
            self.score_director
                .assert_working_score_from_scratch(&score, &context)?;
        }
        if self.asserts.expected_step_score {
            let actual = self.score_director.calculate_score()?;
            if actual != score {
                return Err(SolverError::ScoreCorruption {
                    context,
                    expected: score.to_string(),
                    actual: actual.to_string(),
                });
            }
        }
        if self.asserts.shadow_variables_not_stale {
            self.score_director
                .assert_shadow_variables_are_not_stale(&context)?;
        }
        self.last_step_score = Some(score);
        Ok(())
    }

    fn evaluate(&mut self, step_index: u64, move_index: usize, mv: M) -> Result<()> {
        if step_index != self.step_index {
            return Err(SolverError::InvalidState(format!(
                "move thread {} is at step {} but received move {} of step {}",
                self.thread_index, self.step_index, move_index, step_index
            )));
        }
        let mv = mv.rebase(&self.score_director);
        if !mv.is_doable(&self.score_director) {
            self.results
                .add_undoable_move(self.thread_index, step_index, move_index, mv);
            return Ok(());
        }

        let mut scored = None;
        let undo = self.score_director.do_and_process_move(
            &mv,
            self.asserts.move_score_from_scratch,
            |score| scored = Some(score),
        )?;
        undo.do_move(&mut self.score_director)?;
        if self.asserts.expected_undo_move_score {
            if let Some(last_step_score) = self.last_step_score {
                self.score_director
                    .assert_expected_undo_move_score(&last_step_score, &format!("{:?}", mv))?;
            }
        }

        if let Some(score) = scored {
            trace!(
                event = "move_evaluated",
                thread = self.thread_index,
                step = step_index,
                move_index,
                score = %score,
            );
            self.results
                .add_move(self.thread_index, step_index, move_index, mv, score);
        }
        Ok(())
    }

    fn fail(&mut self, error: SolverError) {
        warn!(
            event = "move_thread_failed",
            thread = self.thread_index,
            step = self.step_index,
            error = %error,
        );
        self.results.add_error(error.clone());
        self.failure = Some(error);
    }

    fn guarded<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let thread = self.thread_index;
        match panic::catch_unwind(AssertUnwindSafe(|| f(self))) {
            Ok(result) => result,
            Err(payload) => Err(SolverError::WorkerFailed {
                thread,
                message: panic_message(payload.as_ref()),
            }),
        }
    }
}

impl<S: PlanningSolution, M, D> fmt::Debug for MoveThreadRunner<S, M, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MoveThreadRunner")
            .field("thread_index", &self.thread_index)
            .field("step_index", &self.step_index)
            .field("failed", &self.failure.is_some())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "move thread panicked".to_string()
    }
}
