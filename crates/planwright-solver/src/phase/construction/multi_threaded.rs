//! Multi-threaded construction heuristic decider.
//!
//! The coordinator keeps up to `selected_move_buffer_size` moves in play on
//! the move threads and forages their results in move index order. The
//! forager therefore sees exactly what the single-threaded decider would
//! show it, whatever the thread count.

use std::fmt::{self, Debug};
use std::marker::PhantomData;

use planwright_core::{PlanningSolution, Result, SolverError};
use planwright_scoring::ScoreDirector;
use tracing::{debug, trace};

use super::{ConstructionDecider, ConstructionForager, Placement};
use crate::heuristic::r#move::{ConstructionMoveScope, EvaluationAsserts, Move};
use crate::heuristic::thread::MoveThreadPool;
use crate::scope::{PhaseScope, StepScope};

/// Evaluates moves on a pool of move threads, one child score director
/// per thread.
pub struct MultiThreadedConstructionHeuristicDecider<S, M, Fo>
where
    S: PlanningSolution,
{
    forager: Fo,
    asserts: EvaluationAsserts,
    move_thread_count: usize,
    selected_move_buffer_size: usize,
    flush_step_interval: u64,
    pool: Option<MoveThreadPool<S, M>>,
    _phantom: PhantomData<fn() -> M>,
}

impl<S, M, Fo> MultiThreadedConstructionHeuristicDecider<S, M, Fo>
where
    S: PlanningSolution,
    M: Move<S>,
    Fo: ConstructionForager<S, M>,
{
    /// Creates a decider for `move_thread_count` threads.
    ///
    /// Each step keeps at most `selected_move_buffer_size` moves in play.
    /// Every `flush_step_interval` steps a score is calculated on the
    /// coordinator, if its score director requires flushing.
    pub fn new(
        forager: Fo,
        asserts: EvaluationAsserts,
        move_thread_count: usize,
        selected_move_buffer_size: usize,
        flush_step_interval: u64,
    ) -> Self {
        Self {
            forager,
            asserts,
            move_thread_count,
            selected_move_buffer_size,
            flush_step_interval: flush_step_interval.max(1),
            pool: None,
            _phantom: PhantomData,
        }
    }

    pub fn move_thread_count(&self) -> usize {
        self.move_thread_count
    }

    pub fn selected_move_buffer_size(&self) -> usize {
        self.selected_move_buffer_size
    }

    fn pool(&mut self) -> Result<&mut MoveThreadPool<S, M>> {
        self.pool.as_mut().ok_or_else(|| {
            SolverError::InvalidState("move threads used outside of a phase".to_string())
        })
    }
}

/// Takes the next result and hands it to the forager.
///
/// Returns true when the step should stop foraging.
fn forage_result<S, D, M, Fo>(
    pool: &mut MoveThreadPool<S, M>,
    forager: &mut Fo,
    step_scope: &StepScope<'_, '_, S, D>,
) -> Result<bool>
where
    S: PlanningSolution,
    D: ScoreDirector<S>,
    M: Move<S>,
    Fo: ConstructionForager<S, M>,
{
    let step_index = step_scope.step_index();
    let result = pool.results()?.take(step_scope.terminate_early_flag())?;
    if result.step_index != step_index {
        return Err(SolverError::InvalidState(format!(
            "foraged a result of step {} during step {}",
            result.step_index, step_index
        )));
    }
    let Some(score) = result.score else {
        return Err(SolverError::MoveNotDoable(format!(
            "construction heuristic move {:?} of step {} is not doable on move thread {}",
            result.mv, step_index, result.thread_index
        )));
    };
    let mv = result.mv.rebase(step_scope.score_director());
    trace!(
        event = "move_foraged",
        step = step_index,
        move_index = result.move_index,
        thread = result.thread_index,
        score = %score,
    );
    forager.add_move(ConstructionMoveScope::new(result.move_index, mv, score));
    Ok(forager.is_quit_early() || step_scope.is_terminated())
}

impl<S, M, Fo> Debug for MultiThreadedConstructionHeuristicDecider<S, M, Fo>
where
    S: PlanningSolution,
    Fo: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiThreadedConstructionHeuristicDecider")
            .field("forager", &self.forager)
            .field("move_thread_count", &self.move_thread_count)
            .field("selected_move_buffer_size", &self.selected_move_buffer_size)
            .field("flush_step_interval", &self.flush_step_interval)
            .field("pool", &self.pool)
            .finish()
    }
}

impl<S, D, M, Fo> ConstructionDecider<S, D, M> for MultiThreadedConstructionHeuristicDecider<S, M, Fo>
where
    S: PlanningSolution,
    D: ScoreDirector<S> + 'static,
    M: Move<S>,
    Fo: ConstructionForager<S, M>,
{
    fn phase_started(&mut self, phase_scope: &mut PhaseScope<'_, S, D>) -> Result<()> {
        self.forager.phase_started(phase_scope.phase_index());
        self.pool = Some(MoveThreadPool::start(
            phase_scope.score_director(),
            self.move_thread_count,
            self.selected_move_buffer_size,
            self.asserts,
        )?);
        Ok(())
    }

    fn step_started(&mut self, step_scope: &mut StepScope<'_, '_, S, D>) {
        self.forager.step_started(step_scope.step_index());
        self.forager
            .set_last_step_score(step_scope.phase_scope().last_completed_step_score());
    }

    fn decide_next_step(
        &mut self,
        step_scope: &mut StepScope<'_, '_, S, D>,
        placement: Placement<M>,
    ) -> Result<Option<ConstructionMoveScope<S, M>>> {
        let step_index = step_scope.step_index();
        let buffer_size = self.selected_move_buffer_size;
        let forager = &mut self.forager;
        let pool = self.pool.as_mut().ok_or_else(|| {
            SolverError::InvalidState("move threads used outside of a phase".to_string())
        })?;
        pool.results()?.start_next_step(step_index);

        let mut moves = placement.into_moves();
        let mut next = moves.next();
        let mut select_move_index = 0;
        let mut moves_in_play = 0;
        loop {
            if moves_in_play > 0 && (select_move_index >= buffer_size || next.is_none()) {
                if forage_result(pool, forager, step_scope)? {
                    break;
                }
                moves_in_play -= 1;
            }
            if let Some(mv) = next.take() {
                pool.evaluate(step_index, select_move_index, mv)?;
                select_move_index += 1;
                moves_in_play += 1;
                next = moves.next();
            }
            if moves_in_play == 0 {
                break;
            }
        }
        // Evaluations still queued belong to a step that is over.
        pool.clear_pending();
        Ok(forager.pick_move())
    }

    fn step_ended(
        &mut self,
        step_scope: &mut StepScope<'_, '_, S, D>,
        picked: Option<&ConstructionMoveScope<S, M>>,
    ) -> Result<()> {
        let step_index = step_scope.step_index();
        self.forager.step_ended(step_index);
        let Some(picked) = picked else {
            return Ok(());
        };

        let score_director = step_scope.score_director_mut();
        if score_director.requires_flushing()
            && step_index % self.flush_step_interval == self.flush_step_interval - 1
        {
            score_director.calculate_score()?;
        }
        self.pool()?
            .apply_step(step_index + 1, &picked.mv, picked.score)
    }

    fn phase_ended(&mut self, phase_scope: &mut PhaseScope<'_, S, D>) -> Result<()> {
        self.forager.phase_ended(phase_scope.phase_index());
        if let Some(mut pool) = self.pool.take() {
            let calculation_count = pool.shutdown();
            debug!(
                event = "move_threads_stopped",
                threads = self.move_thread_count,
                calculation_count,
            );
            phase_scope
                .score_director_mut()
                .add_calculation_count(calculation_count);
        }
        Ok(())
    }

    fn selected_move_count(&self) -> u64 {
        self.forager.selected_move_count()
    }
}
