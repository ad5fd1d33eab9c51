//! Deciders evaluate a placement's moves and pick the step.

use std::fmt::{self, Debug};
use std::marker::PhantomData;

use planwright_core::{PlanningSolution, Result, SolverError};
use planwright_scoring::ScoreDirector;
use tracing::trace;

use super::{ConstructionForager, Placement};
use crate::heuristic::r#move::{ConstructionMoveScope, EvaluationAsserts, Move, ProcessMove};
use crate::scope::{PhaseScope, StepScope};

/// Decides which move of a placement becomes the step.
///
/// The decider forwards every lifecycle event to its forager.
///
/// # Type Parameters
/// * `S` - The planning solution type
/// * `D` - The score director type
/// * `M` - The move type
pub trait ConstructionDecider<S, D, M>: Send + Debug
where
    S: PlanningSolution,
    D: ScoreDirector<S>,
    M: Move<S>,
{
    fn phase_started(&mut self, phase_scope: &mut PhaseScope<'_, S, D>) -> Result<()>;

    fn step_started(&mut self, step_scope: &mut StepScope<'_, '_, S, D>);

    /// Evaluates the moves of `placement` and returns the picked one.
    ///
    /// The working solution is left as it was before the call.
    fn decide_next_step(
        &mut self,
        step_scope: &mut StepScope<'_, '_, S, D>,
        placement: Placement<M>,
    ) -> Result<Option<ConstructionMoveScope<S, M>>>;

    /// Called after the picked move, if any, was committed.
    fn step_ended(
        &mut self,
        step_scope: &mut StepScope<'_, '_, S, D>,
        picked: Option<&ConstructionMoveScope<S, M>>,
    ) -> Result<()>;

    /// Called on every exit from the phase, including errors.
    fn phase_ended(&mut self, phase_scope: &mut PhaseScope<'_, S, D>) -> Result<()>;

    /// Number of moves foraged in the current step.
    fn selected_move_count(&self) -> u64;
}

/// Evaluates moves one after another on the solver's own score director.
pub struct ConstructionHeuristicDecider<S, M, Fo>
where
    S: PlanningSolution,
{
    forager: Fo,
    asserts: EvaluationAsserts,
    _phantom: PhantomData<fn() -> (S, M)>,
}

impl<S, M, Fo> ConstructionHeuristicDecider<S, M, Fo>
where
    S: PlanningSolution,
    M: Move<S>,
    Fo: ConstructionForager<S, M>,
{
    pub fn new(forager: Fo, asserts: EvaluationAsserts) -> Self {
        Self {
            forager,
            asserts,
            _phantom: PhantomData,
        }
    }

    pub fn forager(&self) -> &Fo {
        &self.forager
    }
}

impl<S, M, Fo> Debug for ConstructionHeuristicDecider<S, M, Fo>
where
    S: PlanningSolution,
    Fo: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructionHeuristicDecider")
            .field("forager", &self.forager)
            .field("asserts", &self.asserts)
            .finish()
    }
}

impl<S, D, M, Fo> ConstructionDecider<S, D, M> for ConstructionHeuristicDecider<S, M, Fo>
where
    S: PlanningSolution,
    D: ScoreDirector<S>,
    M: Move<S>,
    Fo: ConstructionForager<S, M>,
{
    fn phase_started(&mut self, phase_scope: &mut PhaseScope<'_, S, D>) -> Result<()> {
        self.forager.phase_started(phase_scope.phase_index());
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
        let last_step_score = step_scope.phase_scope().last_completed_step_score();

        for (move_index, mv) in placement.into_moves().enumerate() {
            let score_director = step_scope.score_director_mut();
            if !mv.is_doable(&*score_director) {
                return Err(SolverError::MoveNotDoable(format!(
                    "construction heuristic move {:?} of step {} is not doable",
                    mv, step_index
                )));
            }

            let mut scored = None;
            let undo = score_director.do_and_process_move(
                &mv,
                self.asserts.move_score_from_scratch,
                |score| scored = Some(score),
            )?;
            undo.do_move(&mut *score_director)?;
            if self.asserts.expected_undo_move_score {
                if let Some(last_step_score) = last_step_score {
                    score_director
                        .assert_expected_undo_move_score(&last_step_score, &format!("{:?}", mv))?;
                }
            }

            if let Some(score) = scored {
                trace!(
                    event = "move_evaluated",
                    step = step_index,
                    move_index,
                    score = %score,
                );
                self.forager
                    .add_move(ConstructionMoveScope::new(move_index, mv, score));
            }
            if self.forager.is_quit_early() || step_scope.is_terminated() {
                break;
            }
        }
        Ok(self.forager.pick_move())
    }

    fn step_ended(
        &mut self,
        step_scope: &mut StepScope<'_, '_, S, D>,
        _picked: Option<&ConstructionMoveScope<S, M>>,
    ) -> Result<()> {
        self.forager.step_ended(step_scope.step_index());
        Ok(())
    }

    fn phase_ended(&mut self, phase_scope: &mut PhaseScope<'_, S, D>) -> Result<()> {
        self.forager.phase_ended(phase_scope.phase_index());
        Ok(())
    }

    fn selected_move_count(&self) -> u64 {
        self.forager.selected_move_count()
    }
}
