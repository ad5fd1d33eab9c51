//! Construction heuristic phase implementation.

use std::fmt::Debug;
use std::marker::PhantomData;

use planwright_core::{PlanningSolution, Result, SolverError};
use planwright_scoring::ScoreDirector;
use tracing::{debug, info, warn};

use crate::heuristic::r#move::{ConstructionMoveScope, EvaluationAsserts, Move};
use crate::phase::construction::{ConstructionDecider, EntityPlacer};
use crate::phase::Phase;
use crate::scope::{PhaseScope, SolverScope, StepScope};

const PHASE_TYPE_NAME: &str = "ConstructionHeuristic";

/// Construction heuristic phase that builds an initial solution.
///
/// Each step takes the next placement, lets the decider pick one of its
/// moves and commits it. The phase ends when every entity is initialized,
/// when the solver terminates, or when a placement has no doable move.
///
/// # Type Parameters
/// * `S` - The planning solution type
/// * `M` - The move type
/// * `P` - The entity placer type
/// * `Dc` - The decider type
pub struct ConstructionHeuristicPhase<S, M, P, Dc>
where
    S: PlanningSolution,
    M: Move<S>,
    P: EntityPlacer<S, M>,
{
    placer: P,
    decider: Dc,
    asserts: EvaluationAsserts,
    _phantom: PhantomData<fn() -> (S, M)>,
}

impl<S, M, P, Dc> ConstructionHeuristicPhase<S, M, P, Dc>
where
    S: PlanningSolution,
    M: Move<S>,
    P: EntityPlacer<S, M>,
{
    pub fn new(placer: P, decider: Dc, asserts: EvaluationAsserts) -> Self {
        Self {
            placer,
            decider,
            asserts,
            _phantom: PhantomData,
        }
    }

    pub fn decider(&self) -> &Dc {
        &self.decider
    }

    fn solve_steps<D>(&mut self, phase_scope: &mut PhaseScope<'_, S, D>) -> Result<()>
    where
        D: ScoreDirector<S>,
        Dc: ConstructionDecider<S, D, M>,
    {
        loop {
            if phase_scope.is_terminated() {
                break;
            }
            let placement = {
                let (score_director, rng) = phase_scope.solver_scope_mut().score_director_and_rng();
                self.placer.next_placement(score_director, rng)
            };
            let Some(placement) = placement else {
                break;
            };

            let mut step_scope = StepScope::new(phase_scope);
            let step_index = step_scope.step_index();
            step_scope.score_director_mut().step_started(step_index);
            self.decider.step_started(&mut step_scope);

            let picked = self.decider.decide_next_step(&mut step_scope, placement)?;
            let Some(picked) = picked else {
                self.decider.step_ended(&mut step_scope, None)?;
                step_scope.score_director_mut().step_ended(step_index);
                if self.decider.selected_move_count() == 0 {
                    warn!(
                        event = "no_doable_move",
                        step = step_index,
                        "No doable selected move at step index {}; terminating phase early",
                        step_index,
                    );
                    break;
                }
                if step_scope.is_terminated() {
                    break;
                }
                return Err(SolverError::InvalidState(format!(
                    "step {} selected moves but picked none",
                    step_index
                )));
            };

            self.commit(&mut step_scope, &picked)?;
            self.decider.step_ended(&mut step_scope, Some(&picked))?;
            step_scope.score_director_mut().step_ended(step_index);
            step_scope.complete();
            let improved = step_scope.phase_scope_mut().update_best_solution()?;
            debug!(
                event = "step_end",
                step = step_index,
                move_index = picked.move_index,
                score = %picked.score,
                selected_moves = self.decider.selected_move_count(),
                new_best = improved,
                time_gradient = ?step_scope.phase_scope().solver_scope().time_gradient(),
            );
        }
        Ok(())
    }

    /// Does the picked move on the coordinator and records its score as
    /// the step score.
    fn commit<D>(
        &self,
        step_scope: &mut StepScope<'_, '_, S, D>,
        picked: &ConstructionMoveScope<S, M>,
    ) -> Result<()>
    where
        D: ScoreDirector<S>,
    {
        let context = format!("step {} move {:?}", step_scope.step_index(), picked.mv);
        let score_director = step_scope.score_director_mut();
        picked.mv.do_move(&mut *score_director)?;
        score_director
            .working_solution_mut()
            .set_score(Some(picked.score));

        if self.asserts.step_score_from_scratch {
            score_director.assert_working_score_from_scratch(&picked.score, &context)?;
        } else if self.asserts.expected_step_score {
            let actual = score_director.calculate_score()?;
            if actual != picked.score {
                return Err(SolverError::ScoreCorruption {
                    context,
                    expected: picked.score.to_string(),
                    actual: actual.to_string(),
                });
            }
        }
        if self.asserts.shadow_variables_not_stale {
            score_director.assert_shadow_variables_are_not_stale(&context)?;
        }
        step_scope.set_step_score(picked.score);
        Ok(())
    }
}

impl<S, M, P, Dc> Debug for ConstructionHeuristicPhase<S, M, P, Dc>
where
    S: PlanningSolution,
    M: Move<S>,
    P: EntityPlacer<S, M>,
    Dc: Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstructionHeuristicPhase")
            .field("placer", &self.placer)
            .field("decider", &self.decider)
            .field("asserts", &self.asserts)
            .finish()
    }
}

impl<S, D, M, P, Dc> Phase<S, D> for ConstructionHeuristicPhase<S, M, P, Dc>
where
    S: PlanningSolution,
    D: ScoreDirector<S>,
    M: Move<S>,
    P: EntityPlacer<S, M>,
    Dc: ConstructionDecider<S, D, M>,
{
    fn solve(&mut self, solver_scope: &mut SolverScope<S, D>) -> Result<()> {
        let phase_index = solver_scope.start_next_phase();
        let mut phase_scope = PhaseScope::new(solver_scope, phase_index);
        info!(
            event = "phase_start",
            phase = PHASE_TYPE_NAME,
            phase_index,
            decider = ?self.decider,
        );

        phase_scope.score_director_mut().phase_started(phase_index);
        self.placer.phase_started();
        let solved = self
            .decider
            .phase_started(&mut phase_scope)
            .and_then(|()| self.solve_steps(&mut phase_scope));
        let ended = self.decider.phase_ended(&mut phase_scope);
        phase_scope.score_director_mut().phase_ended(phase_index);
        solved?;
        ended?;

        info!(
            event = "phase_end",
            phase = PHASE_TYPE_NAME,
            phase_index,
            steps = phase_scope.step_count(),
            score = ?phase_scope.last_completed_step_score(),
            duration_ms = phase_scope.elapsed().as_millis() as u64,
        );
        Ok(())
    }

    fn phase_type_name(&self) -> &'static str {
        PHASE_TYPE_NAME
    }
}
