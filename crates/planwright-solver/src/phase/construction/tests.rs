//! Tests for placers, foragers, deciders and the construction phase.

use std::sync::Arc;

use planwright_config::{PickEarlyType, SelectionOrder};
use planwright_core::{
    EntityDescriptor, PlanningSolution, PlanningValue, Score, SimpleScore, SolutionDescriptor,
    SolverError, SolverLifecycleListener, VariableDescriptor, VariableId,
};
use planwright_scoring::{EasyScoreCalculator, ScoreDirector, TypedScoreDirector};
use planwright_test::doubling::{self, DoublingSolution, VALUE};
use planwright_test::routing::{self, RoutingSolution, PREVIOUS};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::*;
use crate::heuristic::r#move::{ChangeMove, ConstructionMove, ConstructionMoveScope, EvaluationAsserts};
use crate::phase::Phase;
use crate::scope::SolverScope;

type DoublingDirector = TypedScoreDirector<DoublingSolution, EasyScoreCalculator<DoublingSolution>>;
type RoutingDirector = TypedScoreDirector<RoutingSolution, EasyScoreCalculator<RoutingSolution>>;

fn doubling_director(solution: DoublingSolution) -> DoublingDirector {
    TypedScoreDirector::new(
        doubling::descriptor(),
        EasyScoreCalculator::new(doubling::calculate_score),
        solution,
    )
    .unwrap()
}

fn routing_director(solution: RoutingSolution) -> RoutingDirector {
    TypedScoreDirector::new(
        routing::descriptor(),
        EasyScoreCalculator::new(routing::calculate_distance),
        solution,
    )
    .unwrap()
}

fn rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(7)
}

fn moves<M>(placement: Placement<M>) -> Vec<M> {
    placement.into_moves().collect()
}

fn single_threaded<S, M>(
    pick_early_type: PickEarlyType,
) -> ConstructionHeuristicDecider<S, M, DefaultConstructionForager<S, M>>
where
    S: PlanningSolution,
    M: crate::heuristic::r#move::Move<S>,
{
    ConstructionHeuristicDecider::new(
        DefaultConstructionForager::new(pick_early_type),
        EvaluationAsserts::default(),
    )
}

fn multi_threaded<S, M>(
    threads: usize,
    buffer: usize,
    asserts: EvaluationAsserts,
) -> MultiThreadedConstructionHeuristicDecider<S, M, DefaultConstructionForager<S, M>>
where
    S: PlanningSolution,
    M: crate::heuristic::r#move::Move<S>,
{
    MultiThreadedConstructionHeuristicDecider::new(
        DefaultConstructionForager::new(PickEarlyType::Never),
        asserts,
        threads,
        buffer,
        100,
    )
}

// Two genuine variables on one entity, to exercise composite placements.

#[derive(Clone, Debug, PartialEq)]
struct Shift {
    start: PlanningValue,
    length: PlanningValue,
}

#[derive(Clone, Debug)]
struct Roster {
    shifts: Vec<Shift>,
    score: Option<SimpleScore>,
}

impl PlanningSolution for Roster {
    type Score = SimpleScore;

    fn score(&self) -> Option<Self::Score> {
        self.score
    }

    fn set_score(&mut self, score: Option<Self::Score>) {
        self.score = score;
    }
}

fn roster_descriptor() -> Arc<SolutionDescriptor<Roster>> {
    SolutionDescriptor::builder("Roster")
        .entity(
            EntityDescriptor::new("Shift", |s: &Roster| s.shifts.len())
                .with_variable(VariableDescriptor::genuine(
                    "start",
                    |s: &Roster, i| s.shifts[i].start,
                    |s: &mut Roster, i, v| s.shifts[i].start = v,
                    |_: &Roster| vec![PlanningValue::Int(8), PlanningValue::Int(9)],
                ))
                .with_variable(VariableDescriptor::genuine(
                    "length",
                    |s: &Roster, i| s.shifts[i].length,
                    |s: &mut Roster, i, v| s.shifts[i].length = v,
                    |_: &Roster| {
                        vec![PlanningValue::Int(4), PlanningValue::Int(6), PlanningValue::Int(8)]
                    },
                )),
        )
        .build()
        .unwrap()
}

/// Shifts should end at 16.
fn roster_score(roster: &Roster) -> SimpleScore {
    let penalty: i64 = roster
        .shifts
        .iter()
        .filter_map(|s| Some(s.start.as_int()? + s.length.as_int()?))
        .map(|end| (end - 16).abs())
        .sum();
    SimpleScore::of(-penalty)
}

fn roster_director(shifts: usize) -> TypedScoreDirector<Roster, EasyScoreCalculator<Roster>> {
    let roster = Roster {
        shifts: vec![
            Shift {
                start: PlanningValue::Unassigned,
                length: PlanningValue::Unassigned,
            };
            shifts
        ],
        score: None,
    };
    TypedScoreDirector::new(roster_descriptor(), EasyScoreCalculator::new(roster_score), roster)
        .unwrap()
}

/// Proposes one entity whose only move leaves its value unchanged.
#[derive(Debug, Default)]
struct UnchangedValuePlacer {
    placed: bool,
}

impl EntityPlacer<DoublingSolution, ChangeMove> for UnchangedValuePlacer {
    fn next_placement<D: ScoreDirector<DoublingSolution>>(
        &mut self,
        _score_director: &D,
        _rng: &mut dyn RngCore,
    ) -> Option<Placement<ChangeMove>> {
        if self.placed {
            return None;
        }
        self.placed = true;
        Some(Placement::new(
            0,
            0,
            std::iter::once(ChangeMove::new(VALUE, 0, PlanningValue::Unassigned)),
        ))
    }
}

// Placer

#[test]
fn test_placer_walks_uninitialized_entities_in_order() {
    let director = doubling_director(DoublingSolution::with_values(&[Some(2), None, None]));
    let mut placer = QueuedEntityPlacer::default();
    let mut rng = rng();

    let placement = placer.next_placement(&director, &mut rng).unwrap();
    assert_eq!(placement.entity_index, 1);
    let values: Vec<_> = moves(placement)
        .into_iter()
        .map(|m| match m {
            ConstructionMove::Change(m) => m.to_value(),
            other => panic!("unexpected move {other:?}"),
        })
        .collect();
    assert_eq!(
        values,
        vec![PlanningValue::Int(1), PlanningValue::Int(2), PlanningValue::Int(3)]
    );

    assert_eq!(placer.next_placement(&director, &mut rng).unwrap().entity_index, 2);
    assert!(placer.next_placement(&director, &mut rng).is_none());

    EntityPlacer::<DoublingSolution, ConstructionMove>::phase_started(&mut placer);
    assert_eq!(placer.next_placement(&director, &mut rng).unwrap().entity_index, 1);
}

#[test]
fn test_placer_offers_only_chained_values() {
    let solution = RoutingSolution::new(&[0, 100], &[1, 2, 3])
        .with_previous(&[PlanningValue::Anchor(0)]);
    let director = routing_director(solution);
    let mut placer = QueuedEntityPlacer::default();

    let placement = placer.next_placement(&director, &mut rng()).unwrap();
    assert_eq!(placement.entity_index, 1);
    let targets: Vec<_> = moves(placement)
        .into_iter()
        .map(|m| match m {
            ConstructionMove::Chained(m) => {
                assert_eq!(m.variable(), PREVIOUS);
                m.to_value()
            }
            other => panic!("unexpected move {other:?}"),
        })
        .collect();

    // Customer 2 is not in a chain yet, so nothing may link behind it.
    assert_eq!(
        targets,
        vec![
            PlanningValue::Anchor(0),
            PlanningValue::Anchor(1),
            PlanningValue::Entity(0),
        ]
    );
}

#[test]
fn test_placer_combines_several_variables() {
    let director = roster_director(1);
    let mut placer = QueuedEntityPlacer::default();

    let placement = placer.next_placement(&director, &mut rng()).unwrap();
    let combinations: Vec<_> = moves(placement)
        .into_iter()
        .map(|m| match m {
            ConstructionMove::Composite(c) => {
                assert_eq!(c.len(), 2);
                c
            }
            other => panic!("unexpected move {other:?}"),
        })
        .collect();
    assert_eq!(combinations.len(), 6);
}

#[test]
fn test_placer_random_order_permutes_values() {
    let director = doubling_director(DoublingSolution::uninitialized(1));
    let mut placer = QueuedEntityPlacer::new(SelectionOrder::Random);

    let mut values: Vec<_> = moves(placer.next_placement(&director, &mut rng()).unwrap())
        .into_iter()
        .map(|m| match m {
            ConstructionMove::Change(m) => m.to_value().as_int().unwrap(),
            other => panic!("unexpected move {other:?}"),
        })
        .collect();
    values.sort_unstable();
    assert_eq!(values, vec![1, 2, 3]);
}

#[test]
fn test_placement_without_values_has_no_moves() {
    let director = routing_director(RoutingSolution::new(&[], &[1, 2]));
    let mut placer = QueuedEntityPlacer::default();

    let placement = placer.next_placement(&director, &mut rng()).unwrap();
    assert_eq!(moves(placement).len(), 0);
}

// Forager

fn scope(move_index: usize, score: i64) -> ConstructionMoveScope<DoublingSolution, usize> {
    ConstructionMoveScope::new(move_index, move_index, SimpleScore::of(score))
}

fn forager(
    pick_early_type: PickEarlyType,
    last_step_score: Option<i64>,
) -> DefaultConstructionForager<DoublingSolution, usize> {
    let mut forager = DefaultConstructionForager::new(pick_early_type);
    forager.step_started(0);
    forager.set_last_step_score(last_step_score.map(SimpleScore::of));
    forager
}

#[test]
fn test_forager_never_picks_highest_score() {
    let mut forager = forager(PickEarlyType::Never, Some(-1));
    for (index, score) in [-3, 0, -1, 0].into_iter().enumerate() {
        forager.add_move(scope(index, score));
    }
    assert!(!forager.is_quit_early());
    assert_eq!(forager.selected_move_count(), 4);
    assert_eq!(forager.pick_move().unwrap().move_index, 1);
}

#[test]
fn test_forager_first_non_deteriorating_score() {
    let mut forager = forager(PickEarlyType::FirstNonDeterioratingScore, Some(-2));
    forager.add_move(scope(0, -3));
    assert!(!forager.is_quit_early());
    forager.add_move(scope(1, -2));
    assert!(forager.is_quit_early());
    forager.add_move(scope(2, 0));

    assert_eq!(forager.selected_move_count(), 3);
    assert_eq!(forager.pick_move().unwrap().move_index, 1);
}

#[test]
fn test_forager_first_non_deteriorating_needs_last_step_score() {
    let mut forager = forager(PickEarlyType::FirstNonDeterioratingScore, None);
    forager.add_move(scope(0, 5));
    assert!(!forager.is_quit_early());
}

#[test]
fn test_forager_first_feasible_score() {
    let mut forager = forager(PickEarlyType::FirstFeasibleScore, None);
    forager.add_move(scope(0, -1));
    assert!(!forager.is_quit_early());
    forager.add_move(scope(1, 0));
    assert!(forager.is_quit_early());
    assert_eq!(forager.pick_move().unwrap().move_index, 1);
}

#[test]
fn test_forager_first_feasible_or_non_deteriorating_hard() {
    let mut forager = forager(
        PickEarlyType::FirstFeasibleScoreOrNonDeterioratingHard,
        Some(-2),
    );
    forager.add_move(scope(0, -3));
    assert!(!forager.is_quit_early());
    forager.add_move(scope(1, -1));
    assert!(forager.is_quit_early());
    assert_eq!(forager.pick_move().unwrap().move_index, 1);
}

#[test]
fn test_forager_ignores_init_score() {
    let mut forager = DefaultConstructionForager::<DoublingSolution, usize>::new(
        PickEarlyType::FirstNonDeterioratingScore,
    );
    forager.step_started(0);
    forager.set_last_step_score(Some(SimpleScore::of(-1).with_init_score(-2)));
    forager.add_move(ConstructionMoveScope::new(
        0,
        0,
        SimpleScore::of(-1).with_init_score(-1),
    ));
    assert!(forager.is_quit_early());
}

#[test]
fn test_forager_step_start_resets() {
    let mut forager = forager(PickEarlyType::FirstFeasibleScore, None);
    forager.add_move(scope(0, 0));
    assert!(forager.is_quit_early());

    forager.step_started(1);
    assert!(!forager.is_quit_early());
    assert_eq!(forager.selected_move_count(), 0);
    assert!(forager.pick_move().is_none());
}

// Phase

#[test]
fn test_construction_assigns_best_values() {
    let mut solver_scope = SolverScope::with_seed(doubling_director(DoublingSolution::uninitialized(4)), 0);
    solver_scope.start_solving();
    let mut phase = ConstructionHeuristicPhase::new(
        QueuedEntityPlacer::default(),
        single_threaded(PickEarlyType::Never),
        EvaluationAsserts::default(),
    );

    phase.solve(&mut solver_scope).unwrap();

    let solution = solver_scope.working_solution();
    assert_eq!(solution.values, vec![PlanningValue::Int(2); 4]);
    assert_eq!(solution.doubled, vec![PlanningValue::Int(4); 4]);
    assert_eq!(solution.score, Some(SimpleScore::of(0)));
    assert_eq!(solver_scope.total_step_count(), 4);
    assert_eq!(solver_scope.best_score(), Some(&SimpleScore::of(0)));
}

#[test]
fn test_construction_with_full_asserts() {
    let asserts = EvaluationAsserts::from_environment_mode(planwright_config::EnvironmentMode::FullAssert);
    let solution = RoutingSolution::new(&[0, 40], &[5, 38, 12, 44, 20]);
    let mut solver_scope = SolverScope::with_seed(routing_director(solution), 0);
    solver_scope.start_solving();
    let mut phase = ConstructionHeuristicPhase::new(
        QueuedEntityPlacer::default(),
        ConstructionHeuristicDecider::new(
            DefaultConstructionForager::new(PickEarlyType::Never),
            asserts,
        ),
        asserts,
    );

    phase.solve(&mut solver_scope).unwrap();

    let solution = solver_scope.working_solution();
    assert!(solution.customers.iter().all(|c| c.previous.is_assigned()));
    assert!(solution.customers.iter().all(|c| c.anchor.is_assigned()));
    assert_eq!(solution.chain(0).len() + solution.chain(1).len(), 5);
}

#[test]
fn test_multi_threaded_picks_like_single_threaded() {
    let solution = RoutingSolution::new(&[0, 50], &[3, 48, 10, 52, 1, 30, 27, 60]);

    let mut st_scope = SolverScope::with_seed(routing_director(solution.clone()), 0);
    st_scope.start_solving();
    ConstructionHeuristicPhase::new(
        QueuedEntityPlacer::default(),
        single_threaded(PickEarlyType::Never),
        EvaluationAsserts::default(),
    )
    .solve(&mut st_scope)
    .unwrap();

    let mut mt_scope = SolverScope::with_seed(routing_director(solution), 0);
    mt_scope.start_solving();
    ConstructionHeuristicPhase::new(
        QueuedEntityPlacer::default(),
        multi_threaded(2, 3, EvaluationAsserts::default()),
        EvaluationAsserts::default(),
    )
    .solve(&mut mt_scope)
    .unwrap();

    assert_eq!(mt_scope.working_solution(), st_scope.working_solution());
    assert_eq!(mt_scope.best_score(), st_scope.best_score());
    assert_eq!(mt_scope.total_step_count(), 8);
}

#[test]
fn test_multi_threaded_with_asserts_and_composites() {
    let asserts = EvaluationAsserts::from_environment_mode(planwright_config::EnvironmentMode::FullAssert);
    let mut solver_scope = SolverScope::with_seed(roster_director(3), 0);
    solver_scope.start_solving();
    let mut phase = ConstructionHeuristicPhase::new(
        QueuedEntityPlacer::default(),
        multi_threaded(3, 2, asserts),
        asserts,
    );

    phase.solve(&mut solver_scope).unwrap();

    assert_eq!(solver_scope.best_score(), Some(&SimpleScore::of(0)));
    // Only start 8 with length 8 ends at 16.
    for shift in &solver_scope.working_solution().shifts {
        assert_eq!(shift.start, PlanningValue::Int(8));
        assert_eq!(shift.length, PlanningValue::Int(8));
    }
    assert!(solver_scope.score_director().calculation_count() >= 18);
}

#[test]
fn test_construction_stops_without_doable_moves() {
    let mut solver_scope = SolverScope::with_seed(routing_director(RoutingSolution::new(&[], &[1, 2])), 0);
    solver_scope.start_solving();
    let mut phase = ConstructionHeuristicPhase::new(
        QueuedEntityPlacer::default(),
        single_threaded(PickEarlyType::Never),
        EvaluationAsserts::default(),
    );

    phase.solve(&mut solver_scope).unwrap();

    assert_eq!(solver_scope.total_step_count(), 0);
    assert!(solver_scope
        .working_solution()
        .customers
        .iter()
        .all(|c| !c.previous.is_assigned()));
}

#[test]
fn test_undoable_move_fails_the_phase() {
    let mut solver_scope = SolverScope::with_seed(doubling_director(DoublingSolution::uninitialized(1)), 0);
    solver_scope.start_solving();
    let mut phase = ConstructionHeuristicPhase::new(
        UnchangedValuePlacer::default(),
        single_threaded(PickEarlyType::Never),
        EvaluationAsserts::default(),
    );

    let err = phase.solve(&mut solver_scope).unwrap_err();
    assert!(matches!(err, SolverError::MoveNotDoable(_)), "{err:?}");
}

#[test]
fn test_undoable_move_fails_the_multi_threaded_phase() {
    let mut solver_scope = SolverScope::with_seed(doubling_director(DoublingSolution::uninitialized(1)), 0);
    solver_scope.start_solving();
    let mut phase = ConstructionHeuristicPhase::new(
        UnchangedValuePlacer::default(),
        multi_threaded(2, 4, EvaluationAsserts::default()),
        EvaluationAsserts::default(),
    );

    let err = phase.solve(&mut solver_scope).unwrap_err();
    assert!(matches!(err, SolverError::MoveNotDoable(_)), "{err:?}");
}

#[test]
fn test_listener_failure_fails_the_multi_threaded_phase() {
    let director = TypedScoreDirector::new(
        doubling::failing_descriptor(2),
        EasyScoreCalculator::new(doubling::calculate_score),
        DoublingSolution::uninitialized(3),
    )
    .unwrap();
    let mut solver_scope = SolverScope::with_seed(director, 0);
    solver_scope.start_solving();
    let mut phase = ConstructionHeuristicPhase::new(
        QueuedEntityPlacer::default(),
        multi_threaded(2, 4, EvaluationAsserts::default()),
        EvaluationAsserts::default(),
    );

    let err = phase.solve(&mut solver_scope).unwrap_err();
    assert!(matches!(err, SolverError::ListenerFailed { .. }), "{err:?}");
}

#[test]
fn test_terminate_early_stops_before_first_step() {
    let mut solver_scope = SolverScope::with_seed(doubling_director(DoublingSolution::uninitialized(3)), 0);
    solver_scope.start_solving();
    solver_scope
        .terminate_early_flag()
        .store(true, std::sync::atomic::Ordering::SeqCst);
    let mut phase = ConstructionHeuristicPhase::new(
        QueuedEntityPlacer::default(),
        multi_threaded(2, 4, EvaluationAsserts::default()),
        EvaluationAsserts::default(),
    );

    phase.solve(&mut solver_scope).unwrap();
    assert_eq!(solver_scope.total_step_count(), 0);
}

#[test]
fn test_roster_variable_ids_are_declared_in_order() {
    let descriptor = roster_descriptor();
    assert_eq!(
        descriptor.genuine_variables(),
        &[VariableId::new(0, 0), VariableId::new(0, 1)]
    );
}
