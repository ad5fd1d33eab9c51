//! Tests for the score director mutation protocol.

use std::sync::Arc;

use planwright_core::{PlanningValue, Score, SimpleScore, SolverError};
use planwright_test::doubling::{self, DoublingSolution, VALUE};

use super::{DirectorState, ScoreDirector, ScoreDirectorFactory, TypedScoreDirector};
use crate::calculator::{ConstraintScoreCalculator, EasyScoreCalculator, EntityConstraint, WeightedSumInliner};

type EasyDirector = TypedScoreDirector<DoublingSolution, EasyScoreCalculator<DoublingSolution>>;

fn director(solution: DoublingSolution) -> EasyDirector {
    TypedScoreDirector::new(
        doubling::descriptor(),
        EasyScoreCalculator::new(doubling::calculate_score),
        solution,
    )
    .unwrap()
}

#[test]
fn test_director_is_born_ready_with_fresh_shadows() {
    let director = director(DoublingSolution::with_values(&[Some(1), Some(3), None]));
    assert_eq!(director.state(), DirectorState::Ready);
    assert_eq!(
        director.working_solution().doubled,
        vec![PlanningValue::Int(2), PlanningValue::Int(6), PlanningValue::Unassigned]
    );
    assert_eq!(director.working_init_score(), -1);
}

#[test]
fn test_change_triggers_listeners_eagerly() {
    let mut director = director(DoublingSolution::uninitialized(3));
    director.change_variable(VALUE, 1, PlanningValue::Int(2)).unwrap();

    assert_eq!(director.working_solution().doubled[1], PlanningValue::Int(4));
    let score = director.calculate_score().unwrap();
    assert_eq!(score, SimpleScore::of(0).with_init_score(-2));
    assert_eq!(director.working_solution().score, Some(score));
}

#[test]
fn test_batch_defers_listeners_until_closed() {
    let mut director = director(DoublingSolution::uninitialized(2));
    director.open_batch();
    director.change_variable(VALUE, 0, PlanningValue::Int(3)).unwrap();
    director.change_variable(VALUE, 1, PlanningValue::Int(1)).unwrap();
    assert_eq!(director.working_solution().doubled[0], PlanningValue::Unassigned);

    let err = director.calculate_score().unwrap_err();
    assert!(err.is_corruption());
    assert!(matches!(err, SolverError::NotificationQueueNotEmpty { .. }));

    director.close_batch().unwrap();
    assert_eq!(director.working_solution().doubled[0], PlanningValue::Int(6));
    assert_eq!(director.calculate_score().unwrap(), SimpleScore::of(-4));
}

#[test]
fn test_close_batch_without_open_fails() {
    let mut director = director(DoublingSolution::uninitialized(1));
    assert!(matches!(director.close_batch(), Err(SolverError::InvalidState(_))));
}

#[test]
fn test_nested_mutation_of_same_variable_fails() {
    let mut director = director(DoublingSolution::uninitialized(2));
    director.before_variable_changed(VALUE, 0).unwrap();
    assert_eq!(director.state(), DirectorState::Mutating);

    let err = director.before_variable_changed(VALUE, 0).unwrap_err();
    match err {
        SolverError::InvalidState(message) => assert!(message.contains("Item.value[0]")),
        other => panic!("unexpected error: {other}"),
    }

    // Another entity may be mid-change at the same time.
    director.before_variable_changed(VALUE, 1).unwrap();
    director.after_variable_changed(VALUE, 1).unwrap();
    director.after_variable_changed(VALUE, 0).unwrap();
    assert_eq!(director.state(), DirectorState::Ready);
}

#[test]
fn test_after_without_before_fails() {
    let mut director = director(DoublingSolution::uninitialized(1));
    assert!(matches!(
        director.after_variable_changed(VALUE, 0),
        Err(SolverError::InvalidState(_))
    ));
}

#[test]
fn test_score_rejected_while_mutating() {
    let mut director = director(DoublingSolution::uninitialized(1));
    director.before_variable_changed(VALUE, 0).unwrap();
    assert!(matches!(director.calculate_score(), Err(SolverError::InvalidState(_))));
}

#[test]
fn test_set_working_solution_recomputes_everything() {
    let mut director = director(DoublingSolution::uninitialized(2));
    director.calculate_score().unwrap();
    assert_eq!(director.working_init_score(), -2);

    director
        .set_working_solution(DoublingSolution::with_values(&[Some(2), Some(2)]))
        .unwrap();
    assert_eq!(director.working_init_score(), 0);
    assert_eq!(director.working_solution().doubled, vec![PlanningValue::Int(4); 2]);
    assert_eq!(director.calculate_score().unwrap(), SimpleScore::of(0));
}

#[test]
fn test_stale_shadow_is_detected() {
    let mut director = director(DoublingSolution::with_values(&[Some(1), Some(2)]));
    director.assert_shadow_variables_are_not_stale("setup").unwrap();

    director.working_solution_mut().doubled[1] = PlanningValue::Int(5);
    let err = director.assert_shadow_variables_are_not_stale("step 3").unwrap_err();
    assert_eq!(
        err,
        SolverError::ShadowCorruption {
            context: "step 3".to_string(),
            entity: "Item".to_string(),
            index: 1,
            variable: "doubled".to_string(),
            expected: "4".to_string(),
            actual: "5".to_string(),
        }
    );
}

#[test]
fn test_working_score_from_scratch() {
    let mut director = director(DoublingSolution::with_values(&[Some(3), None]));
    let score = director.calculate_score().unwrap();
    director.assert_working_score_from_scratch(&score, "step 0").unwrap();

    let wrong = SimpleScore::of(7).with_init_score(-1);
    let err = director.assert_working_score_from_scratch(&wrong, "step 0").unwrap_err();
    assert!(matches!(err, SolverError::ScoreCorruption { ref expected, .. } if *expected == score.to_string()));
}

#[test]
fn test_undo_restores_score() {
    let mut director = director(DoublingSolution::with_values(&[Some(1)]));
    let before = director.calculate_score().unwrap();
    director.change_variable(VALUE, 0, PlanningValue::Int(3)).unwrap();
    director.calculate_score().unwrap();
    director.change_variable(VALUE, 0, PlanningValue::Int(1)).unwrap();
    director.assert_expected_undo_move_score(&before, "change").unwrap();

    director.change_variable(VALUE, 0, PlanningValue::Int(2)).unwrap();
    let err = director.assert_expected_undo_move_score(&before, "change").unwrap_err();
    assert!(matches!(err, SolverError::ScoreCorruption { ref context, .. } if context == "undoing change"));
}

#[test]
fn test_child_director_is_independent() {
    let mut parent = director(DoublingSolution::uninitialized(2));
    let mut child = parent.create_child_thread_director().unwrap();
    assert!(Arc::ptr_eq(parent.descriptor(), child.descriptor()));

    child.change_variable(VALUE, 0, PlanningValue::Int(2)).unwrap();
    assert_eq!(child.working_solution().doubled[0], PlanningValue::Int(4));
    assert_eq!(parent.working_solution().doubled[0], PlanningValue::Unassigned);
    assert_eq!(child.calculation_count(), 0);
    parent.calculate_score().unwrap();
    assert_eq!(parent.calculation_count(), 1);
}

#[test]
fn test_disposed_director_rejects_operations() {
    let mut director = director(DoublingSolution::uninitialized(1));
    director.dispose();
    assert_eq!(director.state(), DirectorState::Disposed);
    assert!(director.calculate_score().is_err());
    assert!(director.change_variable(VALUE, 0, PlanningValue::Int(1)).is_err());
}

#[test]
fn test_failing_listener_is_fatal() {
    let mut director = TypedScoreDirector::new(
        doubling::failing_descriptor(3),
        EasyScoreCalculator::new(doubling::calculate_score),
        DoublingSolution::uninitialized(1),
    )
    .unwrap();
    director.change_variable(VALUE, 0, PlanningValue::Int(2)).unwrap();

    let err = director.change_variable(VALUE, 0, PlanningValue::Int(3)).unwrap_err();
    match err {
        SolverError::ListenerFailed { listener, message } => {
            assert_eq!(listener, "Item.doubled");
            assert!(message.contains("refusing to double 3"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_entity_added_counts_uninitialized() {
    let mut director = director(DoublingSolution::with_values(&[Some(2)]));
    assert_eq!(director.working_init_score(), 0);

    director.before_entity_added(0, 1).unwrap();
    director.working_solution_mut().values.push(PlanningValue::Unassigned);
    director.working_solution_mut().doubled.push(PlanningValue::Unassigned);
    director.after_entity_added(0, 1).unwrap();
    assert_eq!(director.working_init_score(), -1);

    director.before_entity_removed(0, 1).unwrap();
    director.working_solution_mut().values.pop();
    director.working_solution_mut().doubled.pop();
    director.after_entity_removed(0, 1).unwrap();
    assert_eq!(director.working_init_score(), 0);
}

#[test]
fn test_constraint_backend_observes_shadow_writes() {
    let calculator = ConstraintScoreCalculator::new(
        vec![EntityConstraint::new(
            "doubled near target",
            0,
            SimpleScore::of(-1),
            doubling::item_penalty,
        )],
        doubling::entity_count,
        WeightedSumInliner::boxed,
    );
    let factory = ScoreDirectorFactory::new(doubling::descriptor(), calculator);
    let mut director = factory
        .build_score_director(DoublingSolution::uninitialized(3))
        .unwrap();
    assert!(director.requires_flushing());

    for (item, value) in [(0, 1), (1, 3), (2, 2), (0, 2)] {
        director
            .change_variable(VALUE, item, PlanningValue::Int(value))
            .unwrap();
        let score = director.calculate_score().unwrap();
        director.assert_working_score_from_scratch(&score, "change").unwrap();
    }
    assert_eq!(director.calculate_score().unwrap(), SimpleScore::of(-2));
    assert_eq!(director.working_solution().doubled[2], PlanningValue::Int(4));
}

#[test]
fn test_add_calculation_count() {
    let mut director = director(DoublingSolution::uninitialized(1));
    director.calculate_score().unwrap();
    director.add_calculation_count(41);
    assert_eq!(director.calculation_count(), 42);
}
