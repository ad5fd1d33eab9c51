//! Tests for termination conditions.

use std::time::Duration;

use planwright_config::TerminationConfig;
use planwright_core::{PlanningValue, SimpleScore, SolverError};
use planwright_scoring::{EasyScoreCalculator, ScoreDirector, TypedScoreDirector};
use planwright_test::doubling::{self, DoublingSolution, VALUE};

use super::*;
use crate::scope::SolverScope;

type DoublingDirector = TypedScoreDirector<DoublingSolution, EasyScoreCalculator<DoublingSolution>>;
type DoublingScope = SolverScope<DoublingSolution, DoublingDirector>;
type BoxedTermination = Box<dyn Termination<DoublingSolution, DoublingDirector>>;

fn create_test_scope(items: usize) -> DoublingScope {
    let director = TypedScoreDirector::new(
        doubling::descriptor(),
        EasyScoreCalculator::new(doubling::calculate_score),
        DoublingSolution::uninitialized(items),
    )
    .unwrap();
    SolverScope::new(director)
}

/// A scope whose best solution holds `values` on its first items.
fn create_scope_with_best(items: usize, values: &[i64]) -> DoublingScope {
    let mut scope = create_test_scope(items);
    for (item, &value) in values.iter().enumerate() {
        scope
            .score_director_mut()
            .change_variable(VALUE, item, PlanningValue::Int(value))
            .unwrap();
    }
    scope.calculate_score().unwrap();
    scope.update_best_solution().unwrap();
    scope
}

fn build(config: TerminationConfig) -> Option<BoxedTermination> {
    build_termination::<DoublingSolution, DoublingDirector>(&config).unwrap()
}

#[test]
fn test_step_count_termination_and_gradient() {
    let mut scope = create_test_scope(1);
    let term = StepCountTermination::new(4);

    assert!(!term.is_solver_terminated(&scope));
    assert_eq!(term.time_gradient(&scope), Some(0.0));
    scope.increment_step_count();
    assert_eq!(term.time_gradient(&scope), Some(0.25));
    for _ in 0..3 {
        scope.increment_step_count();
    }
    assert!(term.is_solver_terminated(&scope));
    assert_eq!(term.time_gradient(&scope), Some(1.0));

    scope.increment_step_count();
    assert_eq!(term.time_gradient(&scope), Some(1.0));
}

#[test]
fn test_time_termination_counts_from_solving_start() {
    let mut scope = create_test_scope(1);
    let instant = TimeTermination::new(Duration::ZERO);
    let hour = TimeTermination::new(Duration::from_secs(3600));

    assert!(!instant.is_solver_terminated(&scope));
    assert_eq!(hour.time_gradient(&scope), None);

    scope.start_solving();
    assert!(instant.is_solver_terminated(&scope));
    assert_eq!(instant.time_gradient(&scope), Some(1.0));
    assert!(!hour.is_solver_terminated(&scope));
    assert!(hour.time_gradient(&scope).is_some_and(|g| g < 0.01));
}

#[test]
fn test_best_score_termination_needs_initialized_best() {
    let term = BestScoreTermination::new(SimpleScore::of(0));

    assert!(!term.is_solver_terminated(&create_test_scope(2)));
    assert!(!term.is_solver_terminated(&create_scope_with_best(2, &[1, 1])));
    // Item 1 is unassigned, so the best score carries an init score.
    assert!(!term.is_solver_terminated(&create_scope_with_best(2, &[2])));
    assert!(term.is_solver_terminated(&create_scope_with_best(2, &[2, 2])));
    assert_eq!(term.time_gradient(&create_test_scope(1)), None);
}

#[test]
fn test_or_termination_takes_first_limit_and_largest_gradient() {
    let mut scope = create_test_scope(1);
    let or = OrTermination::new(vec![
        Box::new(TimeTermination::new(Duration::from_secs(3600))) as BoxedTermination,
        Box::new(StepCountTermination::new(2)),
    ]);
    assert_eq!(or.len(), 2);

    scope.start_solving();
    scope.increment_step_count();
    assert!(!or.is_solver_terminated(&scope));
    assert_eq!(or.time_gradient(&scope), Some(0.5));
    scope.increment_step_count();
    assert!(or.is_solver_terminated(&scope));

    let empty: OrTermination<DoublingSolution, DoublingDirector> = OrTermination::new(Vec::new());
    assert!(empty.is_empty());
    assert!(!empty.is_solver_terminated(&scope));
    assert_eq!(empty.time_gradient(&scope), None);
}

#[test]
fn test_build_termination_from_config() {
    assert!(build(TerminationConfig::default()).is_none());

    let mut scope = create_test_scope(1);
    let single = build(TerminationConfig {
        step_count_limit: Some(1),
        ..Default::default()
    })
    .unwrap();
    scope.increment_step_count();
    assert!(single.is_solver_terminated(&scope));

    let combined = build(TerminationConfig {
        minutes_spent_limit: Some(60),
        step_count_limit: Some(3),
        best_score_limit: Some("0".to_string()),
        ..Default::default()
    })
    .unwrap();
    scope.start_solving();
    assert!(!combined.is_solver_terminated(&scope));
    assert!(combined.is_solver_terminated(&create_scope_with_best(1, &[2])));
}

#[test]
fn test_build_termination_rejects_unparseable_score() {
    let config = TerminationConfig {
        best_score_limit: Some("zero".to_string()),
        ..Default::default()
    };
    let err = build_termination::<DoublingSolution, DoublingDirector>(&config).unwrap_err();
    assert!(matches!(err, SolverError::Config(_)), "{err}");
}

#[test]
fn test_solver_scope_reports_gradient_of_its_termination() {
    assert_eq!(create_test_scope(1).time_gradient(), None);

    let mut scope = create_test_scope(1).with_termination(Box::new(StepCountTermination::new(4)));
    scope.increment_step_count();
    assert_eq!(scope.time_gradient(), Some(0.25));
}
