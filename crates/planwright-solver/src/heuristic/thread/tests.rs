//! Tests for the result queue and move threads.

use std::sync::atomic::AtomicBool;

use planwright_core::{PlanningValue, Result, Score, SimpleScore, SolverError};
use planwright_scoring::{EasyScoreCalculator, ScoreDirector, TypedScoreDirector};
use planwright_test::doubling::{self, DoublingSolution, VALUE};

use super::*;
use crate::heuristic::r#move::{ChangeMove, EvaluationAsserts, Move};

type DoublingDirector = TypedScoreDirector<DoublingSolution, EasyScoreCalculator<DoublingSolution>>;

fn director(solution: DoublingSolution) -> DoublingDirector {
    TypedScoreDirector::new(
        doubling::descriptor(),
        EasyScoreCalculator::new(doubling::calculate_score),
        solution,
    )
    .unwrap()
}

fn not_interrupted() -> AtomicBool {
    AtomicBool::new(false)
}

#[test]
fn test_take_returns_results_in_move_index_order() {
    let mut queue = OrderByMoveIndexQueue::<DoublingSolution, usize>::new(16);
    queue.start_next_step(3);
    let sender = queue.sender();

    rayon::scope(|scope| {
        for move_index in (0..10).rev() {
            let sender = sender.clone();
            scope.spawn(move |_| {
                sender.add_move(move_index % 2, 3, move_index, move_index, SimpleScore::of(0));
            });
        }
    });

    let interrupted = not_interrupted();
    let taken: Vec<usize> = (0..10)
        .map(|_| queue.take(&interrupted).unwrap().move_index)
        .collect();
    assert_eq!(taken, (0..10).collect::<Vec<_>>());
}

#[test]
fn test_take_drops_results_of_other_steps() {
    let mut queue = OrderByMoveIndexQueue::<DoublingSolution, &str>::new(8);
    let sender = queue.sender();
    queue.start_next_step(0);
    sender.add_move(0, 0, 0, "step 0, move 0", SimpleScore::of(-1));
    sender.add_move(1, 0, 1, "step 0, move 1", SimpleScore::of(-2));

    let interrupted = not_interrupted();
    assert_eq!(queue.take(&interrupted).unwrap().mv, "step 0, move 0");

    // Step 0 quit early; its second result is still queued.
    queue.start_next_step(1);
    sender.add_undoable_move(0, 1, 0, "step 1, move 0");
    let result = queue.take(&interrupted).unwrap();
    assert_eq!(result.mv, "step 1, move 0");
    assert!(!result.is_doable());
}

#[test]
fn test_take_returns_thread_errors_unchanged() {
    let mut queue = OrderByMoveIndexQueue::<DoublingSolution, ()>::new(4);
    let sender = queue.sender();
    queue.start_next_step(0);

    let error = SolverError::ListenerFailed {
        listener: "doubled".to_string(),
        message: "boom".to_string(),
    };
    sender.add_error(error.clone());
    assert_eq!(queue.take(&not_interrupted()).unwrap_err(), error);
}

#[test]
fn test_take_is_interrupted_while_waiting() {
    let mut queue = OrderByMoveIndexQueue::<DoublingSolution, ()>::new(4);
    queue.start_next_step(0);

    let err = queue.take(&AtomicBool::new(true)).unwrap_err();
    assert!(matches!(err, SolverError::Interrupted(_)), "{err}");
}

#[test]
fn test_take_before_first_step_is_invalid() {
    let mut queue = OrderByMoveIndexQueue::<DoublingSolution, ()>::new(4);
    assert!(matches!(
        queue.take(&not_interrupted()),
        Err(SolverError::InvalidState(_))
    ));
}

#[test]
fn test_pool_evaluates_and_applies_steps() {
    let parent = director(DoublingSolution::uninitialized(2));
    let mut pool = MoveThreadPool::start(&parent, 2, 6, EvaluationAsserts::default()).unwrap();
    assert_eq!(pool.thread_count(), 2);
    let interrupted = not_interrupted();

    pool.results().unwrap().start_next_step(0);
    for (move_index, value) in [1, 2, 3].into_iter().enumerate() {
        pool.evaluate(0, move_index, ChangeMove::new(VALUE, 0, PlanningValue::Int(value)))
            .unwrap();
    }
    let scores: Vec<_> = (0..3)
        .map(|_| pool.results().unwrap().take(&interrupted).unwrap().score)
        .collect();
    // Entity 1 is still unassigned.
    assert_eq!(
        scores,
        vec![
            Some(SimpleScore::of(-2).with_init_score(-1)),
            Some(SimpleScore::of(0).with_init_score(-1)),
            Some(SimpleScore::of(-2).with_init_score(-1)),
        ]
    );

    let step = ChangeMove::new(VALUE, 0, PlanningValue::Int(2));
    pool.apply_step(1, &step, SimpleScore::of(0).with_init_score(-1))
        .unwrap();

    pool.results().unwrap().start_next_step(1);
    pool.evaluate(1, 0, step).unwrap();
    pool.evaluate(1, 1, ChangeMove::new(VALUE, 1, PlanningValue::Int(3)))
        .unwrap();
    let undoable = pool.results().unwrap().take(&interrupted).unwrap();
    assert!(!undoable.is_doable());
    let scored = pool.results().unwrap().take(&interrupted).unwrap();
    assert_eq!(scored.score, Some(SimpleScore::of(-2)));

    assert!(pool.shutdown() >= 5);
}

#[test]
fn test_pool_asserted_threads_stay_consistent() {
    let parent = director(DoublingSolution::uninitialized(3));
    let asserts = EvaluationAsserts {
        move_score_from_scratch: true,
        expected_undo_move_score: true,
        step_score_from_scratch: true,
        expected_step_score: true,
        shadow_variables_not_stale: true,
    };
    let mut pool = MoveThreadPool::start(&parent, 3, 3, asserts).unwrap();
    let interrupted = not_interrupted();

    for step_index in 0..3u64 {
        let entity = step_index as usize;
        pool.results().unwrap().start_next_step(step_index);
        for value in 1..=3 {
            pool.evaluate(
                step_index,
                (value - 1) as usize,
                ChangeMove::new(VALUE, entity, PlanningValue::Int(value)),
            )
            .unwrap();
        }
        for _ in 0..3 {
            assert!(pool.results().unwrap().take(&interrupted).unwrap().is_doable());
        }
        let step = ChangeMove::new(VALUE, entity, PlanningValue::Int(2));
        let unassigned = 2 - step_index as i32;
        pool.apply_step(
            step_index + 1,
            &step,
            SimpleScore::of(0).with_init_score(-unassigned),
        )
        .unwrap();
    }
    pool.shutdown();
}

#[test]
fn test_failed_thread_reports_its_error_and_still_shuts_down() {
    let parent = TypedScoreDirector::new(
        doubling::failing_descriptor(3),
        EasyScoreCalculator::new(doubling::calculate_score),
        DoublingSolution::uninitialized(1),
    )
    .unwrap();
    let mut pool = MoveThreadPool::start(&parent, 2, 4, EvaluationAsserts::default()).unwrap();
    let interrupted = not_interrupted();

    pool.results().unwrap().start_next_step(0);
    pool.evaluate(0, 0, ChangeMove::new(VALUE, 0, PlanningValue::Int(3)))
        .unwrap();
    let err = pool.results().unwrap().take(&interrupted).unwrap_err();
    assert!(matches!(err, SolverError::ListenerFailed { .. }), "{err}");

    // The failed thread still meets the step barrier.
    pool.clear_pending();
    let step = ChangeMove::new(VALUE, 0, PlanningValue::Int(1));
    pool.apply_step(1, &step, SimpleScore::of(-2)).unwrap();
    pool.shutdown();
}

#[derive(Debug, Clone)]
struct PanickingMove;

impl Move<DoublingSolution> for PanickingMove {
    fn is_doable<D: ScoreDirector<DoublingSolution>>(&self, _: &D) -> bool {
        true
    }

    fn create_undo_move<D: ScoreDirector<DoublingSolution>>(&self, _: &D) -> Self {
        PanickingMove
    }

    fn do_move_only<D: ScoreDirector<DoublingSolution>>(&self, _: &mut D) -> Result<()> {
        panic!("corrupted move");
    }
}

#[test]
fn test_panicking_move_becomes_worker_failure() {
    let parent = director(DoublingSolution::uninitialized(1));
    let mut pool = MoveThreadPool::start(&parent, 1, 2, EvaluationAsserts::default()).unwrap();

    pool.results().unwrap().start_next_step(0);
    pool.evaluate(0, 0, PanickingMove).unwrap();
    let err = pool.results().unwrap().take(&not_interrupted()).unwrap_err();
    match err {
        SolverError::WorkerFailed { thread, message } => {
            assert_eq!(thread, 0);
            assert!(message.contains("corrupted move"));
        }
        other => panic!("unexpected error: {other}"),
    }
    pool.shutdown();
}

#[test]
fn test_dropped_pool_stops_its_threads() {
    let parent = director(DoublingSolution::uninitialized(1));
    let pool =
        MoveThreadPool::<DoublingSolution, ChangeMove>::start(&parent, 2, 2, EvaluationAsserts::default())
            .unwrap();
    drop(pool);
}
