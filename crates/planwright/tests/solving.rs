//! End-to-end solving through the public entry points.

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use planwright::{
    run_solver_with_config, EasyScoreCalculator, EnvironmentMode, MoveThreadCount, PlanningValue,
    Score, SimpleScore, SolverConfig, SolverError, SolverFactory, TypedScoreDirector,
};
use planwright_config::PickEarlyType;
use planwright_solver::phase::construction::{
    ConstructionHeuristicDecider, ConstructionHeuristicPhase, DefaultConstructionForager,
    MultiThreadedConstructionHeuristicDecider, QueuedEntityPlacer,
};
use planwright_solver::{EvaluationAsserts, Solver};
use planwright_test::doubling::{self, DoublingSolution};
use planwright_test::init_test_logging;
use planwright_test::nqueens::{self, NQueensSolution};
use planwright_test::routing::{self, RoutingSolution};

type RoutingDirector = TypedScoreDirector<RoutingSolution, EasyScoreCalculator<RoutingSolution>>;
type DoublingDirector = TypedScoreDirector<DoublingSolution, EasyScoreCalculator<DoublingSolution>>;

static SLOW_CALCULATIONS: AtomicU64 = AtomicU64::new(0);

fn slow_doubling_score(solution: &DoublingSolution) -> SimpleScore {
    SLOW_CALCULATIONS.fetch_add(1, Ordering::SeqCst);
    thread::sleep(Duration::from_millis(3));
    doubling::calculate_score(solution)
}

fn routing_problem() -> RoutingSolution {
    RoutingSolution::new(&[0, 50, 100], &[3, 48, 97, 10, 52, 61, 1, 30, 88, 27])
}

fn routing_director(solution: RoutingSolution) -> RoutingDirector {
    TypedScoreDirector::new(
        routing::descriptor(),
        EasyScoreCalculator::new(routing::calculate_distance),
        solution,
    )
    .unwrap()
}

fn solve_doubling(config: &SolverConfig, n: usize) -> Result<DoublingSolution, SolverError> {
    run_solver_with_config(
        doubling::descriptor(),
        EasyScoreCalculator::new(doubling::calculate_score),
        DoublingSolution::uninitialized(n),
        config,
    )
}

fn assert_anchors_follow_chains(solution: &RoutingSolution) {
    let mut routed = 0;
    for depot in 0..solution.depots.len() {
        for customer in solution.chain(depot) {
            assert_eq!(
                solution.customers[customer].anchor,
                PlanningValue::Anchor(depot),
                "customer {customer}"
            );
            routed += 1;
        }
    }
    assert_eq!(routed, solution.customers.len());
}

#[test]
fn test_doubling_reaches_target() {
    init_test_logging();
    let solution = solve_doubling(&SolverConfig::new(), 5).unwrap();

    assert_eq!(solution.values, vec![PlanningValue::Int(2); 5]);
    assert_eq!(solution.doubled, vec![PlanningValue::Int(doubling::TARGET); 5]);
    assert_eq!(solution.score, Some(SimpleScore::of(0)));
}

#[test]
fn test_doubling_reaches_target_with_move_threads() {
    init_test_logging();
    let config = SolverConfig::new()
        .with_move_thread_count(MoveThreadCount::Count(3))
        .with_move_thread_buffer_size(2)
        .with_environment_mode(EnvironmentMode::FullAssert);
    let solution = solve_doubling(&config, 5).unwrap();

    assert_eq!(solution.values, vec![PlanningValue::Int(2); 5]);
    assert_eq!(solution.score, Some(SimpleScore::of(0)));
}

#[test]
fn test_multi_threaded_solution_equals_single_threaded() {
    init_test_logging();
    let asserts = EvaluationAsserts::default();

    let mut single: Solver<RoutingSolution, RoutingDirector> = Solver::new()
        .with_phase(Box::new(ConstructionHeuristicPhase::new(
            QueuedEntityPlacer::default(),
            ConstructionHeuristicDecider::new(
                DefaultConstructionForager::new(PickEarlyType::Never),
                asserts,
            ),
            asserts,
        )))
        .with_random_seed(0);
    let mut multi: Solver<RoutingSolution, RoutingDirector> = Solver::new()
        .with_phase(Box::new(ConstructionHeuristicPhase::new(
            QueuedEntityPlacer::default(),
            MultiThreadedConstructionHeuristicDecider::new(
                DefaultConstructionForager::new(PickEarlyType::Never),
                asserts,
                2,
                7,
                100,
            ),
            asserts,
        )))
        .with_random_seed(0);

    let expected = single.solve(routing_director(routing_problem())).unwrap();
    let actual = multi.solve(routing_director(routing_problem())).unwrap();

    assert_eq!(actual, expected);
    assert_anchors_follow_chains(&actual);
}

#[test]
fn test_nqueens_is_reproducible_across_move_threads() {
    init_test_logging();
    let solve = |move_thread_count| {
        let config = SolverConfig::new().with_move_thread_count(move_thread_count);
        run_solver_with_config(
            nqueens::create_nqueens_descriptor(),
            EasyScoreCalculator::new(nqueens::calculate_conflicts),
            NQueensSolution::uninitialized(8),
            &config,
        )
        .unwrap()
    };
    let rows = |solution: &NQueensSolution| -> Vec<Option<i64>> {
        solution.queens.iter().map(|q| q.row).collect()
    };

    let single = solve(MoveThreadCount::None);
    let multi = solve(MoveThreadCount::Count(4));

    assert!(single.queens.iter().all(|q| q.row.is_some()));
    assert_eq!(rows(&multi), rows(&single));
    assert_eq!(multi.score, single.score);
    assert_eq!(single.score, Some(nqueens::calculate_conflicts(&single)));
}

#[test]
fn test_routing_with_full_asserts_keeps_anchors_consistent() {
    init_test_logging();
    for move_thread_count in [MoveThreadCount::None, MoveThreadCount::Count(2)] {
        let config = SolverConfig::new()
            .with_environment_mode(EnvironmentMode::FullAssert)
            .with_move_thread_count(move_thread_count);
        let solution = run_solver_with_config(
            routing::descriptor(),
            EasyScoreCalculator::new(routing::calculate_distance),
            routing_problem(),
            &config,
        )
        .unwrap();

        assert_anchors_follow_chains(&solution);
        assert_eq!(solution.score, Some(routing::calculate_distance(&solution)));
    }
}

#[test]
fn test_listener_failure_is_fatal() {
    init_test_logging();
    for move_thread_count in [MoveThreadCount::None, MoveThreadCount::Count(2)] {
        let config = SolverConfig::new().with_move_thread_count(move_thread_count);
        let result = run_solver_with_config(
            doubling::failing_descriptor(2),
            EasyScoreCalculator::new(doubling::calculate_score),
            DoublingSolution::uninitialized(3),
            &config,
        );

        let err = result.unwrap_err();
        assert!(
            matches!(err, SolverError::ListenerFailed { .. }),
            "{move_thread_count:?}: {err:?}"
        );
    }
}

#[test]
fn test_step_count_limit_stops_construction() {
    init_test_logging();
    let config = SolverConfig::new().with_step_count_limit(2);
    let solution = solve_doubling(&config, 4).unwrap();

    assert_eq!(
        solution.values,
        vec![
            PlanningValue::Int(2),
            PlanningValue::Int(2),
            PlanningValue::Unassigned,
            PlanningValue::Unassigned,
        ]
    );
    assert_eq!(solution.score, Some(SimpleScore::of(0).with_init_score(-2)));
}

#[test]
fn test_config_from_toml() {
    init_test_logging();
    let config = SolverConfig::from_toml_str(
        r#"
        environment_mode = "fast_assert"
        random_seed = 11
        move_thread_count = { count = 2 }
        move_thread_buffer_size = 1

        [[phases]]
        type = "construction_heuristic"
        pick_early_type = "first_non_deteriorating_score"
        value_selection_order = "random"
        "#,
    )
    .unwrap();

    let solution = solve_doubling(&config, 6).unwrap();
    assert!(solution.values.iter().all(|v| v.is_assigned()));
    assert!(solution.score.is_some());
}

#[test]
fn test_invalid_best_score_limit_is_a_config_error() {
    let config = SolverConfig::from_toml_str(
        r#"
        [termination]
        best_score_limit = "not a score"
        "#,
    )
    .unwrap();

    let err = SolverFactory::<DoublingSolution>::new(config)
        .build_solver::<TypedScoreDirector<DoublingSolution, EasyScoreCalculator<DoublingSolution>>>()
        .unwrap_err();
    assert!(matches!(err, SolverError::Config(_)), "{err:?}");
}

#[test]
fn test_terminate_early_outside_solving_is_ignored() {
    let solver: Solver<RoutingSolution, RoutingDirector> = Solver::new();
    let handle = solver.handle();

    assert!(!handle.is_solving());
    assert!(!handle.terminate_early());
}

#[test]
fn test_terminate_early_stops_multi_threaded_solve() {
    init_test_logging();
    let config = SolverConfig::new().with_move_thread_count(MoveThreadCount::Count(2));
    let mut solver = SolverFactory::<DoublingSolution>::new(config)
        .build_solver::<DoublingDirector>()
        .unwrap();
    let director = TypedScoreDirector::new(
        doubling::descriptor(),
        EasyScoreCalculator::new(slow_doubling_score),
        DoublingSolution::uninitialized(200),
    )
    .unwrap();

    let handle = solver.handle();
    let terminator = thread::spawn(move || {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !handle.is_solving() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        thread::sleep(Duration::from_millis(50));
        (handle.terminate_early(), Instant::now())
    });

    let result = solver.solve(director);
    let returned_at = Instant::now();
    let (requested, requested_at) = terminator.join().unwrap();

    assert!(requested, "solve ended before terminate_early was requested");
    assert!(
        returned_at.duration_since(requested_at) < Duration::from_secs(2),
        "solve took {:?} to stop",
        returned_at.duration_since(requested_at)
    );
    assert!(!solver.is_solving());
    match result {
        Ok(solution) => assert!(solution.values.iter().any(|v| !v.is_assigned())),
        Err(err) => assert!(matches!(err, SolverError::Interrupted(_)), "{err:?}"),
    }

    // Stopped move threads calculate nothing more.
    let calculations = SLOW_CALCULATIONS.load(Ordering::SeqCst);
    thread::sleep(Duration::from_millis(100));
    assert_eq!(SLOW_CALCULATIONS.load(Ordering::SeqCst), calculations);
}
