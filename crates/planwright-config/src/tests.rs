//! Tests for solver configuration.

use super::*;

#[test]
fn test_toml_parsing() {
    let toml = r#"
        environment_mode = "full_assert"
        random_seed = 42
        move_thread_count = { count = 3 }
        move_thread_buffer_size = 7
        flush_step_interval = 25

        [termination]
        seconds_spent_limit = 30
        step_count_limit = 500

        [[phases]]
        type = "construction_heuristic"
        construction_heuristic_type = "allocate_entity_from_queue"
        pick_early_type = "first_non_deteriorating_score"
        value_selection_order = "random"
    "#;

    let config = SolverConfig::from_toml_str(toml).unwrap();
    assert_eq!(config.environment_mode, EnvironmentMode::FullAssert);
    assert_eq!(config.random_seed, Some(42));
    assert_eq!(config.move_thread_count, MoveThreadCount::Count(3));
    assert_eq!(config.selected_move_buffer_size(3), 21);
    assert_eq!(config.flush_step_interval(), 25);

    let termination = config.termination.unwrap();
    assert_eq!(termination.seconds_spent_limit, Some(30));
    assert_eq!(termination.step_count_limit, Some(500));

    assert_eq!(
        config.phases,
        vec![PhaseConfig::ConstructionHeuristic(ConstructionHeuristicConfig {
            construction_heuristic_type: ConstructionHeuristicType::AllocateEntityFromQueue,
            pick_early_type: PickEarlyType::FirstNonDeterioratingScore,
            value_selection_order: SelectionOrder::Random,
        })]
    );
}

#[test]
fn test_yaml_parsing() {
    let yaml = r#"
        environment_mode: reproducible
        random_seed: 42
        move_thread_count: auto
        termination:
          minutes_spent_limit: 2
          best_score_limit: "0hard/-10soft"
        phases:
          - type: construction_heuristic
            pick_early_type: first_feasible_score_or_non_deteriorating_hard
    "#;

    let config = SolverConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(config.environment_mode, EnvironmentMode::Reproducible);
    assert_eq!(config.move_thread_count, MoveThreadCount::Auto);
    assert_eq!(config.time_limit(), Some(Duration::from_secs(120)));
    assert_eq!(
        config.termination.unwrap().best_score_limit.as_deref(),
        Some("0hard/-10soft")
    );
    let PhaseConfig::ConstructionHeuristic(phase) = &config.phases[0];
    assert_eq!(
        phase.pick_early_type,
        PickEarlyType::FirstFeasibleScoreOrNonDeterioratingHard
    );
}

#[test]
fn test_defaults() {
    let config = SolverConfig::new();
    assert_eq!(config.environment_mode, EnvironmentMode::Reproducible);
    assert_eq!(config.move_thread_count, MoveThreadCount::None);
    assert_eq!(config.flush_step_interval(), DEFAULT_FLUSH_STEP_INTERVAL);
    assert_eq!(config.selected_move_buffer_size(2), 20);
    assert_eq!(config.effective_random_seed(), Some(DEFAULT_RANDOM_SEED));
    assert!(config.time_limit().is_none());
}

#[test]
fn test_non_reproducible_without_seed_uses_entropy() {
    let config = SolverConfig::new().with_environment_mode(EnvironmentMode::NonReproducible);
    assert_eq!(config.effective_random_seed(), None);
    assert_eq!(config.with_random_seed(7).effective_random_seed(), Some(7));
}

#[test]
fn test_resolve_move_thread_count() {
    let auto = SolverConfig::new().with_move_thread_count(MoveThreadCount::Auto);
    assert_eq!(auto.resolve_move_thread_count(16).unwrap(), Some(4));
    assert_eq!(auto.resolve_move_thread_count(5).unwrap(), Some(3));
    assert_eq!(auto.resolve_move_thread_count(3).unwrap(), None);

    let explicit = SolverConfig::new().with_move_thread_count(MoveThreadCount::Count(1));
    assert_eq!(explicit.resolve_move_thread_count(2).unwrap(), Some(1));

    assert_eq!(SolverConfig::new().resolve_move_thread_count(8).unwrap(), None);
}

#[test]
fn test_invalid_values_are_rejected() {
    for toml in [
        "move_thread_buffer_size = 0",
        "flush_step_interval = 0",
        "move_thread_count = { count = 0 }",
    ] {
        let err = SolverConfig::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "{toml}: {err}");
    }
}

#[test]
fn test_malformed_input_reports_format() {
    assert!(matches!(
        SolverConfig::from_toml_str("environment_mode = \"loud\""),
        Err(ConfigError::Toml(_))
    ));
    assert!(matches!(
        SolverConfig::from_yaml_str("phases: 3"),
        Err(ConfigError::Yaml(_))
    ));
}

#[test]
fn test_missing_file_is_io_error() {
    let err = SolverConfig::load("/nonexistent/planwright/solver.toml").unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
    let solver_error: SolverError = err.into();
    assert!(solver_error.is_configuration_error());
}

#[test]
fn test_builder() {
    let config = SolverConfig::new()
        .with_random_seed(123)
        .with_termination_seconds(60)
        .with_step_count_limit(10)
        .with_move_thread_buffer_size(4)
        .with_flush_step_interval(50)
        .with_phase(PhaseConfig::ConstructionHeuristic(
            ConstructionHeuristicConfig::default(),
        ));

    assert_eq!(config.random_seed, Some(123));
    assert_eq!(config.time_limit(), Some(Duration::from_secs(60)));
    assert_eq!(config.termination.as_ref().unwrap().step_count_limit, Some(10));
    assert_eq!(config.selected_move_buffer_size(2), 8);
    assert_eq!(config.flush_step_interval(), 50);
    assert_eq!(config.phases.len(), 1);
}

#[test]
fn test_environment_mode_asserts() {
    assert!(!EnvironmentMode::Reproducible.is_fast_asserted());
    assert!(EnvironmentMode::FastAssert.is_fast_asserted());
    assert!(!EnvironmentMode::FastAssert.is_full_asserted());
    assert!(EnvironmentMode::FullAssert.is_fast_asserted());
    assert!(EnvironmentMode::FullAssert.is_full_asserted());
}
