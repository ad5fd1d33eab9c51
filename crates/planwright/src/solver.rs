//! Solver entry point that hides all internal wiring.

use std::sync::Arc;

use planwright_config::SolverConfig;
use planwright_core::{ParseableScore, PlanningSolution, Result, SolutionDescriptor};
use planwright_scoring::{ScoreCalculator, TypedScoreDirector};
use planwright_solver::SolverFactory;

/// Solves `solution` with the configuration in `solver.toml`, or the
/// default configuration when that file is missing or unreadable.
pub fn run_solver<S, C>(
    descriptor: Arc<SolutionDescriptor<S>>,
    calculator: C,
    solution: S,
) -> Result<S>
where
    S: PlanningSolution,
    S::Score: ParseableScore,
    C: ScoreCalculator<S> + 'static,
{
    let config = SolverConfig::load("solver.toml").unwrap_or_default();
    run_solver_with_config(descriptor, calculator, solution, &config)
}

/// Solves `solution` on a fresh [`TypedScoreDirector`] with the phases
/// and terminations of `config`.
///
/// # Example
///
/// ```
/// use planwright::run_solver_with_config;
/// use planwright_config::SolverConfig;
/// use planwright_core::PlanningValue;
/// use planwright_scoring::EasyScoreCalculator;
/// use planwright_test::doubling::{self, DoublingSolution};
///
/// let solution = run_solver_with_config(
///     doubling::descriptor(),
///     EasyScoreCalculator::new(doubling::calculate_score),
///     DoublingSolution::uninitialized(3),
///     &SolverConfig::new(),
/// )
/// .unwrap();
/// assert_eq!(solution.values, vec![PlanningValue::Int(2); 3]);
/// ```
pub fn run_solver_with_config<S, C>(
    descriptor: Arc<SolutionDescriptor<S>>,
    calculator: C,
    solution: S,
    config: &SolverConfig,
) -> Result<S>
where
    S: PlanningSolution,
    S::Score: ParseableScore,
    C: ScoreCalculator<S> + 'static,
{
    #[cfg(feature = "console")]
    crate::console::init();

    let director = TypedScoreDirector::new(descriptor, calculator, solution)?;
    let mut solver = SolverFactory::<S>::new(config.clone())
        .build_solver::<TypedScoreDirector<S, C>>()?;
    solver.solve(director)
}
