//! Solver implementation.

use std::fmt::{self, Debug};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use planwright_config::{ConfigError, ConstructionHeuristicConfig, PhaseConfig, SolverConfig};
use planwright_core::{ParseableScore, PlanningSolution, Result, SolverError};
use planwright_scoring::ScoreDirector;
use tracing::{debug, info};

use crate::heuristic::r#move::{ConstructionMove, EvaluationAsserts};
use crate::phase::construction::{
    ConstructionHeuristicDecider, ConstructionHeuristicPhase, DefaultConstructionForager,
    MultiThreadedConstructionHeuristicDecider, QueuedEntityPlacer,
};
use crate::phase::Phase;
use crate::scope::SolverScope;
use crate::termination::{build_termination, Termination};

/// Runs its phases, in order, on a score director.
///
/// # Type Parameters
/// * `S` - The planning solution type
/// * `D` - The score director type
///
/// # Example
///
/// ```
/// use planwright_core::{PlanningValue, SimpleScore};
/// use planwright_scoring::{EasyScoreCalculator, TypedScoreDirector};
/// use planwright_solver::heuristic::EvaluationAsserts;
/// use planwright_solver::phase::construction::{
///     ConstructionHeuristicDecider, ConstructionHeuristicPhase, DefaultConstructionForager,
///     QueuedEntityPlacer,
/// };
/// use planwright_solver::Solver;
/// use planwright_test::doubling::{self, DoublingSolution};
///
/// type Director = TypedScoreDirector<DoublingSolution, EasyScoreCalculator<DoublingSolution>>;
///
/// let director = TypedScoreDirector::new(
///     doubling::descriptor(),
///     EasyScoreCalculator::new(doubling::calculate_score),
///     DoublingSolution::uninitialized(2),
/// )
/// .unwrap();
///
/// let phase = ConstructionHeuristicPhase::new(
///     QueuedEntityPlacer::default(),
///     ConstructionHeuristicDecider::new(
///         DefaultConstructionForager::new(Default::default()),
///         EvaluationAsserts::default(),
///     ),
///     EvaluationAsserts::default(),
/// );
/// let mut solver: Solver<DoublingSolution, Director> =
///     Solver::new().with_phase(Box::new(phase)).with_random_seed(0);
///
/// let solution = solver.solve(director).unwrap();
/// assert_eq!(solution.values, vec![PlanningValue::Int(2); 2]);
/// assert_eq!(solution.score, Some(SimpleScore::of(0)));
/// ```
pub struct Solver<S: PlanningSolution, D: ScoreDirector<S>> {
    phases: Vec<Box<dyn Phase<S, D>>>,
    termination: Option<Box<dyn Termination<S, D>>>,
    random_seed: Option<u64>,
    terminate_early_flag: Arc<AtomicBool>,
    solving: Arc<AtomicBool>,
}

impl<S: PlanningSolution, D: ScoreDirector<S>> Solver<S, D> {
    /// Creates a solver without phases, termination or seed.
    pub fn new() -> Self {
        Self {
            phases: Vec::new(),
            termination: None,
            random_seed: None,
            terminate_early_flag: Arc::new(AtomicBool::new(false)),
            solving: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_phase(mut self, phase: Box<dyn Phase<S, D>>) -> Self {
        self.phases.push(phase);
        self
    }

    pub fn with_termination(mut self, termination: Box<dyn Termination<S, D>>) -> Self {
        self.termination = Some(termination);
        self
    }

    /// Seeds the random source; without a seed it comes from the OS.
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    pub fn phase_count(&self) -> usize {
        self.phases.len()
    }

    /// A handle that stops this solver from another thread.
    pub fn handle(&self) -> SolverHandle {
        SolverHandle {
            terminate_early_flag: Arc::clone(&self.terminate_early_flag),
            solving: Arc::clone(&self.solving),
        }
    }

    /// Returns true if the solver is currently solving.
    pub fn is_solving(&self) -> bool {
        self.solving.load(Ordering::SeqCst)
    }

    /// Solves the working solution of `score_director`.
    ///
    /// Returns the best solution found. A solution is never returned after
    /// an error: corruption, listener and worker failures all end solving.
    pub fn solve(&mut self, score_director: D) -> Result<S> {
        self.solving.store(true, Ordering::SeqCst);
        self.terminate_early_flag.store(false, Ordering::SeqCst);

        let solver_scope = match self.random_seed {
            Some(seed) => SolverScope::with_seed(score_director, seed),
            None => SolverScope::new(score_director),
        };
        let mut solver_scope =
            solver_scope.with_terminate_early_flag(Arc::clone(&self.terminate_early_flag));
        if let Some(termination) = self.termination.take() {
            solver_scope = solver_scope.with_termination(termination);
        }

        let solved = self.run_phases(&mut solver_scope);
        self.termination = solver_scope.take_termination();
        solver_scope.score_director_mut().dispose();
        self.solving.store(false, Ordering::SeqCst);
        solved?;
        Ok(solver_scope.take_best_or_working_solution())
    }

    fn run_phases(&mut self, solver_scope: &mut SolverScope<S, D>) -> Result<()> {
        solver_scope.start_solving();
        solver_scope.score_director_mut().solving_started();
        let initial_score = solver_scope.calculate_score()?;
        solver_scope.update_best_solution()?;
        info!(
            event = "solve_start",
            phases = self.phases.len(),
            score = %initial_score,
        );

        for phase in &mut self.phases {
            if solver_scope.is_terminated() {
                debug!(event = "phase_skipped", phase = phase.phase_type_name());
                continue;
            }
            phase.solve(solver_scope)?;
        }

        solver_scope.score_director_mut().solving_ended();
        info!(
            event = "solve_end",
            steps = solver_scope.total_step_count(),
            calculation_count = solver_scope.score_director().calculation_count(),
            best_score = ?solver_scope.best_score(),
            duration_ms = solver_scope
                .elapsed()
                .map_or(0, |elapsed| elapsed.as_millis() as u64),
        );
        Ok(())
    }
}

impl<S: PlanningSolution, D: ScoreDirector<S>> Default for Solver<S, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: PlanningSolution, D: ScoreDirector<S>> Debug for Solver<S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Solver")
            .field("phases", &self.phases)
            .field("termination", &self.termination)
            .field("random_seed", &self.random_seed)
            .finish()
    }
}

/// Requests early termination of a running solver.
///
/// A request only counts while the solver is solving; each solve starts
/// with the flag cleared.
#[derive(Debug, Clone)]
pub struct SolverHandle {
    terminate_early_flag: Arc<AtomicBool>,
    solving: Arc<AtomicBool>,
}

impl SolverHandle {
    /// Returns true if the request reached a solving solver.
    pub fn terminate_early(&self) -> bool {
        if self.solving.load(Ordering::SeqCst) {
            self.terminate_early_flag.store(true, Ordering::SeqCst);
            true
        } else {
            false
        }
    }

    pub fn is_solving(&self) -> bool {
        self.solving.load(Ordering::SeqCst)
    }
}

/// Builds solvers from a [`SolverConfig`].
///
/// # Example
///
/// ```
/// use planwright_config::SolverConfig;
/// use planwright_scoring::{EasyScoreCalculator, TypedScoreDirector};
/// use planwright_solver::SolverFactory;
/// use planwright_test::doubling::{self, DoublingSolution};
///
/// type Director = TypedScoreDirector<DoublingSolution, EasyScoreCalculator<DoublingSolution>>;
///
/// let config = SolverConfig::from_toml_str(r#"
///     move_thread_count = "none"
///
///     [[phases]]
///     type = "construction_heuristic"
/// "#).unwrap();
/// let factory = SolverFactory::<DoublingSolution>::new(config);
/// let solver = factory.build_solver::<Director>().unwrap();
/// assert_eq!(solver.phase_count(), 1);
/// ```
pub struct SolverFactory<S> {
    config: SolverConfig,
    _phantom: PhantomData<fn() -> S>,
}

impl<S> SolverFactory<S>
where
    S: PlanningSolution,
    S::Score: ParseableScore,
{
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            _phantom: PhantomData,
        }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Builds a solver for directors of type `D`.
    ///
    /// The construction heuristic decider is multi-threaded whenever the
    /// configured move thread count resolves to a count.
    pub fn build_solver<D>(&self) -> Result<Solver<S, D>>
    where
        D: ScoreDirector<S> + 'static,
    {
        self.config.validate().map_err(config_error)?;
        let available_processors = std::thread::available_parallelism().map_or(1, |n| n.get());
        let move_thread_count = self
            .config
            .resolve_move_thread_count(available_processors)
            .map_err(config_error)?;
        let asserts = EvaluationAsserts::from_environment_mode(self.config.environment_mode);

        let mut solver = Solver::new();
        if let Some(seed) = self.config.effective_random_seed() {
            solver = solver.with_random_seed(seed);
        }
        if let Some(config) = &self.config.termination {
            if let Some(termination) = build_termination(config)? {
                solver = solver.with_termination(termination);
            }
        }

        let default_phases = [PhaseConfig::ConstructionHeuristic(Default::default())];
        let phases = if self.config.phases.is_empty() {
            &default_phases[..]
        } else {
            &self.config.phases[..]
        };
        for phase in phases {
            match phase {
                PhaseConfig::ConstructionHeuristic(phase_config) => {
                    solver = solver.with_phase(self.build_construction_heuristic(
                        phase_config,
                        move_thread_count,
                        asserts,
                    ));
                }
            }
        }

        debug!(
            event = "solver_built",
            phases = solver.phase_count(),
            move_threads = move_thread_count.unwrap_or(0),
            environment_mode = ?self.config.environment_mode,
            reproducible = self.config.environment_mode.is_reproducible(),
        );
        Ok(solver)
    }

    fn build_construction_heuristic<D>(
        &self,
        phase_config: &ConstructionHeuristicConfig,
        move_thread_count: Option<usize>,
        asserts: EvaluationAsserts,
    ) -> Box<dyn Phase<S, D>>
    where
        D: ScoreDirector<S> + 'static,
    {
        let placer = QueuedEntityPlacer::new(phase_config.value_selection_order);
        let forager =
            DefaultConstructionForager::<S, ConstructionMove>::new(phase_config.pick_early_type);
        match move_thread_count {
            Some(thread_count) => Box::new(ConstructionHeuristicPhase::new(
                placer,
                MultiThreadedConstructionHeuristicDecider::new(
                    forager,
                    asserts,
                    thread_count,
                    self.config.selected_move_buffer_size(thread_count),
                    self.config.flush_step_interval(),
                ),
                asserts,
            )),
            None => Box::new(ConstructionHeuristicPhase::new(
                placer,
                ConstructionHeuristicDecider::new(forager, asserts),
                asserts,
            )),
        }
    }
}

impl<S> Debug for SolverFactory<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolverFactory")
            .field("config", &self.config)
            .finish()
    }
}

fn config_error(error: ConfigError) -> SolverError {
    SolverError::Config(error.to_string())
}
