//! Foragers for construction heuristic move selection
//!
//! A forager watches the scored moves of one step go by and keeps the one
//! to commit. It may pick early, which tells the decider to stop
//! evaluating the rest of the placement.

use std::fmt::{self, Debug};

use planwright_config::PickEarlyType;
use planwright_core::{PlanningSolution, Score, SolverLifecycleListener};

use crate::heuristic::r#move::ConstructionMoveScope;

/// Trait for selecting a move during construction.
///
/// # Type Parameters
/// * `S` - The planning solution type
/// * `M` - The move type
pub trait ConstructionForager<S: PlanningSolution, M>: SolverLifecycleListener + Send + Debug {
    /// Score of the previous step, the reference for non-deteriorating picks.
    fn set_last_step_score(&mut self, score: Option<S::Score>);

    fn add_move(&mut self, move_scope: ConstructionMoveScope<S, M>);

    /// True once a move was picked early; later moves of the step are moot.
    fn is_quit_early(&self) -> bool;

    /// Hands out the picked move of the step, if any move was added.
    fn pick_move(&mut self) -> Option<ConstructionMoveScope<S, M>>;

    /// Number of moves added since the step started.
    fn selected_move_count(&self) -> u64;
}

/// Picks the highest scoring move, or the first one that satisfies its
/// [`PickEarlyType`].
///
/// Ties keep the move that was added first.
///
/// # Example
///
/// ```
/// use planwright_config::PickEarlyType;
/// use planwright_core::{SimpleScore, SolverLifecycleListener};
/// use planwright_solver::heuristic::ConstructionMoveScope;
/// use planwright_solver::phase::construction::{ConstructionForager, DefaultConstructionForager};
/// use planwright_test::doubling::DoublingSolution;
///
/// let mut forager = DefaultConstructionForager::<DoublingSolution, &str>::new(PickEarlyType::Never);
/// forager.step_started(0);
/// forager.add_move(ConstructionMoveScope::new(0, "a", SimpleScore::of(-2)));
/// forager.add_move(ConstructionMoveScope::new(1, "b", SimpleScore::of(0)));
/// forager.add_move(ConstructionMoveScope::new(2, "c", SimpleScore::of(0)));
///
/// assert!(!forager.is_quit_early());
/// assert_eq!(forager.pick_move().unwrap().mv, "b");
/// ```
pub struct DefaultConstructionForager<S: PlanningSolution, M> {
    pick_early_type: PickEarlyType,
    last_step_score: Option<S::Score>,
    selected_move_count: u64,
    early_picked: Option<ConstructionMoveScope<S, M>>,
    max_score: Option<ConstructionMoveScope<S, M>>,
}

impl<S: PlanningSolution, M> DefaultConstructionForager<S, M> {
    pub fn new(pick_early_type: PickEarlyType) -> Self {
        Self {
            pick_early_type,
            last_step_score: None,
            selected_move_count: 0,
            early_picked: None,
            max_score: None,
        }
    }

    pub fn pick_early_type(&self) -> PickEarlyType {
        self.pick_early_type
    }

    fn is_picked_early(&self, score: S::Score) -> bool {
        let score = score.with_init_score(0);
        match self.pick_early_type {
            PickEarlyType::Never => false,
            PickEarlyType::FirstNonDeterioratingScore => self
                .last_step_score
                .is_some_and(|last| score >= last.with_init_score(0)),
            PickEarlyType::FirstFeasibleScore => score.is_feasible(),
            PickEarlyType::FirstFeasibleScoreOrNonDeterioratingHard => self
                .last_step_score
                .is_some_and(|last| (score - last.with_init_score(0)).is_feasible()),
        }
    }
}

impl<S: PlanningSolution, M> SolverLifecycleListener for DefaultConstructionForager<S, M> {
    fn step_started(&mut self, _step_index: u64) {
        self.selected_move_count = 0;
        self.early_picked = None;
        self.max_score = None;
    }

    fn phase_ended(&mut self, _phase_index: usize) {
        self.last_step_score = None;
        self.early_picked = None;
        self.max_score = None;
    }
}

impl<S, M> ConstructionForager<S, M> for DefaultConstructionForager<S, M>
where
    S: PlanningSolution,
    M: Send + Debug,
{
    fn set_last_step_score(&mut self, score: Option<S::Score>) {
        self.last_step_score = score;
    }

    fn add_move(&mut self, move_scope: ConstructionMoveScope<S, M>) {
        self.selected_move_count += 1;
        if self.early_picked.is_some() {
            return;
        }
        if self.is_picked_early(move_scope.score) {
            self.early_picked = Some(move_scope);
            return;
        }
        let improves = self
            .max_score
            .as_ref()
            .map_or(true, |max| move_scope.score > max.score);
        if improves {
            self.max_score = Some(move_scope);
        }
    }

    fn is_quit_early(&self) -> bool {
        self.early_picked.is_some()
    }

    fn pick_move(&mut self) -> Option<ConstructionMoveScope<S, M>> {
        self.early_picked.take().or_else(|| self.max_score.take())
    }

    fn selected_move_count(&self) -> u64 {
        self.selected_move_count
    }
}

impl<S: PlanningSolution, M> Debug for DefaultConstructionForager<S, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultConstructionForager")
            .field("pick_early_type", &self.pick_early_type)
            .field("last_step_score", &self.last_step_score)
            .field("selected_move_count", &self.selected_move_count)
            .finish()
    }
}
