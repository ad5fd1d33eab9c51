//! Score director over a concrete score backend.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use planwright_core::domain::listener::{SupplyFactory, SupplyId, SupplyKey, VariableListenerSupport};
use planwright_core::{
    PlanningSolution, Result, Score, SolutionDescriptor, SolverError, SolverLifecycleListener, VariableId,
};
use tracing::trace;

use super::ScoreDirector;
use crate::calculator::ScoreCalculator;

/// Lifecycle state of a score director.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectorState {
    /// A working solution is installed and no mutation is open.
    Ready,
    /// At least one before call has no matching after call yet.
    Mutating,
    /// Disposed; every operation fails.
    Disposed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Mutation {
    Variable(VariableId, usize),
    EntityAdded(usize, usize),
    EntityRemoved(usize, usize),
}

/// A score director generic over its score backend.
///
/// The director is born [`Ready`](DirectorState::Ready): construction
/// installs the working solution.
///
/// # Example
///
/// ```
/// use planwright_core::{
///     EntityDescriptor, PlanningSolution, PlanningValue, SimpleScore, SolutionDescriptor,
///     VariableDescriptor, VariableId,
/// };
/// use planwright_scoring::calculator::EasyScoreCalculator;
/// use planwright_scoring::director::{ScoreDirector, TypedScoreDirector};
///
/// #[derive(Clone)]
/// struct Sum {
///     values: Vec<PlanningValue>,
///     score: Option<SimpleScore>,
/// }
///
/// impl PlanningSolution for Sum {
///     type Score = SimpleScore;
///     fn score(&self) -> Option<Self::Score> { self.score }
///     fn set_score(&mut self, score: Option<Self::Score>) { self.score = score; }
/// }
///
/// let descriptor = SolutionDescriptor::builder("Sum")
///     .entity(
///         EntityDescriptor::new("Item", |s: &Sum| s.values.len()).with_variable(
///             VariableDescriptor::genuine(
///                 "value",
///                 |s: &Sum, i| s.values[i],
///                 |s: &mut Sum, i, v| s.values[i] = v,
///                 |_| vec![PlanningValue::Int(1), PlanningValue::Int(2)],
///             ),
///         ),
///     )
///     .build()
///     .unwrap();
///
/// let calculator = EasyScoreCalculator::new(|s: &Sum| {
///     SimpleScore::of(s.values.iter().filter_map(|v| v.as_int()).sum())
/// });
/// let solution = Sum { values: vec![PlanningValue::Unassigned; 2], score: None };
/// let mut director = TypedScoreDirector::new(descriptor, calculator, solution).unwrap();
///
/// // Two unassigned variables
/// assert_eq!(director.calculate_score().unwrap().to_string(), "-2init/0");
///
/// director.change_variable(VariableId::new(0, 0), 0, PlanningValue::Int(2)).unwrap();
/// assert_eq!(director.calculate_score().unwrap().to_string(), "-1init/2");
/// ```
pub struct TypedScoreDirector<S: PlanningSolution, C> {
    working_solution: S,
    descriptor: Arc<SolutionDescriptor<S>>,
    support: VariableListenerSupport<S>,
    calculator: C,
    in_flight: HashSet<Mutation>,
    batch_depth: usize,
    uninitialized: usize,
    calculation_count: u64,
    disposed: bool,
}

impl<S, C> TypedScoreDirector<S, C>
where
    S: PlanningSolution,
    C: ScoreCalculator<S>,
{
    /// Creates a director and installs `solution` as its working solution.
    pub fn new(descriptor: Arc<SolutionDescriptor<S>>, calculator: C, solution: S) -> Result<Self> {
        let support = VariableListenerSupport::new(Arc::clone(&descriptor))?;
        let mut director = Self {
            working_solution: solution,
            descriptor,
            support,
            calculator,
            in_flight: HashSet::new(),
            batch_depth: 0,
            uninitialized: 0,
            calculation_count: 0,
            disposed: false,
        };
        director.install()?;
        Ok(director)
    }

    pub fn state(&self) -> DirectorState {
        if self.disposed {
            DirectorState::Disposed
        } else if self.in_flight.is_empty() {
            DirectorState::Ready
        } else {
            DirectorState::Mutating
        }
    }

    pub fn calculator(&self) -> &C {
        &self.calculator
    }

    /// Consumes the director and returns the working solution.
    pub fn take_solution(self) -> S {
        self.working_solution
    }

    fn install(&mut self) -> Result<()> {
        self.in_flight.clear();
        self.batch_depth = 0;
        self.support.reset_working_solution(&self.working_solution)?;
        self.support
            .force_trigger_all_variable_listeners(&mut self.working_solution, &mut ())?;
        self.calculator.reset_working_solution(&self.working_solution);
        self.uninitialized = self.descriptor.count_uninitialized(&self.working_solution);
        Ok(())
    }

    fn ensure_live(&self) -> Result<()> {
        if self.disposed {
            return Err(SolverError::InvalidState(
                "score director used after it was disposed".to_string(),
            ));
        }
        Ok(())
    }

    fn open(&mut self, mutation: Mutation) -> Result<()> {
        self.ensure_live()?;
        if !self.in_flight.insert(mutation) {
            return Err(SolverError::InvalidState(format!(
                "nested mutation: {} is already being changed",
                self.describe(mutation)
            )));
        }
        Ok(())
    }

    fn close(&mut self, mutation: Mutation) -> Result<()> {
        self.ensure_live()?;
        if !self.in_flight.remove(&mutation) {
            return Err(SolverError::InvalidState(format!(
                "after call for {} without a matching before call",
                self.describe(mutation)
            )));
        }
        Ok(())
    }

    fn settle(&mut self) -> Result<()> {
        if self.in_flight.is_empty() && self.batch_depth == 0 {
            self.trigger_variable_listeners()?;
        }
        Ok(())
    }

    fn describe(&self, mutation: Mutation) -> String {
        match mutation {
            Mutation::Variable(variable, entity) => {
                format!("{}[{}]", self.descriptor.variable_label(variable), entity)
            }
            Mutation::EntityAdded(descriptor, entity) | Mutation::EntityRemoved(descriptor, entity) => {
                format!("{}[{}]", self.descriptor.entity_descriptor(descriptor).name(), entity)
            }
        }
    }

    fn unassigned_genuine(&self, entity_descriptor: usize, entity: usize) -> usize {
        self.descriptor
            .genuine_variables()
            .iter()
            .filter(|id| id.entity == entity_descriptor)
            .filter(|&&id| !self.descriptor.get(&self.working_solution, id, entity).is_assigned())
            .count()
    }

    fn is_unassigned_genuine(&self, variable: VariableId, entity: usize) -> bool {
        self.descriptor.variable(variable).kind().is_genuine()
            && !self.descriptor.get(&self.working_solution, variable, entity).is_assigned()
    }

    fn score_from_scratch(&self) -> Result<S::Score> {
        let mut scratch = self.calculator.fresh();
        scratch.reset_working_solution(&self.working_solution);
        let score = scratch.calculate_score(&self.working_solution)?;
        Ok(score.with_init_score(-(self.uninitialized as i32)))
    }
}

impl<S, C> ScoreDirector<S> for TypedScoreDirector<S, C>
where
    S: PlanningSolution,
    C: ScoreCalculator<S>,
{
    fn working_solution(&self) -> &S {
        &self.working_solution
    }

    fn working_solution_mut(&mut self) -> &mut S {
        &mut self.working_solution
    }

    fn descriptor(&self) -> &Arc<SolutionDescriptor<S>> {
        &self.descriptor
    }

    fn set_working_solution(&mut self, solution: S) -> Result<()> {
        self.ensure_live()?;
        self.working_solution = solution;
        self.install()
    }

    fn before_variable_changed(&mut self, variable: VariableId, entity: usize) -> Result<()> {
        self.open(Mutation::Variable(variable, entity))?;
        if self.is_unassigned_genuine(variable, entity) {
            self.uninitialized -= 1;
        }
        self.calculator
            .before_variable_changed(&self.working_solution, variable, entity);
        self.support
            .before_variable_changed(&self.working_solution, variable, entity)
    }

    fn after_variable_changed(&mut self, variable: VariableId, entity: usize) -> Result<()> {
        self.close(Mutation::Variable(variable, entity))?;
        if self.is_unassigned_genuine(variable, entity) {
            self.uninitialized += 1;
        }
        self.calculator
            .after_variable_changed(&self.working_solution, variable, entity);
        self.settle()
    }

    fn before_entity_added(&mut self, entity_descriptor: usize, entity: usize) -> Result<()> {
        self.open(Mutation::EntityAdded(entity_descriptor, entity))?;
        self.calculator
            .before_entity_added(&self.working_solution, entity_descriptor, entity);
        self.support
            .before_entity_added(&self.working_solution, entity_descriptor, entity)
    }

    fn after_entity_added(&mut self, entity_descriptor: usize, entity: usize) -> Result<()> {
        self.close(Mutation::EntityAdded(entity_descriptor, entity))?;
        self.uninitialized += self.unassigned_genuine(entity_descriptor, entity);
        self.calculator
            .after_entity_added(&self.working_solution, entity_descriptor, entity);
        self.settle()
    }

    fn before_entity_removed(&mut self, entity_descriptor: usize, entity: usize) -> Result<()> {
        self.open(Mutation::EntityRemoved(entity_descriptor, entity))?;
        self.uninitialized -= self.unassigned_genuine(entity_descriptor, entity);
        self.calculator
            .before_entity_removed(&self.working_solution, entity_descriptor, entity);
        self.support
            .before_entity_removed(&self.working_solution, entity_descriptor, entity)
    }

    fn after_entity_removed(&mut self, entity_descriptor: usize, entity: usize) -> Result<()> {
        self.close(Mutation::EntityRemoved(entity_descriptor, entity))?;
        self.calculator
            .after_entity_removed(&self.working_solution, entity_descriptor, entity);
        self.settle()
    }

    fn trigger_variable_listeners(&mut self) -> Result<()> {
        self.ensure_live()?;
        self.support
            .trigger_variable_listeners(&mut self.working_solution, &mut self.calculator)
    }

    fn open_batch(&mut self) {
        self.batch_depth += 1;
    }

    fn close_batch(&mut self) -> Result<()> {
        if self.batch_depth == 0 {
            return Err(SolverError::InvalidState(
                "close_batch without a matching open_batch".to_string(),
            ));
        }
        self.batch_depth -= 1;
        self.settle()
    }

    fn calculate_score(&mut self) -> Result<S::Score> {
        self.ensure_live()?;
        if let Some(&mutation) = self.in_flight.iter().next() {
            return Err(SolverError::InvalidState(format!(
                "score calculation requested while {} is being changed",
                self.describe(mutation)
            )));
        }
        self.support.assert_notification_queues_are_empty()?;
        let score = self
            .calculator
            .calculate_score(&self.working_solution)?
            .with_init_score(-(self.uninitialized as i32));
        self.working_solution.set_score(Some(score));
        self.calculation_count += 1;
        Ok(score)
    }

    fn working_init_score(&self) -> i32 {
        -(self.uninitialized as i32)
    }

    fn requires_flushing(&self) -> bool {
        self.calculator.requires_flushing()
    }

    fn calculation_count(&self) -> u64 {
        self.calculation_count
    }

    fn add_calculation_count(&mut self, count: u64) {
        self.calculation_count += count;
    }

    fn demand_supply(&mut self, key: SupplyKey, factory: SupplyFactory<S>) -> Result<SupplyId> {
        self.ensure_live()?;
        self.support.demand(key, factory, &self.working_solution)
    }

    fn listener_support(&self) -> &VariableListenerSupport<S> {
        &self.support
    }

    fn assert_working_score_from_scratch(&mut self, working_score: &S::Score, context: &str) -> Result<()> {
        let expected = self.score_from_scratch()?;
        if expected != *working_score {
            return Err(SolverError::ScoreCorruption {
                context: context.to_string(),
                expected: expected.to_string(),
                actual: working_score.to_string(),
            });
        }
        Ok(())
    }

    fn assert_expected_undo_move_score(&mut self, before_score: &S::Score, context: &str) -> Result<()> {
        let undo_score = self.calculate_score()?;
        if undo_score != *before_score {
            trace!(
                event = "undo_score_mismatch",
                before = %before_score,
                after = %undo_score,
            );
            return Err(SolverError::ScoreCorruption {
                context: format!("undoing {}", context),
                expected: before_score.to_string(),
                actual: undo_score.to_string(),
            });
        }
        Ok(())
    }

    fn assert_shadow_variables_are_not_stale(&mut self, context: &str) -> Result<()> {
        self.support.assert_notification_queues_are_empty()?;
        let mut scratch = self.working_solution.clone();
        let mut support = VariableListenerSupport::new(Arc::clone(&self.descriptor))?;
        support.reset_working_solution(&scratch)?;
        support.force_trigger_all_variable_listeners(&mut scratch, &mut ())?;

        for shadow in self.descriptor.shadow_variables() {
            for entity in 0..self.descriptor.entity_count(&scratch, shadow.entity) {
                let expected = self.descriptor.get(&scratch, shadow, entity);
                let actual = self.descriptor.get(&self.working_solution, shadow, entity);
                if expected != actual {
                    return Err(SolverError::ShadowCorruption {
                        context: context.to_string(),
                        entity: self.descriptor.entity_descriptor(shadow.entity).name().to_string(),
                        index: entity,
                        variable: self.descriptor.variable(shadow).name().to_string(),
                        expected: expected.to_string(),
                        actual: actual.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn create_child_thread_director(&self) -> Result<Self> {
        self.ensure_live()?;
        Self::new(
            Arc::clone(&self.descriptor),
            self.calculator.fresh(),
            self.working_solution.clone(),
        )
    }

    fn dispose(&mut self) {
        if !self.disposed {
            self.support.close();
            self.in_flight.clear();
            self.disposed = true;
        }
    }
}

impl<S, C> SolverLifecycleListener for TypedScoreDirector<S, C>
where
    S: PlanningSolution,
    C: ScoreCalculator<S>,
{
    fn solving_started(&mut self) {
        self.support.for_each_lifecycle_listener(|l| l.solving_started());
    }

    fn phase_started(&mut self, phase_index: usize) {
        self.support
            .for_each_lifecycle_listener(|l| l.phase_started(phase_index));
    }

    fn step_started(&mut self, step_index: u64) {
        self.support
            .for_each_lifecycle_listener(|l| l.step_started(step_index));
    }

    fn step_ended(&mut self, step_index: u64) {
        self.support
            .for_each_lifecycle_listener(|l| l.step_ended(step_index));
    }

    fn phase_ended(&mut self, phase_index: usize) {
        self.support
            .for_each_lifecycle_listener(|l| l.phase_ended(phase_index));
    }

    fn solving_ended(&mut self) {
        self.support.for_each_lifecycle_listener(|l| l.solving_ended());
    }
}

impl<S, C> fmt::Debug for TypedScoreDirector<S, C>
where
    S: PlanningSolution,
    C: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedScoreDirector")
            .field("descriptor", &self.descriptor.name())
            .field("calculator", &self.calculator)
            .field("in_flight", &self.in_flight.len())
            .field("uninitialized", &self.uninitialized)
            .field("calculation_count", &self.calculation_count)
            .field("disposed", &self.disposed)
            .finish()
    }
}
