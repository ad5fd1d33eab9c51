// Score director trait definition.

use std::sync::Arc;

use planwright_core::domain::listener::{SupplyFactory, SupplyId, SupplyKey, VariableListenerSupport};
use planwright_core::{
    PlanningSolution, PlanningValue, Result, SolutionDescriptor, SolverLifecycleListener, VariableId,
};

// The score director owns the working solution and keeps its score and
// shadow variables consistent while moves are tried, undone and committed.
//
// It is responsible for:
// - The mutation protocol: every write is bracketed by a before and an
//   after call, so listeners and the score backend observe it
// - Triggering variable listeners once the outermost mutation closes
// - Calculating scores, with the init score taken from its own count of
//   unassigned genuine variables
// - Externalized supplies demanded by moves
//
// A director belongs to exactly one thread. Move threads each own a child
// director created through `create_child_thread_director`.
pub trait ScoreDirector<S: PlanningSolution>: SolverLifecycleListener + Send {
    // Returns a reference to the working solution.
    fn working_solution(&self) -> &S;

    // Returns a mutable reference to the working solution.
    //
    // Writes must be bracketed by `before_variable_changed` and
    // `after_variable_changed`.
    fn working_solution_mut(&mut self) -> &mut S;

    // Clones the working solution.
    fn clone_working_solution(&self) -> S {
        self.working_solution().clone()
    }

    // Returns the solution descriptor shared by every director of the run.
    fn descriptor(&self) -> &Arc<SolutionDescriptor<S>>;

    // Installs a new working solution: resets listeners, recomputes every
    // shadow variable and the init score, and resets the score backend.
    fn set_working_solution(&mut self, solution: S) -> Result<()>;

    // Called before a variable of an entity changes.
    //
    // Fails when the same variable of the same entity is already mid-change.
    fn before_variable_changed(&mut self, variable: VariableId, entity: usize) -> Result<()>;

    // Called after a variable of an entity changed.
    //
    // Fails without a matching `before_variable_changed`. Closing the last
    // open mutation outside a batch triggers the variable listeners.
    fn after_variable_changed(&mut self, variable: VariableId, entity: usize) -> Result<()>;

    // Writes `value` through the full before/after protocol.
    fn change_variable(&mut self, variable: VariableId, entity: usize, value: PlanningValue) -> Result<()> {
        self.before_variable_changed(variable, entity)?;
        let descriptor = Arc::clone(self.descriptor());
        descriptor.set(self.working_solution_mut(), variable, entity, value);
        self.after_variable_changed(variable, entity)
    }

    fn before_entity_added(&mut self, entity_descriptor: usize, entity: usize) -> Result<()>;

    fn after_entity_added(&mut self, entity_descriptor: usize, entity: usize) -> Result<()>;

    fn before_entity_removed(&mut self, entity_descriptor: usize, entity: usize) -> Result<()>;

    fn after_entity_removed(&mut self, entity_descriptor: usize, entity: usize) -> Result<()>;

    // Drains the listener notification queues, updating shadow variables.
    fn trigger_variable_listeners(&mut self) -> Result<()>;

    // Defers listener triggering until the matching `close_batch`.
    fn open_batch(&mut self);

    // Closes a batch; closing the outermost one triggers listeners.
    fn close_batch(&mut self) -> Result<()>;

    // Calculates the score of the working solution and stores it on it.
    //
    // Fails while a mutation is open or listener notifications are pending.
    fn calculate_score(&mut self) -> Result<S::Score>;

    // The init score the next calculated score will carry.
    fn working_init_score(&self) -> i32;

    // Returns true when the score backend buffers changes until the next
    // score calculation.
    fn requires_flushing(&self) -> bool;

    // Number of score calculations made by this director.
    fn calculation_count(&self) -> u64;

    // Adds calculations made elsewhere, such as by move threads.
    fn add_calculation_count(&mut self, count: u64);

    // Registers an externalized supply, or returns the one demanded earlier.
    fn demand_supply(&mut self, key: SupplyKey, factory: SupplyFactory<S>) -> Result<SupplyId>;

    // The listener support backing this director.
    fn listener_support(&self) -> &VariableListenerSupport<S>;

    // Looks a demanded supply up by its concrete type.
    fn supply_as<T: 'static>(&self, id: SupplyId) -> Option<&T>
    where
        Self: Sized,
    {
        self.listener_support().supply_as(id)
    }

    // Fails with a score corruption if `working_score` differs from a score
    // calculated from scratch by a fresh backend.
    fn assert_working_score_from_scratch(&mut self, working_score: &S::Score, context: &str) -> Result<()>;

    // Fails with a score corruption if the score after undoing a move
    // differs from the score before it was done.
    fn assert_expected_undo_move_score(&mut self, before_score: &S::Score, context: &str) -> Result<()>;

    // Fails with a shadow corruption if any shadow variable differs from
    // its value recomputed from scratch.
    fn assert_shadow_variables_are_not_stale(&mut self, context: &str) -> Result<()>;

    // A director over a clone of the working solution, with a fresh score
    // backend and the same descriptor.
    fn create_child_thread_director(&self) -> Result<Self>
    where
        Self: Sized;

    // Releases listeners. Every later operation fails.
    fn dispose(&mut self);
}
