//! Solver lifecycle hooks.

/// Lifecycle events mirrored on every stateful solver component (forager,
/// score director, chain supplies) so cached state follows the solver.
///
/// All hooks default to no-ops.
pub trait SolverLifecycleListener {
    fn solving_started(&mut self) {}

    fn phase_started(&mut self, _phase_index: usize) {}

    fn step_started(&mut self, _step_index: u64) {}

    fn step_ended(&mut self, _step_index: u64) {}

    fn phase_ended(&mut self, _phase_index: usize) {}

    fn solving_ended(&mut self) {}
}
