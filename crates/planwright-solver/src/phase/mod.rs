//! Solver phases
//!
//! The construction heuristic is the only phase: it initializes every
//! uninitialized entity, one step at a time.

pub mod construction;

use std::fmt::Debug;

use planwright_core::{PlanningSolution, Result};
use planwright_scoring::ScoreDirector;

use crate::scope::SolverScope;

/// A phase of the solving process.
///
/// Phases are executed in sequence by the solver.
///
/// # Type Parameters
/// * `S` - The planning solution type
/// * `D` - The score director type
pub trait Phase<S: PlanningSolution, D: ScoreDirector<S>>: Send + Debug {
    /// Executes this phase on the working solution of `solver_scope`.
    ///
    /// An error ends solving; the working solution is then not usable.
    fn solve(&mut self, solver_scope: &mut SolverScope<S, D>) -> Result<()>;

    /// Returns the name of this phase type.
    fn phase_type_name(&self) -> &'static str;
}
