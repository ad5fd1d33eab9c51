//! Planwright - a construction heuristic planning engine in Rust
//!
//! Describe the planning variables of a solution with a
//! [`SolutionDescriptor`], pick a score calculator and call [`run_solver`].
//!
//! # Example
//!
//! ```rust
//! use planwright::prelude::*;
//!
//! // Score types are re-exported
//! let score = HardSoftScore::of(0, -100);
//! assert_eq!(score.hard(), 0);
//! assert_eq!(score.soft(), -100);
//! ```

// Domain model
pub use planwright_core::{
    AnchorVariableListener, EntityDescriptor, PlanningSolution, PlanningValue, SolutionDescriptor,
    SolverError, SourceRef, VariableDescriptor, VariableId,
};

// Score types
pub use planwright_core::{HardSoftScore, ParseableScore, Score, SimpleScore};

// Score calculation
pub use planwright_scoring::{
    EasyScoreCalculator, IncrementalScoreCalculator, ScoreCalculator, ScoreDirector,
    TypedScoreDirector,
};

// Configuration
pub use planwright_config::{EnvironmentMode, MoveThreadCount, SolverConfig};

// Solver
pub use planwright_solver::{Solver, SolverFactory, SolverHandle};

#[cfg(feature = "console")]
pub mod console;

mod solver;
pub use solver::{run_solver, run_solver_with_config};

pub mod prelude {
    pub use super::{
        EasyScoreCalculator, EntityDescriptor, HardSoftScore, PlanningSolution, PlanningValue,
        Score, SimpleScore, SolutionDescriptor, SolverConfig, VariableDescriptor,
    };
    pub use super::{run_solver, run_solver_with_config};
}
