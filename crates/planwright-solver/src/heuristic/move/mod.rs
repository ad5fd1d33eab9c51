//! Move system for modifying planning solutions.
//!
//! Moves are the fundamental operations that modify planning variables during
//! solving. The solver explores the solution space by applying different moves
//! and evaluating their impact on the score.
//!
//! # Architecture
//!
//! Moves address variables by [`VariableId`](planwright_core::VariableId) and
//! entities by index, so a move built against one score director can be
//! replayed on any other director of the same run:
//! - [`ChangeMove`] - assigns a value to a genuine variable
//! - [`ChainedChangeMove`] - relinks an entity within the chains of a chained variable
//! - [`CompositeMove`] - applies several moves as one
//! - [`ConstructionMove`] - the union of the above that construction phases select
//!
//! Undo is explicit: [`Move::do_move`] returns the move that restores the
//! state it changed.

mod chained;
mod change;
mod composite;
mod construction;
mod process;
mod scope;
mod traits;


pub use chained::ChainedChangeMove;
pub use change::ChangeMove;
pub use composite::CompositeMove;
pub use construction::ConstructionMove;
pub use process::{EvaluationAsserts, ProcessMove};
pub use scope::ConstructionMoveScope;
pub use traits::Move;
