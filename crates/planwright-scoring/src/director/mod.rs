//! Score director implementations.
//!
//! The score director manages the working solution, the mutation protocol
//! and score calculation.
//!
//! - [`ScoreDirector`] - The protocol moves and deciders program against
//! - [`TypedScoreDirector`] - The director over a concrete score backend
//! - [`ScoreDirectorFactory`] - Builds directors sharing one descriptor

mod factory;
mod traits;

pub mod typed;

#[cfg(test)]
mod tests;

pub use factory::ScoreDirectorFactory;
pub use traits::ScoreDirector;
pub use typed::{DirectorState, TypedScoreDirector};
