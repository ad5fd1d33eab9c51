//! Heuristic components for solving
//!
//! This module contains:
//! - Moves: reversible operations that modify planning variables
//! - Move threads: workers that score moves on their own score director

pub mod r#move;
pub mod thread;

pub use r#move::{
    ChainedChangeMove, ChangeMove, CompositeMove, ConstructionMove, ConstructionMoveScope,
    EvaluationAsserts, Move, ProcessMove,
};
pub use thread::{
    MoveThreadOperation, MoveThreadPool, MoveThreadRunner, OrderByMoveIndexQueue,
    ResultSender, ThreadResult,
};
