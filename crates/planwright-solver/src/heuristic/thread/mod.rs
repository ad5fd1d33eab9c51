//! Move threads for multi-threaded move evaluation.
//!
//! The coordinator posts [`MoveThreadOperation`]s on one bounded queue
//! shared by all move threads, and takes [`ThreadResult`]s back through an
//! [`OrderByMoveIndexQueue`] so foraging order never depends on scheduling.

mod operation;
mod pool;
mod queue;
mod runner;

#[cfg(test)]
mod tests;

pub use operation::MoveThreadOperation;
pub use pool::MoveThreadPool;
pub use queue::{OrderByMoveIndexQueue, ResultSender, ThreadResult};
pub use runner::MoveThreadRunner;
