//! Construction heuristic phase
//!
//! Builds an initial solution by initializing one entity per step. The
//! placer proposes the entity and its candidate moves, the decider scores
//! them (on this thread or on move threads) and the forager picks one.

mod decider;
mod forager;
mod multi_threaded;
mod phase;
mod placer;

#[cfg(test)]
mod tests;

pub use decider::{ConstructionDecider, ConstructionHeuristicDecider};
pub use forager::{ConstructionForager, DefaultConstructionForager};
pub use multi_threaded::MultiThreadedConstructionHeuristicDecider;
pub use phase::ConstructionHeuristicPhase;
pub use placer::{EntityPlacer, Placement, QueuedEntityPlacer};
