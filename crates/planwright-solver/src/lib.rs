//! Planwright Solver Engine
//!
//! This crate provides the main solver implementation including:
//! - Solver and SolverFactory
//! - The construction heuristic phase, single- and multi-threaded
//! - Move system and move threads
//! - Termination conditions

pub mod heuristic;
pub mod phase;
pub mod scope;
pub mod solver;
pub mod termination;

pub use heuristic::{
    ChainedChangeMove, ChangeMove, CompositeMove, ConstructionMove, ConstructionMoveScope,
    EvaluationAsserts, Move, MoveThreadPool, OrderByMoveIndexQueue, ProcessMove,
};
pub use phase::{
    construction::{
        ConstructionDecider, ConstructionForager, ConstructionHeuristicDecider,
        ConstructionHeuristicPhase, DefaultConstructionForager, EntityPlacer,
        MultiThreadedConstructionHeuristicDecider, Placement, QueuedEntityPlacer,
    },
    Phase,
};
pub use scope::{PhaseScope, SolverScope, StepScope};
pub use solver::{Solver, SolverFactory, SolverHandle};
pub use termination::{
    build_termination, BestScoreTermination, OrTermination, StepCountTermination, Termination,
    TimeTermination,
};
