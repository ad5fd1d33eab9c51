//! Score calculation and the score director for planwright.
//!
//! This crate provides:
//! - Score calculation backends (`EasyScoreCalculator`,
//!   `IncrementalScoreCalculator`, `ConstraintScoreCalculator`)
//! - The inliner registry mapping score definitions to score accumulators
//! - The score director and its mutation protocol
//!
//! # Architecture
//!
//! Directors are generic over their backend, so score calculation is fully
//! monomorphized. Variable listeners are the only trait objects on the
//! mutation path.

pub mod calculator;
pub mod director;

pub use calculator::{
    ConstraintScoreCalculator, EasyScoreCalculator, EntityConstraint, IncrementalScore,
    IncrementalScoreCalculator, InlinerRegistry, ScoreCalculator, ScoreInliner, WeightedSumInliner,
};
pub use director::{DirectorState, ScoreDirector, ScoreDirectorFactory, TypedScoreDirector};
