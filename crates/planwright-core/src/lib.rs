//! Planwright Core - descriptors, scores and shadow variable support
//!
//! This crate provides the fundamental abstractions for planwright:
//! - Score types for representing solution quality
//! - Descriptor types compiled once per problem type
//! - The variable listener registry and per-director notification support
//! - Chained variable supplies (inverse index, anchors)

pub mod domain;
pub mod error;
pub mod lifecycle;
pub mod score;

pub use domain::chained::{
    AnchorVariableListener, ExternalizedAnchorSupply, InverseChainIndex, InverseChainSupply,
};
pub use domain::listener::{
    ListenerContext, ListenerView, MutationObserver, SupplyId, SupplyKey, VariableListener,
    VariableListenerRegistry, VariableListenerSupport,
};
pub use domain::{
    EntityDescriptor, PlanningSolution, PlanningValue, ShadowBinding, SolutionDescriptor, SourceRef,
    VariableDescriptor, VariableId, VariableKind,
};
pub use error::{Result, SolverError};
pub use lifecycle::SolverLifecycleListener;
pub use score::{HardSoftScore, ParseableScore, Score, ScoreLevel, ScoreParseError, SimpleScore};
