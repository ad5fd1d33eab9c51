//! Chained variable support.
//!
//! A chained variable points either at an anchor (the problem fact heading
//! a chain) or at another entity. [`InverseChainIndex`] answers "who trails
//! this value", which both chained moves and anchor propagation need.

mod anchor;
mod inverse;


pub use anchor::{
    assert_anchor_agreement, propagate_anchor, resolve_anchor, AnchorStore, AnchorVariableListener,
    ExternalizedAnchorSupply,
};
pub use inverse::{InverseChainIndex, InverseChainSupply};
