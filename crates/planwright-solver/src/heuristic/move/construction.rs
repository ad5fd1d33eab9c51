//! ConstructionMove - the union of moves a construction phase selects.
//!
//! Implements `Move<S>` by delegating to the inner variant, so placers,
//! foragers and move threads stay monomorphized over a single move type.

use std::fmt::Debug;

use planwright_core::{PlanningSolution, Result};
use planwright_scoring::ScoreDirector;

use super::{ChainedChangeMove, ChangeMove, CompositeMove, Move};

/// A monomorphized union of the moves that initialize a planning entity.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum ConstructionMove {
    Change(ChangeMove),
    Chained(ChainedChangeMove),
    /// One move per uninitialized variable of the same entity.
    Composite(CompositeMove<ConstructionMove>),
}

impl Debug for ConstructionMove {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Change(m) => m.fmt(f),
            Self::Chained(m) => m.fmt(f),
            Self::Composite(m) => m.fmt(f),
        }
    }
}

impl From<ChangeMove> for ConstructionMove {
    fn from(m: ChangeMove) -> Self {
        Self::Change(m)
    }
}

impl From<ChainedChangeMove> for ConstructionMove {
    fn from(m: ChainedChangeMove) -> Self {
        Self::Chained(m)
    }
}

impl<S: PlanningSolution> Move<S> for ConstructionMove {
    fn is_doable<D: ScoreDirector<S>>(&self, score_director: &D) -> bool {
        match self {
            Self::Change(m) => Move::<S>::is_doable(m, score_director),
            Self::Chained(m) => Move::<S>::is_doable(m, score_director),
            Self::Composite(m) => Move::<S>::is_doable(m, score_director),
        }
    }

    fn create_undo_move<D: ScoreDirector<S>>(&self, score_director: &D) -> Self {
        match self {
            Self::Change(m) => Self::Change(Move::<S>::create_undo_move(m, score_director)),
            Self::Chained(m) => Self::Chained(Move::<S>::create_undo_move(m, score_director)),
            Self::Composite(m) => Self::Composite(Move::<S>::create_undo_move(m, score_director)),
        }
    }

    fn do_move_only<D: ScoreDirector<S>>(&self, score_director: &mut D) -> Result<()> {
        match self {
            Self::Change(m) => Move::<S>::do_move_only(m, score_director),
            Self::Chained(m) => Move::<S>::do_move_only(m, score_director),
            Self::Composite(m) => Move::<S>::do_move_only(m, score_director),
        }
    }

    fn rebase<D: ScoreDirector<S>>(&self, destination: &D) -> Self {
        match self {
            Self::Change(m) => Self::Change(Move::<S>::rebase(m, destination)),
            Self::Chained(m) => Self::Chained(Move::<S>::rebase(m, destination)),
            Self::Composite(m) => Self::Composite(Move::<S>::rebase(m, destination)),
        }
    }
}
