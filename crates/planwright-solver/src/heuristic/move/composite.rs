//! CompositeMove - applies several moves as one.

use std::fmt::Debug;

use planwright_core::{PlanningSolution, Result};
use planwright_scoring::ScoreDirector;

use super::Move;

/// A move that applies its child moves in order.
///
/// Children must change distinct variables: every child's undo is created
/// against the state before any child ran.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CompositeMove<M> {
    moves: Vec<M>,
}

impl<M> CompositeMove<M> {
    pub fn new(moves: Vec<M>) -> Self {
        Self { moves }
    }

    pub fn moves(&self) -> &[M] {
        &self.moves
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

impl<S, M> Move<S> for CompositeMove<M>
where
    S: PlanningSolution,
    M: Move<S>,
{
    fn is_doable<D: ScoreDirector<S>>(&self, score_director: &D) -> bool {
        self.moves.iter().any(|m| m.is_doable(score_director))
    }

    fn create_undo_move<D: ScoreDirector<S>>(&self, score_director: &D) -> Self {
        Self::new(
            self.moves
                .iter()
                .rev()
                .map(|m| m.create_undo_move(score_director))
                .collect(),
        )
    }

    fn do_move_only<D: ScoreDirector<S>>(&self, score_director: &mut D) -> Result<()> {
        for m in &self.moves {
            m.do_move_only(score_director)?;
        }
        Ok(())
    }

    fn rebase<D: ScoreDirector<S>>(&self, destination: &D) -> Self {
        Self::new(self.moves.iter().map(|m| m.rebase(destination)).collect())
    }
}
