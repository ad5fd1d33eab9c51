//! ChainedChangeMove - relinks an entity within the chains of a chained variable.
//!
//! Changing a chained variable is not a single write: the entity that
//! trailed the moved entity must be linked to the moved entity's old
//! predecessor, and the entity that trailed the new predecessor must now
//! trail the moved entity. The trailing entities come from the
//! [`InverseChainSupply`] the move demands from the score director.

use std::fmt;

use planwright_core::{InverseChainSupply, PlanningSolution, PlanningValue, Result, SolverError, VariableId};
use planwright_scoring::ScoreDirector;

use super::Move;

/// A move that links an entity behind another chained value.
///
/// `to_value` is an anchor, another entity already in a chain, or
/// [`PlanningValue::Unassigned`] to take the entity out of its chain.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainedChangeMove {
    variable: VariableId,
    entity_index: usize,
    to_value: PlanningValue,
}

impl ChainedChangeMove {
    pub fn new(variable: VariableId, entity_index: usize, to_value: PlanningValue) -> Self {
        Self {
            variable,
            entity_index,
            to_value,
        }
    }

    pub fn variable(&self) -> VariableId {
        self.variable
    }

    pub fn entity_index(&self) -> usize {
        self.entity_index
    }

    pub fn to_value(&self) -> PlanningValue {
        self.to_value
    }

    fn trailing<S, D>(&self, score_director: &mut D, value: PlanningValue) -> Result<Option<usize>>
    where
        S: PlanningSolution,
        D: ScoreDirector<S>,
    {
        let id = score_director.demand_supply(
            InverseChainSupply::key(self.variable),
            InverseChainSupply::create::<S>,
        )?;
        let supply = score_director
            .supply_as::<InverseChainSupply>(id)
            .ok_or_else(|| {
                SolverError::InvalidState(format!(
                    "supply for {} is not an inverse chain supply",
                    self.variable
                ))
            })?;
        Ok(supply.trailing(value))
    }
}

impl fmt::Debug for ChainedChangeMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainedChangeMove")
            .field("variable", &self.variable)
            .field("entity_index", &self.entity_index)
            .field("to_value", &self.to_value)
            .finish()
    }
}

impl<S: PlanningSolution> Move<S> for ChainedChangeMove {
    fn is_doable<D: ScoreDirector<S>>(&self, score_director: &D) -> bool {
        let descriptor = score_director.descriptor();
        let solution = score_director.working_solution();
        if descriptor.get(solution, self.variable, self.entity_index) == self.to_value {
            return false;
        }
        match self.to_value {
            PlanningValue::Entity(e) if e == self.entity_index => false,
            // Linking behind an entity outside every chain would orphan this one.
            PlanningValue::Entity(e) => descriptor.get(solution, self.variable, e).is_assigned(),
            _ => true,
        }
    }

    fn create_undo_move<D: ScoreDirector<S>>(&self, score_director: &D) -> Self {
        let old_value = score_director.descriptor().get(
            score_director.working_solution(),
            self.variable,
            self.entity_index,
        );
        Self::new(self.variable, self.entity_index, old_value)
    }

    fn do_move_only<D: ScoreDirector<S>>(&self, score_director: &mut D) -> Result<()> {
        let old_value = score_director.descriptor().get(
            score_director.working_solution(),
            self.variable,
            self.entity_index,
        );
        // Read both trailing entities before the first write moves them.
        let old_trailing = self.trailing(score_director, PlanningValue::Entity(self.entity_index))?;
        let new_trailing = if self.to_value.is_assigned() {
            self.trailing(score_director, self.to_value)?
        } else {
            None
        };

        if let Some(trailing) = old_trailing {
            score_director.change_variable(self.variable, trailing, old_value)?;
        }
        if let Some(trailing) = new_trailing {
            score_director.change_variable(
                self.variable,
                trailing,
                PlanningValue::Entity(self.entity_index),
            )?;
        }
        score_director.change_variable(self.variable, self.entity_index, self.to_value)
    }
}
