//! ChangeMove - assigns a value to a planning variable.
//!
//! This is the most fundamental move type. It takes a value and assigns
//! it to a genuine variable of one entity.

use std::fmt;

use planwright_core::{PlanningSolution, PlanningValue, Result, VariableId};
use planwright_scoring::ScoreDirector;

use super::Move;

/// A move that assigns a value to an entity's variable.
///
/// # Example
///
/// ```
/// use planwright_core::{PlanningValue, VariableId};
/// use planwright_solver::ChangeMove;
///
/// let m = ChangeMove::new(VariableId::new(0, 0), 3, PlanningValue::Int(2));
/// assert_eq!(m.entity_index(), 3);
/// assert_eq!(m.to_value(), PlanningValue::Int(2));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChangeMove {
    variable: VariableId,
    entity_index: usize,
    to_value: PlanningValue,
}

impl ChangeMove {
    /// Creates a move assigning `to_value` (which may be unassigned) to
    /// `variable` of the entity at `entity_index`.
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

    /// Returns the entity index.
    pub fn entity_index(&self) -> usize {
        self.entity_index
    }

    /// Returns the target value.
    pub fn to_value(&self) -> PlanningValue {
        self.to_value
    }
}

impl fmt::Debug for ChangeMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeMove")
            .field("variable", &self.variable)
            .field("entity_index", &self.entity_index)
            .field("to_value", &self.to_value)
            .finish()
    }
}

impl fmt::Display for ChangeMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {{-> {}}}", self.entity_index, self.to_value)
    }
}

impl<S: PlanningSolution> Move<S> for ChangeMove {
    fn is_doable<D: ScoreDirector<S>>(&self, score_director: &D) -> bool {
        let current = score_director.descriptor().get(
            score_director.working_solution(),
            self.variable,
            self.entity_index,
        );
        current != self.to_value
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
        score_director.change_variable(self.variable, self.entity_index, self.to_value)
    }
}
