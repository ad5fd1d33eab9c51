//! Entity placers for construction heuristic
//!
//! A placer proposes one [`Placement`] per step: an entity with at least
//! one unassigned genuine variable, plus the lazy sequence of moves that
//! would assign it. Placements are produced against the current working
//! solution, so a chained variable only ever offers values that are
//! already part of a chain.

use std::fmt::{self, Debug};

use planwright_config::SelectionOrder;
use planwright_core::{PlanningSolution, PlanningValue, SolutionDescriptor, VariableId};
use planwright_scoring::ScoreDirector;
use rand::seq::SliceRandom;
use rand::RngCore;
use smallvec::SmallVec;

use crate::heuristic::r#move::{ChainedChangeMove, ChangeMove, CompositeMove, ConstructionMove};

/// An entity to initialize and the candidate moves that would do it.
///
/// The moves are finite, lazy and can only be walked once.
pub struct Placement<M> {
    pub entity_descriptor: usize,
    pub entity_index: usize,
    moves: Box<dyn Iterator<Item = M> + Send>,
}

impl<M> Placement<M> {
    pub fn new(
        entity_descriptor: usize,
        entity_index: usize,
        moves: impl Iterator<Item = M> + Send + 'static,
    ) -> Self {
        Self {
            entity_descriptor,
            entity_index,
            moves: Box::new(moves),
        }
    }

    /// Consumes the placement, yielding its moves.
    pub fn into_moves(self) -> Box<dyn Iterator<Item = M> + Send> {
        self.moves
    }
}

impl<M> Debug for Placement<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Placement")
            .field("entity_descriptor", &self.entity_descriptor)
            .field("entity_index", &self.entity_index)
            .finish()
    }
}

/// Trait for placing entities during construction.
///
/// # Type Parameters
/// * `S` - The planning solution type
/// * `M` - The move type
pub trait EntityPlacer<S: PlanningSolution, M>: Send + Debug {
    /// Rewinds the placer to the first entity.
    fn phase_started(&mut self) {}

    /// Returns the next entity to initialize, or `None` when every entity
    /// is initialized.
    fn next_placement<D: ScoreDirector<S>>(
        &mut self,
        score_director: &D,
        rng: &mut dyn RngCore,
    ) -> Option<Placement<M>>;
}

/// Places entities in declaration order, one per step.
///
/// Each placement assigns every unassigned genuine variable of the entity
/// at once: one move per value for a single variable, and one
/// [`CompositeMove`] per value combination for several.
#[derive(Debug, Clone)]
pub struct QueuedEntityPlacer {
    value_selection_order: SelectionOrder,
    entity_descriptor: usize,
    entity_index: usize,
}

impl QueuedEntityPlacer {
    pub fn new(value_selection_order: SelectionOrder) -> Self {
        Self {
            value_selection_order,
            entity_descriptor: 0,
            entity_index: 0,
        }
    }

    fn unassigned_variables<S: PlanningSolution>(
        descriptor: &SolutionDescriptor<S>,
        solution: &S,
        entity_descriptor: usize,
        entity_index: usize,
    ) -> SmallVec<[VariableId; 2]> {
        descriptor
            .genuine_variables()
            .iter()
            .copied()
            .filter(|id| id.entity == entity_descriptor)
            .filter(|&id| !descriptor.get(solution, id, entity_index).is_assigned())
            .collect()
    }

    fn candidate_values<S: PlanningSolution>(
        &self,
        descriptor: &SolutionDescriptor<S>,
        solution: &S,
        variable: VariableId,
        entity_index: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<PlanningValue> {
        let variable_descriptor = descriptor.variable(variable);
        let mut values = variable_descriptor.value_range(solution);
        if variable_descriptor.kind().is_chained() {
            values.retain(|value| match *value {
                PlanningValue::Anchor(_) => true,
                PlanningValue::Entity(e) => {
                    e != entity_index && descriptor.get(solution, variable, e).is_assigned()
                }
                _ => false,
            });
        } else {
            values.retain(|value| value.is_assigned());
        }
        if self.value_selection_order == SelectionOrder::Random {
            values.shuffle(rng);
        }
        values
    }
}

impl Default for QueuedEntityPlacer {
    fn default() -> Self {
        Self::new(SelectionOrder::Original)
    }
}

impl<S: PlanningSolution> EntityPlacer<S, ConstructionMove> for QueuedEntityPlacer {
    fn phase_started(&mut self) {
        self.entity_descriptor = 0;
        self.entity_index = 0;
    }

    fn next_placement<D: ScoreDirector<S>>(
        &mut self,
        score_director: &D,
        rng: &mut dyn RngCore,
    ) -> Option<Placement<ConstructionMove>> {
        let descriptor = score_director.descriptor();
        let solution = score_director.working_solution();

        while self.entity_descriptor < descriptor.entity_descriptors().len() {
            let entity_count = descriptor.entity_count(solution, self.entity_descriptor);
            while self.entity_index < entity_count {
                let entity_index = self.entity_index;
                self.entity_index += 1;

                let variables =
                    Self::unassigned_variables(descriptor, solution, self.entity_descriptor, entity_index);
                if variables.is_empty() {
                    continue;
                }
                let candidates = variables
                    .iter()
                    .map(|&variable| {
                        let chained = descriptor.variable(variable).kind().is_chained();
                        let values =
                            self.candidate_values(descriptor, solution, variable, entity_index, rng);
                        (variable, chained, values)
                    })
                    .collect();
                return Some(Placement::new(
                    self.entity_descriptor,
                    entity_index,
                    PlacementMoves::new(entity_index, candidates),
                ));
            }
            self.entity_descriptor += 1;
            self.entity_index = 0;
        }
        None
    }
}

/// Walks every value combination of a placement's variables, the last
/// variable fastest.
struct PlacementMoves {
    entity_index: usize,
    candidates: SmallVec<[(VariableId, bool, Vec<PlanningValue>); 2]>,
    cursor: SmallVec<[usize; 2]>,
    exhausted: bool,
}

impl PlacementMoves {
    fn new(
        entity_index: usize,
        candidates: SmallVec<[(VariableId, bool, Vec<PlanningValue>); 2]>,
    ) -> Self {
        let exhausted = candidates.iter().any(|(_, _, values)| values.is_empty());
        let cursor = SmallVec::from_elem(0, candidates.len());
        Self {
            entity_index,
            candidates,
            cursor,
            exhausted,
        }
    }

    fn single_move(&self, position: usize) -> ConstructionMove {
        let (variable, chained, values) = &self.candidates[position];
        let value = values[self.cursor[position]];
        if *chained {
            ChainedChangeMove::new(*variable, self.entity_index, value).into()
        } else {
            ChangeMove::new(*variable, self.entity_index, value).into()
        }
    }

    fn advance(&mut self) {
        for position in (0..self.cursor.len()).rev() {
            self.cursor[position] += 1;
            if self.cursor[position] < self.candidates[position].2.len() {
                return;
            }
            self.cursor[position] = 0;
        }
        self.exhausted = true;
    }
}

impl Iterator for PlacementMoves {
    type Item = ConstructionMove;

    fn next(&mut self) -> Option<ConstructionMove> {
        if self.exhausted {
            return None;
        }
        let mv = if self.candidates.len() == 1 {
            self.single_move(0)
        } else {
            ConstructionMove::Composite(CompositeMove::new(
                (0..self.candidates.len())
                    .map(|position| self.single_move(position))
                    .collect(),
            ))
        };
        self.advance();
        Some(mv)
    }
}
