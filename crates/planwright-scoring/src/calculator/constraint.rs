//! Constraint-backed backend with a dirty buffer.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use planwright_core::domain::listener::MutationObserver;
use planwright_core::{PlanningSolution, Result, VariableId};

use super::inliner::{InlinerConstructor, InlinerRegistry, ScoreInliner};
use super::ScoreCalculator;

/// Counts how often an entity matches a constraint.
///
/// Reads only the given entity; see [`ConstraintScoreCalculator`].
pub type MatchFn<S> = fn(&S, usize) -> i64;

/// A constraint evaluated per entity of one entity class.
///
/// The score impact of an entity is `weight * matches(solution, entity)`.
/// Penalties use a negative weight.
pub struct EntityConstraint<S: PlanningSolution> {
    name: &'static str,
    entity_descriptor: usize,
    weight: S::Score,
    matches: MatchFn<S>,
}

impl<S: PlanningSolution> EntityConstraint<S> {
    pub fn new(name: &'static str, entity_descriptor: usize, weight: S::Score, matches: MatchFn<S>) -> Self {
        Self {
            name,
            entity_descriptor,
            weight,
            matches,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn entity_descriptor(&self) -> usize {
        self.entity_descriptor
    }

    pub fn weight(&self) -> S::Score {
        self.weight
    }
}

impl<S: PlanningSolution> fmt::Debug for EntityConstraint<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityConstraint")
            .field("name", &self.name)
            .field("entity_descriptor", &self.entity_descriptor)
            .field("weight", &self.weight)
            .finish()
    }
}

/// Keeps per-entity constraint matches and folds changed entities into the
/// score lazily.
///
/// Variable changes only mark entities dirty. The dirty buffer is flushed
/// when the score is requested, so this backend
/// [requires flushing](ScoreCalculator::requires_flushing): a caller that
/// changes many variables without ever asking for a score lets the buffer
/// grow.
///
/// Only the entity whose variable changed is re-matched. A [`MatchFn`] must
/// therefore read nothing but the variables of the entity it is given,
/// shadow variables included. A constraint over several entities needs its
/// joined value kept in a shadow variable of each entity it affects, or an
/// [`EasyScoreCalculator`](super::EasyScoreCalculator) /
/// [`IncrementalScoreCalculator`](super::IncrementalScoreCalculator).
pub struct ConstraintScoreCalculator<S: PlanningSolution> {
    constraints: Arc<Vec<EntityConstraint<S>>>,
    entity_counter: fn(&S, usize) -> usize,
    constructor: InlinerConstructor<S::Score>,
    inliner: Box<dyn ScoreInliner<S::Score>>,
    inserted: Vec<HashMap<usize, i64>>,
    dirty: Vec<(usize, usize)>,
    dirty_set: HashSet<(usize, usize)>,
}

impl<S: PlanningSolution> ConstraintScoreCalculator<S> {
    /// `entity_counter` returns the number of entities of an entity class.
    pub fn new(
        constraints: Vec<EntityConstraint<S>>,
        entity_counter: fn(&S, usize) -> usize,
        constructor: InlinerConstructor<S::Score>,
    ) -> Self {
        Self::from_shared(Arc::new(constraints), entity_counter, constructor)
    }

    /// Resolves the inliner of the score definition `tag` through `registry`.
    ///
    /// # Errors
    ///
    /// [`SolverError::UnknownScoreInliner`](planwright_core::SolverError::UnknownScoreInliner)
    /// if `tag` is not registered.
    pub fn with_registry(
        constraints: Vec<EntityConstraint<S>>,
        entity_counter: fn(&S, usize) -> usize,
        registry: &InlinerRegistry<S::Score>,
        tag: &str,
    ) -> Result<Self> {
        let constructor = registry.resolve(tag)?;
        Ok(Self::new(constraints, entity_counter, constructor))
    }

    fn from_shared(
        constraints: Arc<Vec<EntityConstraint<S>>>,
        entity_counter: fn(&S, usize) -> usize,
        constructor: InlinerConstructor<S::Score>,
    ) -> Self {
        let weights: Vec<_> = constraints.iter().map(EntityConstraint::weight).collect();
        Self {
            inliner: constructor(&weights),
            inserted: vec![HashMap::new(); constraints.len()],
            constraints,
            entity_counter,
            constructor,
            dirty: Vec::new(),
            dirty_set: HashSet::new(),
        }
    }

    pub fn constraints(&self) -> &[EntityConstraint<S>] {
        &self.constraints
    }

    /// Number of entities waiting to be folded into the score.
    pub fn dirty_count(&self) -> usize {
        self.dirty.len()
    }

    fn mark_dirty(&mut self, entity_descriptor: usize, entity: usize) {
        if self.dirty_set.insert((entity_descriptor, entity)) {
            self.dirty.push((entity_descriptor, entity));
        }
    }

    fn flush(&mut self, solution: &S) {
        for (entity_descriptor, entity) in std::mem::take(&mut self.dirty) {
            self.dirty_set.remove(&(entity_descriptor, entity));
            let alive = entity < (self.entity_counter)(solution, entity_descriptor);
            for (index, constraint) in self.constraints.iter().enumerate() {
                if constraint.entity_descriptor != entity_descriptor {
                    continue;
                }
                let old = self.inserted[index].get(&entity).copied().unwrap_or(0);
                let new = if alive { (constraint.matches)(solution, entity) } else { 0 };
                if old == new {
                    continue;
                }
                self.inliner.retract(index, old);
                self.inliner.insert(index, new);
                if new == 0 {
                    self.inserted[index].remove(&entity);
                } else {
                    self.inserted[index].insert(entity, new);
                }
            }
        }
    }
}

impl<S: PlanningSolution> fmt::Debug for ConstraintScoreCalculator<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintScoreCalculator")
            .field("constraints", &self.constraints)
            .field("dirty", &self.dirty.len())
            .finish()
    }
}

impl<S: PlanningSolution> MutationObserver<S> for ConstraintScoreCalculator<S> {
    fn before_variable_changed(&mut self, _solution: &S, variable: VariableId, entity: usize) {
        self.mark_dirty(variable.entity, entity);
    }

    fn after_variable_changed(&mut self, _solution: &S, variable: VariableId, entity: usize) {
        self.mark_dirty(variable.entity, entity);
    }
}

impl<S: PlanningSolution> ScoreCalculator<S> for ConstraintScoreCalculator<S> {
    fn reset_working_solution(&mut self, solution: &S) {
        let weights: Vec<_> = self.constraints.iter().map(EntityConstraint::weight).collect();
        self.inliner = (self.constructor)(&weights);
        self.dirty.clear();
        self.dirty_set.clear();
        for (index, constraint) in self.constraints.iter().enumerate() {
            let inserted = &mut self.inserted[index];
            inserted.clear();
            for entity in 0..(self.entity_counter)(solution, constraint.entity_descriptor) {
                let matches = (constraint.matches)(solution, entity);
                if matches != 0 {
                    self.inliner.insert(index, matches);
                    inserted.insert(entity, matches);
                }
            }
        }
    }

    fn after_entity_added(&mut self, _solution: &S, entity_descriptor: usize, entity: usize) {
        self.mark_dirty(entity_descriptor, entity);
    }

    fn before_entity_removed(&mut self, _solution: &S, entity_descriptor: usize, entity: usize) {
        for (index, constraint) in self.constraints.iter().enumerate() {
            if constraint.entity_descriptor != entity_descriptor {
                continue;
            }
            if let Some(old) = self.inserted[index].remove(&entity) {
                self.inliner.retract(index, old);
            }
        }
        if self.dirty_set.remove(&(entity_descriptor, entity)) {
            self.dirty.retain(|&key| key != (entity_descriptor, entity));
        }
    }

    fn calculate_score(&mut self, solution: &S) -> Result<S::Score> {
        self.flush(solution);
        Ok(self.inliner.score())
    }

    fn requires_flushing(&self) -> bool {
        true
    }

    fn fresh(&self) -> Self {
        Self::from_shared(Arc::clone(&self.constraints), self.entity_counter, self.constructor)
    }
}
