//! Inverse index of a chained variable: which entity trails a value.

use std::collections::HashMap;

use crate::domain::listener::{
    ListenerContext, ListenerView, SupplyKey, VariableListener,
};
use crate::domain::value::{PlanningValue, VariableId};
use crate::error::Result;

/// Maps a chained value (an anchor or an entity) to the entity whose
/// chained variable points at it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InverseChainIndex {
    trailing: HashMap<PlanningValue, usize>,
}

impl InverseChainIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the index from the chained variable of every entity.
    pub fn rebuild<S>(&mut self, view: ListenerView<'_, S>, chained: VariableId) {
        self.trailing.clear();
        for entity in 0..view.entity_count(chained.entity) {
            self.insert(view.value(chained, entity), entity);
        }
    }

    /// Records that `entity` now points at `value`.
    pub fn insert(&mut self, value: PlanningValue, entity: usize) {
        if value.is_assigned() {
            self.trailing.insert(value, entity);
        }
    }

    /// Forgets that `entity` points at `value`. A newer entry for the same
    /// value left by another entity is kept.
    pub fn retract(&mut self, value: PlanningValue, entity: usize) {
        if self.trailing.get(&value) == Some(&entity) {
            self.trailing.remove(&value);
        }
    }

    /// The entity directly after `value` in its chain.
    pub fn trailing(&self, value: PlanningValue) -> Option<usize> {
        self.trailing.get(&value).copied()
    }

    /// The entity directly after `entity` in its chain.
    pub fn next_entity(&self, entity: usize) -> Option<usize> {
        self.trailing(PlanningValue::Entity(entity))
    }

    pub fn len(&self) -> usize {
        self.trailing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trailing.is_empty()
    }
}

/// Externalized inverse supply over a chained variable, demanded by chained
/// moves to find the entities they must reconnect.
#[derive(Debug, Clone)]
pub struct InverseChainSupply {
    source: VariableId,
    index: InverseChainIndex,
}

impl InverseChainSupply {
    pub const KIND: &'static str = "inverse";

    pub fn new(source: VariableId) -> Self {
        Self {
            source,
            index: InverseChainIndex::new(),
        }
    }

    pub fn key(source: VariableId) -> SupplyKey {
        SupplyKey {
            kind: Self::KIND,
            source,
        }
    }

    /// Factory usable as a [`SupplyFactory`](crate::domain::listener::SupplyFactory).
    pub fn create<S: 'static>(source: VariableId) -> Box<dyn VariableListener<S>> {
        Box::new(Self::new(source))
    }

    pub fn trailing(&self, value: PlanningValue) -> Option<usize> {
        self.index.trailing(value)
    }

    pub fn index(&self) -> &InverseChainIndex {
        &self.index
    }
}

impl<S: 'static> VariableListener<S> for InverseChainSupply {
    fn before_variable_changed(&mut self, view: ListenerView<'_, S>, source: VariableId, entity: usize) -> Result<()> {
        if source == self.source {
            self.index.retract(view.value(source, entity), entity);
        }
        Ok(())
    }

    fn after_variable_changed(
        &mut self,
        ctx: &mut ListenerContext<'_, S>,
        source: VariableId,
        entity: usize,
    ) -> Result<()> {
        if source == self.source {
            self.index.insert(ctx.value(source, entity), entity);
        }
        Ok(())
    }

    fn after_entity_added(&mut self, ctx: &mut ListenerContext<'_, S>, entity: usize) -> Result<()> {
        self.index.insert(ctx.value(self.source, entity), entity);
        Ok(())
    }

    fn before_entity_removed(&mut self, view: ListenerView<'_, S>, entity: usize) -> Result<()> {
        self.index.retract(view.value(self.source, entity), entity);
        Ok(())
    }

    fn reset_working_solution(&mut self, view: ListenerView<'_, S>) -> Result<()> {
        self.index.rebuild(view, self.source);
        Ok(())
    }
}
