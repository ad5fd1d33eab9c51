//! Topologically ordered notification graph over shadow variables.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use smallvec::SmallVec;

use crate::domain::descriptor::EntityDescriptor;
use crate::domain::value::VariableId;
use crate::error::{Result, SolverError};

/// One shadow variable's listener slot in the global notification order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notifiable {
    /// Position in the global notification order.
    pub order: usize,
    /// The shadow variable the listener maintains.
    pub shadow: VariableId,
    /// The variables whose changes the listener observes.
    pub sources: SmallVec<[VariableId; 2]>,
    /// `Entity.variable` label of the shadow variable.
    pub label: String,
}

/// Immutable notification order, shared read-only by every score director
/// of a solving run.
///
/// Shadow A depends on shadow B when B is one of A's sources; A is then
/// always notified after B. Unrelated shadows keep their declaration order,
/// so the order is reproducible.
#[derive(Debug, Default)]
pub struct VariableListenerRegistry {
    notifiables: Vec<Notifiable>,
    by_source: HashMap<VariableId, SmallVec<[usize; 4]>>,
    by_entity: HashMap<usize, SmallVec<[usize; 4]>>,
}

impl VariableListenerRegistry {
    /// Computes the notification order of every shadow variable declared on
    /// `entities`. Shadow sources must already be resolved.
    ///
    /// # Errors
    ///
    /// [`SolverError::CyclicShadowDependency`] if shadows depend on each
    /// other in a cycle.
    pub fn register<S>(entities: &[EntityDescriptor<S>]) -> Result<Self> {
        let mut shadows: Vec<(VariableId, &[VariableId], String)> = Vec::new();
        for (e, entity) in entities.iter().enumerate() {
            for (v, variable) in entity.variables().iter().enumerate() {
                if variable.kind().is_shadow() {
                    let label = format!("{}.{}", entity.name(), variable.name());
                    shadows.push((VariableId::new(e, v), variable.sources(), label));
                }
            }
        }

        let position: HashMap<VariableId, usize> = shadows
            .iter()
            .enumerate()
            .map(|(i, (id, _, _))| (*id, i))
            .collect();

        let mut in_degree = vec![0usize; shadows.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); shadows.len()];
        for (i, (_, sources, _)) in shadows.iter().enumerate() {
            for source in sources.iter() {
                if let Some(&upstream) = position.get(source) {
                    in_degree[i] += 1;
                    dependents[upstream].push(i);
                }
            }
        }

        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, &d)| d == 0)
            .map(|(i, _)| Reverse(i))
            .collect();
        let mut sorted = Vec::with_capacity(shadows.len());
        while let Some(Reverse(i)) = ready.pop() {
            sorted.push(i);
            for &dependent in &dependents[i] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.push(Reverse(dependent));
                }
            }
        }

        if sorted.len() < shadows.len() {
            let variables = in_degree
                .iter()
                .enumerate()
                .filter(|(_, &d)| d > 0)
                .map(|(i, _)| shadows[i].2.clone())
                .collect();
            return Err(SolverError::CyclicShadowDependency { variables });
        }

        let mut registry = Self::default();
        for (order, i) in sorted.into_iter().enumerate() {
            let (shadow, sources, label) = &shadows[i];
            for &source in sources.iter() {
                registry.by_source.entry(source).or_default().push(order);
                let by_entity = registry.by_entity.entry(source.entity).or_default();
                if !by_entity.contains(&order) {
                    by_entity.push(order);
                }
            }
            registry.notifiables.push(Notifiable {
                order,
                shadow: *shadow,
                sources: sources.iter().copied().collect(),
                label: label.clone(),
            });
        }
        Ok(registry)
    }

    /// Every notifiable, in notification order.
    pub fn notifiables(&self) -> &[Notifiable] {
        &self.notifiables
    }

    /// Notifiables observing `source`, in notification order.
    pub fn notifiable_list(&self, source: VariableId) -> &[usize] {
        self.by_source
            .get(&source)
            .map(|list| list.as_slice())
            .unwrap_or(&[])
    }

    /// Notifiables observing any variable of the entity class, in
    /// notification order. They receive entity added/removed events.
    pub fn entity_notifiable_list(&self, entity_descriptor: usize) -> &[usize] {
        self.by_entity
            .get(&entity_descriptor)
            .map(|list| list.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.notifiables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifiables.is_empty()
    }

    pub(crate) fn source_index(&self) -> HashMap<VariableId, SmallVec<[usize; 4]>> {
        self.by_source.clone()
    }

    pub(crate) fn entity_index(&self) -> HashMap<usize, SmallVec<[usize; 4]>> {
        self.by_entity.clone()
    }
}
