//! Entity and solution descriptors.
//!
//! A [`SolutionDescriptor`] is built once per problem type through
//! [`SolutionDescriptorBuilder`] and frozen behind an `Arc`. Building
//! resolves shadow sources and computes the variable listener order, so
//! both a missing source and a shadow cycle are reported here rather than
//! during solving.

use std::fmt;
use std::sync::Arc;

use super::listener::VariableListenerRegistry;
use super::value::{PlanningValue, VariableId};
use super::variable::VariableDescriptor;
use crate::error::{Result, SolverError};

/// Metadata for one planning entity class.
pub struct EntityDescriptor<S> {
    name: &'static str,
    entity_count: fn(&S) -> usize,
    variables: Vec<VariableDescriptor<S>>,
}

impl<S> EntityDescriptor<S> {
    pub fn new(name: &'static str, entity_count: fn(&S) -> usize) -> Self {
        Self {
            name,
            entity_count,
            variables: Vec::new(),
        }
    }

    pub fn with_variable(mut self, variable: VariableDescriptor<S>) -> Self {
        self.variables.push(variable);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn entity_count(&self, solution: &S) -> usize {
        (self.entity_count)(solution)
    }

    pub fn variables(&self) -> &[VariableDescriptor<S>] {
        &self.variables
    }

    pub fn variable_index(&self, name: &str) -> Option<usize> {
        self.variables.iter().position(|v| v.name() == name)
    }
}

impl<S> fmt::Debug for EntityDescriptor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityDescriptor")
            .field("name", &self.name)
            .field("variables", &self.variables)
            .finish()
    }
}

/// Collects entity descriptors and freezes them into a [`SolutionDescriptor`].
pub struct SolutionDescriptorBuilder<S> {
    name: &'static str,
    entities: Vec<EntityDescriptor<S>>,
}

impl<S> SolutionDescriptorBuilder<S> {
    pub fn entity(mut self, entity: EntityDescriptor<S>) -> Self {
        self.entities.push(entity);
        self
    }

    /// Resolves shadow sources and builds the listener registry.
    ///
    /// # Errors
    ///
    /// [`SolverError::MissingSourceVariable`] when a shadow names an unknown
    /// source, [`SolverError::CyclicShadowDependency`] when shadows depend on
    /// each other in a cycle.
    pub fn build(mut self) -> Result<Arc<SolutionDescriptor<S>>> {
        let mut resolutions = Vec::new();
        for (entity_index, entity) in self.entities.iter().enumerate() {
            for (variable_index, variable) in entity.variables.iter().enumerate() {
                if !variable.kind().is_shadow() {
                    continue;
                }
                let mut resolved = Vec::with_capacity(variable.declared_sources().len());
                for source in variable.declared_sources() {
                    let id = self
                        .entities
                        .iter()
                        .position(|e| e.name == source.entity)
                        .and_then(|e| {
                            self.entities[e]
                                .variable_index(source.variable)
                                .map(|v| VariableId::new(e, v))
                        })
                        .ok_or_else(|| SolverError::MissingSourceVariable {
                            shadow: format!("{}.{}", entity.name, variable.name()),
                            entity: source.entity.to_string(),
                            variable: source.variable.to_string(),
                        })?;
                    if !resolved.contains(&id) {
                        resolved.push(id);
                    }
                }
                resolutions.push((VariableId::new(entity_index, variable_index), resolved));
            }
        }
        for (id, resolved) in resolutions {
            self.entities[id.entity].variables[id.variable].resolve_sources(resolved);
        }

        let registry = VariableListenerRegistry::register(&self.entities)?;
        let genuine_variables = self
            .entities
            .iter()
            .enumerate()
            .flat_map(|(e, entity)| {
                entity
                    .variables
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| v.kind().is_genuine())
                    .map(move |(v, _)| VariableId::new(e, v))
            })
            .collect();

        Ok(Arc::new(SolutionDescriptor {
            name: self.name,
            entities: self.entities,
            genuine_variables,
            registry: Arc::new(registry),
        }))
    }
}

/// Frozen, solution-shape metadata shared by every score director of a run.
pub struct SolutionDescriptor<S> {
    name: &'static str,
    entities: Vec<EntityDescriptor<S>>,
    genuine_variables: Vec<VariableId>,
    registry: Arc<VariableListenerRegistry>,
}

impl<S> SolutionDescriptor<S> {
    pub fn builder(name: &'static str) -> SolutionDescriptorBuilder<S> {
        SolutionDescriptorBuilder {
            name,
            entities: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn entity_descriptors(&self) -> &[EntityDescriptor<S>] {
        &self.entities
    }

    pub fn entity_descriptor(&self, index: usize) -> &EntityDescriptor<S> {
        &self.entities[index]
    }

    pub fn variable(&self, id: VariableId) -> &VariableDescriptor<S> {
        &self.entities[id.entity].variables[id.variable]
    }

    /// Looks a variable up by entity class and variable name.
    pub fn find_variable(&self, entity: &str, variable: &str) -> Option<VariableId> {
        let e = self.entities.iter().position(|d| d.name == entity)?;
        let v = self.entities[e].variable_index(variable)?;
        Some(VariableId::new(e, v))
    }

    /// Genuine and chained variables, in declaration order.
    pub fn genuine_variables(&self) -> &[VariableId] {
        &self.genuine_variables
    }

    /// Shadow variables, in declaration order.
    pub fn shadow_variables(&self) -> impl Iterator<Item = VariableId> + '_ {
        self.entities.iter().enumerate().flat_map(|(e, entity)| {
            entity
                .variables
                .iter()
                .enumerate()
                .filter(|(_, v)| v.kind().is_shadow())
                .map(move |(v, _)| VariableId::new(e, v))
        })
    }

    pub fn listener_registry(&self) -> &Arc<VariableListenerRegistry> {
        &self.registry
    }

    pub fn entity_count(&self, solution: &S, entity: usize) -> usize {
        self.entities[entity].entity_count(solution)
    }

    #[inline]
    pub fn get(&self, solution: &S, variable: VariableId, entity: usize) -> PlanningValue {
        self.variable(variable).accessor().get(solution, entity)
    }

    #[inline]
    pub fn set(&self, solution: &mut S, variable: VariableId, entity: usize, value: PlanningValue) {
        self.variable(variable).accessor().set(solution, entity, value)
    }

    /// Number of genuine variables still unassigned; the negated count is
    /// the init score.
    pub fn count_uninitialized(&self, solution: &S) -> usize {
        self.genuine_variables
            .iter()
            .map(|&id| {
                (0..self.entity_count(solution, id.entity))
                    .filter(|&e| !self.get(solution, id, e).is_assigned())
                    .count()
            })
            .sum()
    }

    /// `Entity.variable` label for diagnostics.
    pub fn variable_label(&self, id: VariableId) -> String {
        format!("{}.{}", self.entities[id.entity].name, self.variable(id).name())
    }
}

impl<S> fmt::Debug for SolutionDescriptor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolutionDescriptor")
            .field("name", &self.name)
            .field("entities", &self.entities)
            .finish()
    }
}
