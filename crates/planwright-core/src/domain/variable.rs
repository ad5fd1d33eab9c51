//! Variable descriptors: kind, compiled accessor and shadow wiring.

use std::fmt;
use std::sync::Arc;

use super::listener::VariableListener;
use super::value::{PlanningValue, VariableId};

/// Reads a variable of the entity at the given index.
pub type VariableGetter<S> = fn(&S, usize) -> PlanningValue;

/// Writes a variable of the entity at the given index.
pub type VariableSetter<S> = fn(&mut S, usize, PlanningValue);

/// Produces the candidate values of a genuine variable.
pub type ValueRangeFn<S> = fn(&S) -> Vec<PlanningValue>;

/// Creates the listener that maintains one shadow variable.
pub type ListenerFactory<S> =
    Arc<dyn Fn(&ShadowBinding) -> Box<dyn VariableListener<S>> + Send + Sync>;

/// Compiled get/set access to one variable, built from function pointers.
pub struct VariableAccessor<S> {
    getter: VariableGetter<S>,
    setter: VariableSetter<S>,
}

impl<S> VariableAccessor<S> {
    pub fn new(getter: VariableGetter<S>, setter: VariableSetter<S>) -> Self {
        Self { getter, setter }
    }

    #[inline]
    pub fn get(&self, solution: &S, entity: usize) -> PlanningValue {
        (self.getter)(solution, entity)
    }

    #[inline]
    pub fn set(&self, solution: &mut S, entity: usize, value: PlanningValue) {
        (self.setter)(solution, entity, value)
    }
}

impl<S> Clone for VariableAccessor<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for VariableAccessor<S> {}

/// What kind of variable a descriptor describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableKind {
    /// Chosen by the solver from its value range.
    Genuine,
    /// Chosen by the solver; points at an anchor or at another entity.
    Chained,
    /// Derived from its sources by a variable listener.
    Shadow { sources: Vec<VariableId> },
}

impl VariableKind {
    /// Genuine and chained variables are both chosen by the solver.
    pub fn is_genuine(&self) -> bool {
        matches!(self, VariableKind::Genuine | VariableKind::Chained)
    }

    pub fn is_chained(&self) -> bool {
        matches!(self, VariableKind::Chained)
    }

    pub fn is_shadow(&self) -> bool {
        matches!(self, VariableKind::Shadow { .. })
    }
}

/// A shadow source named by entity class and variable name, resolved to a
/// [`VariableId`] when the solution descriptor is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceRef {
    pub entity: &'static str,
    pub variable: &'static str,
}

impl SourceRef {
    pub const fn new(entity: &'static str, variable: &'static str) -> Self {
        Self { entity, variable }
    }
}

/// Resolved wiring handed to a listener factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowBinding {
    pub shadow: VariableId,
    pub sources: Vec<VariableId>,
}

struct ShadowSpec<S> {
    declared_sources: Vec<SourceRef>,
    factory: ListenerFactory<S>,
}

/// Static metadata for one planning or shadow variable.
pub struct VariableDescriptor<S> {
    name: &'static str,
    kind: VariableKind,
    accessor: VariableAccessor<S>,
    value_range: Option<ValueRangeFn<S>>,
    shadow: Option<ShadowSpec<S>>,
}

impl<S> VariableDescriptor<S> {
    /// A genuine variable with a value range.
    pub fn genuine(
        name: &'static str,
        getter: VariableGetter<S>,
        setter: VariableSetter<S>,
        value_range: ValueRangeFn<S>,
    ) -> Self {
        Self {
            name,
            kind: VariableKind::Genuine,
            accessor: VariableAccessor::new(getter, setter),
            value_range: Some(value_range),
            shadow: None,
        }
    }

    /// A chained variable. Its value range yields anchors and entities.
    pub fn chained(
        name: &'static str,
        getter: VariableGetter<S>,
        setter: VariableSetter<S>,
        value_range: ValueRangeFn<S>,
    ) -> Self {
        Self {
            kind: VariableKind::Chained,
            ..Self::genuine(name, getter, setter, value_range)
        }
    }

    /// A shadow variable maintained by the listener `factory` creates.
    pub fn shadow<F>(
        name: &'static str,
        getter: VariableGetter<S>,
        setter: VariableSetter<S>,
        sources: impl IntoIterator<Item = SourceRef>,
        factory: F,
    ) -> Self
    where
        F: Fn(&ShadowBinding) -> Box<dyn VariableListener<S>> + Send + Sync + 'static,
    {
        Self {
            name,
            kind: VariableKind::Shadow {
                sources: Vec::new(),
            },
            accessor: VariableAccessor::new(getter, setter),
            value_range: None,
            shadow: Some(ShadowSpec {
                declared_sources: sources.into_iter().collect(),
                factory: Arc::new(factory),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> &VariableKind {
        &self.kind
    }

    pub fn accessor(&self) -> VariableAccessor<S> {
        self.accessor
    }

    /// Candidate values, for genuine and chained variables.
    pub fn value_range(&self, solution: &S) -> Vec<PlanningValue> {
        self.value_range.map(|f| f(solution)).unwrap_or_default()
    }

    /// Source variables as declared, before resolution.
    pub fn declared_sources(&self) -> &[SourceRef] {
        self.shadow
            .as_ref()
            .map(|spec| spec.declared_sources.as_slice())
            .unwrap_or(&[])
    }

    /// Resolved source variables of a shadow variable.
    pub fn sources(&self) -> &[VariableId] {
        match &self.kind {
            VariableKind::Shadow { sources } => sources,
            _ => &[],
        }
    }

    pub(crate) fn resolve_sources(&mut self, resolved: Vec<VariableId>) {
        if let VariableKind::Shadow { sources } = &mut self.kind {
            *sources = resolved;
        }
    }

    /// Creates the listener of a shadow variable; `None` for other kinds.
    pub fn create_listener(&self, binding: &ShadowBinding) -> Option<Box<dyn VariableListener<S>>> {
        self.shadow.as_ref().map(|spec| (spec.factory)(binding))
    }
}

impl<S> fmt::Debug for VariableDescriptor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariableDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}
