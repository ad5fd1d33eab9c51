//! Anchor resolution for chained variables.
//!
//! Both the externalized [`ExternalizedAnchorSupply`] and the eager
//! [`AnchorVariableListener`] run [`propagate_anchor`], so they agree by
//! construction. After an entity's chained variable changes, its anchor is
//! resolved from its new predecessor in one hop (the predecessor's anchor
//! is already correct), then re-stamped forward along the chain until an
//! entity already carries that anchor.

use std::collections::HashMap;

use super::inverse::InverseChainIndex;
use crate::domain::descriptor::SolutionDescriptor;
use crate::domain::listener::{ListenerContext, ListenerView, SupplyKey, VariableListener};
use crate::domain::value::{PlanningValue, VariableId};
use crate::domain::variable::ShadowBinding;
use crate::error::{Result, SolverError};
use crate::lifecycle::SolverLifecycleListener;

/// Where resolved anchors are read from and written to.
pub trait AnchorStore {
    fn anchor_of(&self, entity: usize) -> PlanningValue;

    fn stamp(&mut self, entity: usize, anchor: PlanningValue) -> Result<()>;
}

/// The anchor an entity gets when its chained variable holds `previous`.
pub fn resolve_anchor<A: AnchorStore + ?Sized>(store: &A, previous: PlanningValue) -> PlanningValue {
    match previous {
        PlanningValue::Anchor(_) => previous,
        PlanningValue::Entity(predecessor) => store.anchor_of(predecessor),
        _ => PlanningValue::Unassigned,
    }
}

/// Stamps `anchor` on `entity` and its trailing entities, stopping at the
/// first entity that already carries it. Returns how many were stamped.
pub fn propagate_anchor<A: AnchorStore + ?Sized>(
    store: &mut A,
    inverse: &InverseChainIndex,
    entity: usize,
    anchor: PlanningValue,
) -> Result<usize> {
    let mut stamped = 0;
    let mut next = Some(entity);
    while let Some(current) = next {
        if store.anchor_of(current) == anchor {
            break;
        }
        store.stamp(current, anchor)?;
        stamped += 1;
        next = inverse.next_entity(current);
    }
    Ok(stamped)
}

struct MapAnchors<'a> {
    anchors: &'a mut HashMap<usize, PlanningValue>,
    stamped: &'a mut Vec<usize>,
}

impl AnchorStore for MapAnchors<'_> {
    fn anchor_of(&self, entity: usize) -> PlanningValue {
        self.anchors.get(&entity).copied().unwrap_or_default()
    }

    fn stamp(&mut self, entity: usize, anchor: PlanningValue) -> Result<()> {
        self.anchors.insert(entity, anchor);
        self.stamped.push(entity);
        Ok(())
    }
}

/// Anchor supply backed by a plain map, rebuilt on every working solution
/// reset.
#[derive(Debug, Clone)]
pub struct ExternalizedAnchorSupply {
    source: VariableId,
    inverse: InverseChainIndex,
    anchors: HashMap<usize, PlanningValue>,
    stamped: Vec<usize>,
}

impl ExternalizedAnchorSupply {
    pub const KIND: &'static str = "anchor";

    pub fn new(source: VariableId) -> Self {
        Self {
            source,
            inverse: InverseChainIndex::new(),
            anchors: HashMap::new(),
            stamped: Vec::new(),
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

    /// The anchor heading `entity`'s chain, if it is in one.
    pub fn anchor(&self, entity: usize) -> Option<usize> {
        self.anchor_value(entity).as_anchor()
    }

    pub fn anchor_value(&self, entity: usize) -> PlanningValue {
        self.anchors.get(&entity).copied().unwrap_or_default()
    }

    /// Entities re-stamped since the last step (or phase) started.
    pub fn stamped_since_step_started(&self) -> &[usize] {
        &self.stamped
    }

    fn insert(&mut self, previous: PlanningValue, entity: usize) -> Result<()> {
        self.inverse.insert(previous, entity);
        let mut store = MapAnchors {
            anchors: &mut self.anchors,
            stamped: &mut self.stamped,
        };
        let anchor = resolve_anchor(&store, previous);
        propagate_anchor(&mut store, &self.inverse, entity, anchor)?;
        Ok(())
    }
}

impl<S: 'static> VariableListener<S> for ExternalizedAnchorSupply {
    fn before_variable_changed(&mut self, view: ListenerView<'_, S>, source: VariableId, entity: usize) -> Result<()> {
        if source == self.source {
            self.inverse.retract(view.value(source, entity), entity);
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
            self.insert(ctx.value(source, entity), entity)?;
        }
        Ok(())
    }

    fn after_entity_added(&mut self, ctx: &mut ListenerContext<'_, S>, entity: usize) -> Result<()> {
        self.insert(ctx.value(self.source, entity), entity)
    }

    fn before_entity_removed(&mut self, view: ListenerView<'_, S>, entity: usize) -> Result<()> {
        self.inverse.retract(view.value(self.source, entity), entity);
        self.anchors.remove(&entity);
        Ok(())
    }

    fn reset_working_solution(&mut self, view: ListenerView<'_, S>) -> Result<()> {
        self.inverse.rebuild(view, self.source);
        self.anchors.clear();
        for entity in 0..view.entity_count(self.source.entity) {
            let previous = view.value(self.source, entity);
            if let PlanningValue::Anchor(_) = previous {
                let mut store = MapAnchors {
                    anchors: &mut self.anchors,
                    stamped: &mut self.stamped,
                };
                propagate_anchor(&mut store, &self.inverse, entity, previous)?;
            }
        }
        self.stamped.clear();
        Ok(())
    }

    fn as_lifecycle_listener(&mut self) -> Option<&mut dyn SolverLifecycleListener> {
        Some(self)
    }
}

impl SolverLifecycleListener for ExternalizedAnchorSupply {
    fn phase_started(&mut self, _phase_index: usize) {
        self.stamped.clear();
    }

    fn step_started(&mut self, _step_index: u64) {
        self.stamped.clear();
    }

    fn solving_ended(&mut self) {
        self.stamped.clear();
    }
}

struct ShadowAnchors<'c, 'a, S> {
    ctx: &'c mut ListenerContext<'a, S>,
    variable: VariableId,
}

impl<S: 'static> AnchorStore for ShadowAnchors<'_, '_, S> {
    fn anchor_of(&self, entity: usize) -> PlanningValue {
        self.ctx.value(self.variable, entity)
    }

    fn stamp(&mut self, entity: usize, anchor: PlanningValue) -> Result<()> {
        self.ctx.set_shadow(self.variable, entity, anchor)
    }
}

/// Eager anchor listener: keeps an anchor shadow variable in sync with a
/// chained variable.
#[derive(Debug, Clone)]
pub struct AnchorVariableListener {
    previous: VariableId,
    anchor: VariableId,
    inverse: InverseChainIndex,
}

impl AnchorVariableListener {
    pub fn new(previous: VariableId, anchor: VariableId) -> Self {
        Self {
            previous,
            anchor,
            inverse: InverseChainIndex::new(),
        }
    }

    /// Builds the listener from a shadow binding whose single source is the
    /// chained variable.
    pub fn from_binding(binding: &ShadowBinding) -> Self {
        Self::new(binding.sources[0], binding.shadow)
    }

    /// Listener factory for [`VariableDescriptor::shadow`](crate::domain::VariableDescriptor::shadow).
    pub fn boxed<S: 'static>(binding: &ShadowBinding) -> Box<dyn VariableListener<S>> {
        Box::new(Self::from_binding(binding))
    }

    fn insert<S: 'static>(&mut self, ctx: &mut ListenerContext<'_, S>, entity: usize) -> Result<()> {
        let previous = ctx.value(self.previous, entity);
        self.inverse.insert(previous, entity);
        let mut store = ShadowAnchors {
            ctx,
            variable: self.anchor,
        };
        let anchor = resolve_anchor(&store, previous);
        propagate_anchor(&mut store, &self.inverse, entity, anchor)?;
        Ok(())
    }
}

impl<S: 'static> VariableListener<S> for AnchorVariableListener {
    fn before_variable_changed(&mut self, view: ListenerView<'_, S>, source: VariableId, entity: usize) -> Result<()> {
        if source == self.previous {
            self.inverse.retract(view.value(source, entity), entity);
        }
        Ok(())
    }

    fn after_variable_changed(
        &mut self,
        ctx: &mut ListenerContext<'_, S>,
        source: VariableId,
        entity: usize,
    ) -> Result<()> {
        if source == self.previous {
            self.insert(ctx, entity)?;
        }
        Ok(())
    }

    fn after_entity_added(&mut self, ctx: &mut ListenerContext<'_, S>, entity: usize) -> Result<()> {
        self.insert(ctx, entity)
    }

    fn before_entity_removed(&mut self, view: ListenerView<'_, S>, entity: usize) -> Result<()> {
        self.inverse.retract(view.value(self.previous, entity), entity);
        Ok(())
    }

    fn reset_working_solution(&mut self, view: ListenerView<'_, S>) -> Result<()> {
        self.inverse.rebuild(view, self.previous);
        Ok(())
    }
}

/// Checks that the externalized supply and the anchor shadow variable agree
/// on every entity.
pub fn assert_anchor_agreement<S>(
    descriptor: &SolutionDescriptor<S>,
    solution: &S,
    anchor_variable: VariableId,
    supply: &ExternalizedAnchorSupply,
) -> Result<()> {
    for entity in 0..descriptor.entity_count(solution, anchor_variable.entity) {
        let shadow = descriptor.get(solution, anchor_variable, entity);
        let supplied = supply.anchor_value(entity);
        if shadow != supplied {
            return Err(SolverError::AnchorDisagreement {
                entity,
                supply: supplied.to_string(),
                shadow: shadow.to_string(),
            });
        }
    }
    Ok(())
}
