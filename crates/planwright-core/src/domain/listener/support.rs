//! Per-director listener instances, notification queues and supplies.

use std::collections::HashMap;
use std::sync::Arc;

use smallvec::SmallVec;
use tracing::trace;

use super::context::{ListenerContext, ListenerView};
use super::queue::NotificationQueue;
use super::traits::{MutationObserver, Notification, VariableListener};
use crate::domain::descriptor::SolutionDescriptor;
use crate::domain::value::VariableId;
use crate::domain::variable::ShadowBinding;
use crate::error::{Result, SolverError};
use crate::lifecycle::SolverLifecycleListener;

/// Identifies an externalized supply: what it computes and from which
/// source variable. Demanding the same key twice yields the same supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SupplyKey {
    pub kind: &'static str,
    pub source: VariableId,
}

/// Handle to a demanded supply within one score director.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SupplyId(usize);

/// Creates an externalized supply listening to a source variable.
pub type SupplyFactory<S> = fn(VariableId) -> Box<dyn VariableListener<S>>;

/// Listener instances and queues owned by one score director.
///
/// Declared shadow listeners occupy the first slots, in registry order.
/// Demanded supplies are appended after them, so they always observe
/// up-to-date shadow variables.
pub struct VariableListenerSupport<S> {
    descriptor: Arc<SolutionDescriptor<S>>,
    listeners: Vec<Box<dyn VariableListener<S>>>,
    queues: Vec<NotificationQueue>,
    owners: Vec<Option<VariableId>>,
    labels: Vec<String>,
    by_source: HashMap<VariableId, SmallVec<[usize; 4]>>,
    by_entity: HashMap<usize, SmallVec<[usize; 4]>>,
    supplies: HashMap<SupplyKey, SupplyId>,
}

impl<S: 'static> VariableListenerSupport<S> {
    /// Instantiates one listener per notifiable of the descriptor's registry.
    pub fn new(descriptor: Arc<SolutionDescriptor<S>>) -> Result<Self> {
        let registry = Arc::clone(descriptor.listener_registry());
        let mut listeners = Vec::with_capacity(registry.len());
        let mut queues = Vec::with_capacity(registry.len());
        let mut owners = Vec::with_capacity(registry.len());
        let mut labels = Vec::with_capacity(registry.len());

        for notifiable in registry.notifiables() {
            let binding = ShadowBinding {
                shadow: notifiable.shadow,
                sources: notifiable.sources.to_vec(),
            };
            let listener = descriptor
                .variable(notifiable.shadow)
                .create_listener(&binding)
                .ok_or_else(|| {
                    SolverError::InvalidState(format!(
                        "{} is registered as a shadow variable without a listener",
                        notifiable.label
                    ))
                })?;
            queues.push(NotificationQueue::new(listener.requires_unique_entity_events()));
            listeners.push(listener);
            owners.push(Some(notifiable.shadow));
            labels.push(notifiable.label.clone());
        }

        Ok(Self {
            by_source: registry.source_index(),
            by_entity: registry.entity_index(),
            descriptor,
            listeners,
            queues,
            owners,
            labels,
            supplies: HashMap::new(),
        })
    }

    pub fn descriptor(&self) -> &Arc<SolutionDescriptor<S>> {
        &self.descriptor
    }

    /// Resets every listener against a newly installed working solution.
    pub fn reset_working_solution(&mut self, solution: &S) -> Result<()> {
        for queue in &mut self.queues {
            queue.clear();
        }
        let view = ListenerView::new(solution, self.descriptor.as_ref());
        for (index, listener) in self.listeners.iter_mut().enumerate() {
            listener
                .reset_working_solution(view)
                .map_err(|e| listener_failed(&self.labels[index], e))?;
        }
        Ok(())
    }

    /// Runs the before hooks of `source`'s listeners and queues their after
    /// notifications.
    pub fn before_variable_changed(&mut self, solution: &S, source: VariableId, entity: usize) -> Result<()> {
        let Some(indices) = self.by_source.get(&source) else {
            return Ok(());
        };
        let view = ListenerView::new(solution, self.descriptor.as_ref());
        for &index in indices.iter() {
            self.listeners[index]
                .before_variable_changed(view, source, entity)
                .map_err(|e| listener_failed(&self.labels[index], e))?;
            self.queues[index].push(Notification::VariableChanged { source, entity });
        }
        Ok(())
    }

    pub fn before_entity_added(&mut self, solution: &S, entity_descriptor: usize, entity: usize) -> Result<()> {
        let Some(indices) = self.by_entity.get(&entity_descriptor) else {
            return Ok(());
        };
        let view = ListenerView::new(solution, self.descriptor.as_ref());
        for &index in indices.iter() {
            self.listeners[index]
                .before_entity_added(view, entity)
                .map_err(|e| listener_failed(&self.labels[index], e))?;
            self.queues[index].push(Notification::EntityAdded { entity });
        }
        Ok(())
    }

    pub fn before_entity_removed(&mut self, solution: &S, entity_descriptor: usize, entity: usize) -> Result<()> {
        let Some(indices) = self.by_entity.get(&entity_descriptor) else {
            return Ok(());
        };
        let view = ListenerView::new(solution, self.descriptor.as_ref());
        for &index in indices.iter() {
            self.listeners[index]
                .before_entity_removed(view, entity)
                .map_err(|e| listener_failed(&self.labels[index], e))?;
            self.queues[index].push(Notification::EntityRemoved { entity });
        }
        Ok(())
    }

    /// Drains every queue in notification order.
    ///
    /// Shadow writes made by a listener land in the queues of listeners
    /// further down the order, which this same pass then drains.
    pub fn trigger_variable_listeners(
        &mut self,
        solution: &mut S,
        observer: &mut dyn MutationObserver<S>,
    ) -> Result<()> {
        for index in 0..self.listeners.len() {
            while let Some(notification) = self.queues[index].pop() {
                let (head, downstream) = self.listeners.split_at_mut(index + 1);
                let (_, downstream_queues) = self.queues.split_at_mut(index + 1);
                let listener = &mut head[index];
                let mut ctx = ListenerContext {
                    solution: &mut *solution,
                    descriptor: self.descriptor.as_ref(),
                    observer: &mut *observer,
                    owner: self.owners[index],
                    by_source: &self.by_source,
                    offset: index + 1,
                    downstream,
                    downstream_queues,
                };
                let result = match notification {
                    Notification::VariableChanged { source, entity } => {
                        listener.after_variable_changed(&mut ctx, source, entity)
                    }
                    Notification::EntityAdded { entity } => listener.after_entity_added(&mut ctx, entity),
                    Notification::EntityRemoved { entity } => {
                        listener.after_entity_removed(&mut ctx, entity)
                    }
                };
                result.map_err(|e| listener_failed(&self.labels[index], e))?;
            }
        }
        Ok(())
    }

    /// Simulates a change of every genuine variable on every entity and
    /// triggers, recomputing all shadow variables from their sources.
    pub fn force_trigger_all_variable_listeners(
        &mut self,
        solution: &mut S,
        observer: &mut dyn MutationObserver<S>,
    ) -> Result<()> {
        let descriptor = Arc::clone(&self.descriptor);
        for &variable in descriptor.genuine_variables() {
            for entity in 0..descriptor.entity_count(solution, variable.entity) {
                self.before_variable_changed(solution, variable, entity)?;
            }
        }
        self.trigger_variable_listeners(solution, observer)
    }

    /// Fails when after-notifications are still waiting to be triggered.
    pub fn assert_notification_queues_are_empty(&self) -> Result<()> {
        match self.queues.iter().position(|q| !q.is_empty()) {
            Some(index) => Err(SolverError::NotificationQueueNotEmpty {
                listener: self.labels[index].clone(),
                pending: self.queues[index].len(),
            }),
            None => Ok(()),
        }
    }

    /// Total number of queued after-notifications.
    pub fn pending_notifications(&self) -> usize {
        self.queues.iter().map(NotificationQueue::len).sum()
    }

    /// Registers an externalized supply for `key`, or returns the one
    /// registered earlier.
    pub fn demand(&mut self, key: SupplyKey, factory: SupplyFactory<S>, solution: &S) -> Result<SupplyId> {
        if let Some(&id) = self.supplies.get(&key) {
            return Ok(id);
        }
        let index = self.listeners.len();
        let label = format!("{} supply of {}", key.kind, self.descriptor.variable_label(key.source));
        let mut listener = factory(key.source);
        listener
            .reset_working_solution(ListenerView::new(solution, self.descriptor.as_ref()))
            .map_err(|e| listener_failed(&label, e))?;

        trace!(event = "supply_demanded", supply = %label, slot = index);
        self.queues.push(NotificationQueue::new(listener.requires_unique_entity_events()));
        self.listeners.push(listener);
        self.owners.push(None);
        self.labels.push(label);
        self.by_source.entry(key.source).or_default().push(index);
        let by_entity = self.by_entity.entry(key.source.entity).or_default();
        if !by_entity.contains(&index) {
            by_entity.push(index);
        }

        let id = SupplyId(index);
        self.supplies.insert(key, id);
        Ok(id)
    }

    pub fn supply(&self, id: SupplyId) -> Option<&dyn VariableListener<S>> {
        self.listeners.get(id.0).map(|listener| &**listener)
    }

    /// Looks a supply up by its concrete type.
    pub fn supply_as<T: 'static>(&self, id: SupplyId) -> Option<&T> {
        self.listeners
            .get(id.0)
            .and_then(|listener| (**listener).as_any().downcast_ref::<T>())
    }

    /// Calls `f` on every listener that follows the solver lifecycle.
    pub fn for_each_lifecycle_listener(&mut self, mut f: impl FnMut(&mut dyn SolverLifecycleListener)) {
        for listener in &mut self.listeners {
            if let Some(lifecycle) = listener.as_lifecycle_listener() {
                f(lifecycle);
            }
        }
    }

    pub fn close(&mut self) {
        for listener in &mut self.listeners {
            listener.close();
        }
    }
}

fn listener_failed(label: &str, error: SolverError) -> SolverError {
    match error {
        SolverError::ListenerFailed { .. } => error,
        other => SolverError::ListenerFailed {
            listener: label.to_string(),
            message: other.to_string(),
        },
    }
}
