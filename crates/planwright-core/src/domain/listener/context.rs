//! Views handed to listeners while they run.

use std::collections::HashMap;

use smallvec::SmallVec;

use super::queue::NotificationQueue;
use super::traits::{MutationObserver, Notification, VariableListener};
use crate::domain::descriptor::SolutionDescriptor;
use crate::domain::value::{PlanningValue, VariableId};
use crate::error::{Result, SolverError};

/// Read-only access to the working solution.
pub struct ListenerView<'a, S> {
    solution: &'a S,
    descriptor: &'a SolutionDescriptor<S>,
}

impl<S> Clone for ListenerView<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for ListenerView<'_, S> {}

impl<'a, S> ListenerView<'a, S> {
    pub fn new(solution: &'a S, descriptor: &'a SolutionDescriptor<S>) -> Self {
        Self {
            solution,
            descriptor,
        }
    }

    pub fn solution(&self) -> &'a S {
        self.solution
    }

    pub fn descriptor(&self) -> &'a SolutionDescriptor<S> {
        self.descriptor
    }

    pub fn value(&self, variable: VariableId, entity: usize) -> PlanningValue {
        self.descriptor.get(&*self.solution, variable, entity)
    }

    pub fn entity_count(&self, entity_descriptor: usize) -> usize {
        self.descriptor.entity_count(&*self.solution, entity_descriptor)
    }
}

/// Mutable access for a listener running its after hook.
///
/// Writes are limited to the shadow variable the running listener owns.
/// Each write notifies the listeners downstream of that variable, which
/// always sit later in the notification order.
pub struct ListenerContext<'a, S> {
    pub(super) solution: &'a mut S,
    pub(super) descriptor: &'a SolutionDescriptor<S>,
    pub(super) observer: &'a mut dyn MutationObserver<S>,
    pub(super) owner: Option<VariableId>,
    pub(super) by_source: &'a HashMap<VariableId, SmallVec<[usize; 4]>>,
    pub(super) offset: usize,
    pub(super) downstream: &'a mut [Box<dyn VariableListener<S>>],
    pub(super) downstream_queues: &'a mut [NotificationQueue],
}

impl<S: 'static> ListenerContext<'_, S> {
    pub fn solution(&self) -> &S {
        &*self.solution
    }

    pub fn descriptor(&self) -> &SolutionDescriptor<S> {
        self.descriptor
    }

    pub fn view(&self) -> ListenerView<'_, S> {
        ListenerView::new(&*self.solution, self.descriptor)
    }

    pub fn value(&self, variable: VariableId, entity: usize) -> PlanningValue {
        self.descriptor.get(&*self.solution, variable, entity)
    }

    pub fn entity_count(&self, entity_descriptor: usize) -> usize {
        self.descriptor.entity_count(&*self.solution, entity_descriptor)
    }

    /// The shadow variable the running listener may write, if any.
    pub fn owned_variable(&self) -> Option<VariableId> {
        self.owner
    }

    /// Writes the owned shadow variable of `entity`.
    ///
    /// Writing the value the variable already holds is a no-op and
    /// notifies nobody.
    pub fn set_shadow(&mut self, variable: VariableId, entity: usize, value: PlanningValue) -> Result<()> {
        if self.owner != Some(variable) {
            return Err(SolverError::InvalidState(format!(
                "listener tried to write {} which it does not own",
                self.descriptor.variable_label(variable)
            )));
        }
        if self.value(variable, entity) == value {
            return Ok(());
        }

        self.observer.before_variable_changed(&*self.solution, variable, entity);
        if let Some(indices) = self.by_source.get(&variable) {
            for &index in indices.iter() {
                let Some(local) = index.checked_sub(self.offset) else {
                    return Err(SolverError::InvalidState(format!(
                        "{} is observed by a listener that runs before its writer",
                        self.descriptor.variable_label(variable)
                    )));
                };
                let view = ListenerView::new(&*self.solution, self.descriptor);
                self.downstream[local].before_variable_changed(view, variable, entity)?;
                self.downstream_queues[local].push(Notification::VariableChanged {
                    source: variable,
                    entity,
                });
            }
        }
        self.descriptor.set(&mut *self.solution, variable, entity, value);
        self.observer.after_variable_changed(&*self.solution, variable, entity);
        Ok(())
    }
}
