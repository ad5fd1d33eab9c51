//! Listener traits and notifications.

use std::any::Any;

use super::context::{ListenerContext, ListenerView};
use crate::domain::value::VariableId;
use crate::error::Result;
use crate::lifecycle::SolverLifecycleListener;

/// Downcasting support for listeners, so externalized supplies can be
/// looked up by their concrete type.
pub trait ListenerAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> ListenerAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A unit of incremental recomputation, notified when a source variable
/// changes.
///
/// Before hooks run immediately, while the solution still holds the old
/// value. After hooks are queued and run when the score director triggers
/// listeners, in the global notification order, so an upstream shadow is
/// always up to date when a downstream listener reads it.
///
/// A listener may write only the shadow variable it owns, through
/// [`ListenerContext::set_shadow`]. Any error it returns is fatal to the
/// solving run.
pub trait VariableListener<S>: ListenerAny + Send {
    /// Called before `source` changes on `entity`.
    fn before_variable_changed(
        &mut self,
        _view: ListenerView<'_, S>,
        _source: VariableId,
        _entity: usize,
    ) -> Result<()> {
        Ok(())
    }

    /// Called after `source` changed on `entity`.
    fn after_variable_changed(
        &mut self,
        ctx: &mut ListenerContext<'_, S>,
        source: VariableId,
        entity: usize,
    ) -> Result<()>;

    fn before_entity_added(&mut self, _view: ListenerView<'_, S>, _entity: usize) -> Result<()> {
        Ok(())
    }

    fn after_entity_added(&mut self, _ctx: &mut ListenerContext<'_, S>, _entity: usize) -> Result<()> {
        Ok(())
    }

    fn before_entity_removed(&mut self, _view: ListenerView<'_, S>, _entity: usize) -> Result<()> {
        Ok(())
    }

    fn after_entity_removed(
        &mut self,
        _ctx: &mut ListenerContext<'_, S>,
        _entity: usize,
    ) -> Result<()> {
        Ok(())
    }

    /// When `true`, repeated notifications for the same entity are collapsed
    /// until the queue is drained.
    fn requires_unique_entity_events(&self) -> bool {
        false
    }

    /// Called when a new working solution is installed.
    fn reset_working_solution(&mut self, _view: ListenerView<'_, S>) -> Result<()> {
        Ok(())
    }

    /// Called when the owning score director is disposed.
    fn close(&mut self) {}

    /// Listeners with cached state that follows the solver lifecycle
    /// return themselves here.
    fn as_lifecycle_listener(&mut self) -> Option<&mut dyn SolverLifecycleListener> {
        None
    }
}

/// A queued after-notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notification {
    VariableChanged { source: VariableId, entity: usize },
    EntityAdded { entity: usize },
    EntityRemoved { entity: usize },
}

/// Observes every variable write, including shadow writes made by
/// listeners. Score calculation backends implement this to stay in sync.
pub trait MutationObserver<S> {
    fn before_variable_changed(&mut self, solution: &S, variable: VariableId, entity: usize);

    fn after_variable_changed(&mut self, solution: &S, variable: VariableId, entity: usize);
}

impl<S> MutationObserver<S> for () {
    fn before_variable_changed(&mut self, _solution: &S, _variable: VariableId, _entity: usize) {}

    fn after_variable_changed(&mut self, _solution: &S, _variable: VariableId, _entity: usize) {}
}
