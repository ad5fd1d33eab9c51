//! Variable listener infrastructure for shadow variable updates.
//!
//! - [`VariableListenerRegistry`]: the immutable, topologically sorted
//!   notification order, built once per solution descriptor
//! - [`VariableListenerSupport`]: one set of listener instances and
//!   notification queues per score director
//! - [`VariableListener`]: the unit of incremental recomputation
//!
//! Before hooks run immediately; after hooks are queued and drained in
//! notification order when the score director triggers listeners.

mod context;
mod queue;
mod registry;
mod support;
mod traits;


pub use context::{ListenerContext, ListenerView};
pub use queue::NotificationQueue;
pub use registry::{Notifiable, VariableListenerRegistry};
pub use support::{SupplyFactory, SupplyId, SupplyKey, VariableListenerSupport};
pub use traits::{ListenerAny, MutationObserver, Notification, VariableListener};
