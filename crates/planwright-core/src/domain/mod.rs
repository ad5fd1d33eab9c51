//! Domain model: planning solutions, descriptors and shadow variable wiring.

pub mod chained;
pub mod listener;

mod descriptor;
mod traits;
mod value;
mod variable;

pub use descriptor::{EntityDescriptor, SolutionDescriptor, SolutionDescriptorBuilder};
pub use traits::PlanningSolution;
pub use value::{PlanningValue, VariableId};
pub use variable::{
    ListenerFactory, ShadowBinding, SourceRef, ValueRangeFn, VariableAccessor, VariableDescriptor,
    VariableGetter, VariableKind, VariableSetter,
};
