//! Doubling fixture: each item has a genuine value `V` in `{1, 2, 3}` and
//! a shadow `S` that a listener keeps at `2 * V`.
//!
//! The score penalizes the distance of every `S` to a target, so the best
//! value of every item is `target / 2`. Reading the shadow in the score
//! function catches stale shadows immediately.

use std::sync::Arc;

use planwright_core::domain::listener::{ListenerContext, VariableListener};
use planwright_core::{
    EntityDescriptor, PlanningSolution, PlanningValue, Result, ShadowBinding, SimpleScore,
    SolutionDescriptor, SolverError, SourceRef, VariableDescriptor, VariableId,
};

/// The genuine variable `V`.
pub const VALUE: VariableId = VariableId::new(0, 0);
/// The shadow variable `S`.
pub const DOUBLED: VariableId = VariableId::new(0, 1);

/// Value `S` should reach on every item.
pub const TARGET: i64 = 4;

#[derive(Clone, Debug, PartialEq)]
pub struct DoublingSolution {
    pub values: Vec<PlanningValue>,
    pub doubled: Vec<PlanningValue>,
    pub score: Option<SimpleScore>,
}

impl DoublingSolution {
    /// `n` items with no value assigned.
    pub fn uninitialized(n: usize) -> Self {
        Self {
            values: vec![PlanningValue::Unassigned; n],
            doubled: vec![PlanningValue::Unassigned; n],
            score: None,
        }
    }

    /// Items with the given values; shadows are left stale on purpose.
    pub fn with_values(values: &[Option<i64>]) -> Self {
        Self {
            values: values.iter().map(|&v| PlanningValue::from(v)).collect(),
            doubled: vec![PlanningValue::Unassigned; values.len()],
            score: None,
        }
    }
}

impl PlanningSolution for DoublingSolution {
    type Score = SimpleScore;

    fn score(&self) -> Option<Self::Score> {
        self.score
    }

    fn set_score(&mut self, score: Option<Self::Score>) {
        self.score = score;
    }
}

/// Keeps `S = 2 * V`. Fails whenever `V` equals `fail_on`.
#[derive(Debug, Clone)]
pub struct DoublingListener {
    source: VariableId,
    shadow: VariableId,
    fail_on: Option<i64>,
}

impl VariableListener<DoublingSolution> for DoublingListener {
    fn after_variable_changed(
        &mut self,
        ctx: &mut ListenerContext<'_, DoublingSolution>,
        _source: VariableId,
        entity: usize,
    ) -> Result<()> {
        let value = ctx.value(self.source, entity).as_int();
        if value.is_some() && value == self.fail_on {
            return Err(SolverError::InvalidState(format!(
                "refusing to double {} on item {}",
                value.unwrap_or_default(),
                entity
            )));
        }
        ctx.set_shadow(self.shadow, entity, value.map(|v| v * 2).into())
    }
}

fn value_range(_: &DoublingSolution) -> Vec<PlanningValue> {
    (1..=3).map(PlanningValue::Int).collect()
}

fn build(fail_on: Option<i64>) -> Result<Arc<SolutionDescriptor<DoublingSolution>>> {
    SolutionDescriptor::builder("DoublingSolution")
        .entity(
            EntityDescriptor::new("Item", |s: &DoublingSolution| s.values.len())
                .with_variable(VariableDescriptor::genuine(
                    "value",
                    |s: &DoublingSolution, i| s.values[i],
                    |s: &mut DoublingSolution, i, v| s.values[i] = v,
                    value_range,
                ))
                .with_variable(VariableDescriptor::shadow(
                    "doubled",
                    |s: &DoublingSolution, i| s.doubled[i],
                    |s: &mut DoublingSolution, i, v| s.doubled[i] = v,
                    [SourceRef::new("Item", "value")],
                    move |binding: &ShadowBinding| -> Box<dyn VariableListener<DoublingSolution>> {
                        Box::new(DoublingListener {
                            source: binding.sources[0],
                            shadow: binding.shadow,
                            fail_on,
                        })
                    },
                )),
        )
        .build()
}

/// Descriptor of the doubling fixture.
pub fn descriptor() -> Arc<SolutionDescriptor<DoublingSolution>> {
    match build(None) {
        Ok(descriptor) => descriptor,
        Err(e) => panic!("doubling descriptor is valid: {e}"),
    }
}

/// Descriptor whose doubling listener fails when `V == fail_on`.
pub fn failing_descriptor(fail_on: i64) -> Arc<SolutionDescriptor<DoublingSolution>> {
    match build(Some(fail_on)) {
        Ok(descriptor) => descriptor,
        Err(e) => panic!("doubling descriptor is valid: {e}"),
    }
}

/// Distance of one item's shadow to [`TARGET`]; zero while unassigned.
pub fn item_penalty(solution: &DoublingSolution, item: usize) -> i64 {
    solution.doubled[item]
        .as_int()
        .map_or(0, |doubled| (doubled - TARGET).abs())
}

/// Minus the summed distance of every shadow to [`TARGET`].
pub fn calculate_score(solution: &DoublingSolution) -> SimpleScore {
    let penalty: i64 = (0..solution.values.len())
        .map(|item| item_penalty(solution, item))
        .sum();
    SimpleScore::of(-penalty)
}

/// Number of items, for constraint-backed calculators.
pub fn entity_count(solution: &DoublingSolution, _entity_descriptor: usize) -> usize {
    solution.values.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_registers_shadow() {
        let descriptor = descriptor();
        assert_eq!(descriptor.genuine_variables(), &[VALUE]);
        assert_eq!(descriptor.shadow_variables().collect::<Vec<_>>(), vec![DOUBLED]);
        assert_eq!(descriptor.listener_registry().len(), 1);
    }

    #[test]
    fn test_score_reads_shadow() {
        let mut solution = DoublingSolution::with_values(&[Some(1), Some(3)]);
        assert_eq!(calculate_score(&solution), SimpleScore::of(0));
        solution.doubled = vec![PlanningValue::Int(2), PlanningValue::Int(6)];
        assert_eq!(calculate_score(&solution), SimpleScore::of(-4));
    }
}
