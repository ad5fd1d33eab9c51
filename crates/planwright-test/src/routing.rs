//! Chained routing fixture: depots head chains of customers.
//!
//! Each customer's chained `previous` variable points at a depot (an
//! anchor) or at another customer. The `anchor` shadow holds the depot at
//! the head of the customer's chain. The score is minus the total distance
//! travelled along every chain, on a one-dimensional line.

use std::sync::Arc;

use planwright_core::{
    AnchorVariableListener, EntityDescriptor, PlanningSolution, PlanningValue, SimpleScore,
    SolutionDescriptor, SourceRef, VariableDescriptor, VariableId,
};

/// The chained variable.
pub const PREVIOUS: VariableId = VariableId::new(0, 0);
/// The anchor shadow variable.
pub const ANCHOR: VariableId = VariableId::new(0, 1);

#[derive(Clone, Debug, PartialEq)]
pub struct Customer {
    pub location: i64,
    pub previous: PlanningValue,
    pub anchor: PlanningValue,
}

impl Customer {
    pub fn at(location: i64) -> Self {
        Self {
            location,
            previous: PlanningValue::Unassigned,
            anchor: PlanningValue::Unassigned,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RoutingSolution {
    /// Depot locations; depot `d` is `PlanningValue::Anchor(d)`.
    pub depots: Vec<i64>,
    pub customers: Vec<Customer>,
    pub score: Option<SimpleScore>,
}

impl RoutingSolution {
    /// Unrouted customers at the given locations.
    pub fn new(depots: &[i64], customers: &[i64]) -> Self {
        Self {
            depots: depots.to_vec(),
            customers: customers.iter().map(|&l| Customer::at(l)).collect(),
            score: None,
        }
    }

    /// Sets `previous` directly, bypassing any score director.
    pub fn with_previous(mut self, previous: &[PlanningValue]) -> Self {
        for (customer, &value) in self.customers.iter_mut().zip(previous) {
            customer.previous = value;
        }
        self
    }

    /// Location of a chained value.
    pub fn location(&self, value: PlanningValue) -> Option<i64> {
        match value {
            PlanningValue::Anchor(depot) => self.depots.get(depot).copied(),
            PlanningValue::Entity(customer) => self.customers.get(customer).map(|c| c.location),
            _ => None,
        }
    }

    /// Customers of the chain headed by `depot`, in visiting order.
    pub fn chain(&self, depot: usize) -> Vec<usize> {
        let mut chain = Vec::new();
        let mut current = PlanningValue::Anchor(depot);
        while let Some(next) = self.customers.iter().position(|c| c.previous == current) {
            if chain.contains(&next) {
                break;
            }
            chain.push(next);
            current = PlanningValue::Entity(next);
        }
        chain
    }
}

impl PlanningSolution for RoutingSolution {
    type Score = SimpleScore;

    fn score(&self) -> Option<Self::Score> {
        self.score
    }

    fn set_score(&mut self, score: Option<Self::Score>) {
        self.score = score;
    }
}

fn chained_range(s: &RoutingSolution) -> Vec<PlanningValue> {
    (0..s.depots.len())
        .map(PlanningValue::Anchor)
        .chain((0..s.customers.len()).map(PlanningValue::Entity))
        .collect()
}

/// Descriptor of the routing fixture.
pub fn descriptor() -> Arc<SolutionDescriptor<RoutingSolution>> {
    let built = SolutionDescriptor::builder("RoutingSolution")
        .entity(
            EntityDescriptor::new("Customer", |s: &RoutingSolution| s.customers.len())
                .with_variable(VariableDescriptor::chained(
                    "previous",
                    |s: &RoutingSolution, i| s.customers[i].previous,
                    |s: &mut RoutingSolution, i, v| s.customers[i].previous = v,
                    chained_range,
                ))
                .with_variable(VariableDescriptor::shadow(
                    "anchor",
                    |s: &RoutingSolution, i| s.customers[i].anchor,
                    |s: &mut RoutingSolution, i, v| s.customers[i].anchor = v,
                    [SourceRef::new("Customer", "previous")],
                    AnchorVariableListener::boxed::<RoutingSolution>,
                )),
        )
        .build();
    match built {
        Ok(descriptor) => descriptor,
        Err(e) => panic!("routing descriptor is valid: {e}"),
    }
}

/// Minus the distance from every routed customer to its predecessor.
pub fn calculate_distance(solution: &RoutingSolution) -> SimpleScore {
    let distance: i64 = solution
        .customers
        .iter()
        .filter_map(|c| solution.location(c.previous).map(|from| (from - c.location).abs()))
        .sum();
    SimpleScore::of(-distance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_follows_previous_links() {
        let solution = RoutingSolution::new(&[0, 100], &[1, 2, 3]).with_previous(&[
            PlanningValue::Anchor(0),
            PlanningValue::Entity(2),
            PlanningValue::Entity(0),
        ]);
        assert_eq!(solution.chain(0), vec![0, 2, 1]);
        assert!(solution.chain(1).is_empty());
    }

    #[test]
    fn test_distance_ignores_unrouted_customers() {
        let solution = RoutingSolution::new(&[0], &[5, 7])
            .with_previous(&[PlanningValue::Anchor(0), PlanningValue::Unassigned]);
        assert_eq!(calculate_distance(&solution), SimpleScore::of(-5));
    }

    #[test]
    fn test_descriptor_orders_anchor_shadow() {
        let descriptor = descriptor();
        assert_eq!(descriptor.genuine_variables(), &[PREVIOUS]);
        assert_eq!(descriptor.listener_registry().notifiables()[0].shadow, ANCHOR);
    }
}
