//! Score inliners: accumulate constraint matches into a score.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use planwright_core::{Score, SolverError};

/// Accumulates weighted constraint matches.
///
/// `insert` and `retract` receive the match count of one entity for one
/// constraint; retracting exactly what was inserted restores the score.
pub trait ScoreInliner<Sc: Score>: Send {
    fn insert(&mut self, constraint: usize, matches: i64);

    fn retract(&mut self, constraint: usize, matches: i64);

    fn score(&self) -> Sc;
}

/// Builds an inliner from the per-constraint weights.
pub type InlinerConstructor<Sc> = fn(&[Sc]) -> Box<dyn ScoreInliner<Sc>>;

/// Sums `weight * matches` over all constraints, level by level.
#[derive(Debug, Clone)]
pub struct WeightedSumInliner<Sc: Score> {
    weights: Vec<Vec<i64>>,
    totals: Vec<i64>,
    _phantom: PhantomData<fn() -> Sc>,
}

impl<Sc: Score> WeightedSumInliner<Sc> {
    pub fn new(weights: &[Sc]) -> Self {
        Self {
            weights: weights.iter().map(Sc::to_level_numbers).collect(),
            totals: vec![0; Sc::levels_count()],
            _phantom: PhantomData,
        }
    }

    /// [`InlinerConstructor`] for this inliner.
    pub fn boxed(weights: &[Sc]) -> Box<dyn ScoreInliner<Sc>> {
        Box::new(Self::new(weights))
    }

    fn apply(&mut self, constraint: usize, matches: i64) {
        for (total, weight) in self.totals.iter_mut().zip(&self.weights[constraint]) {
            *total += weight * matches;
        }
    }
}

impl<Sc: Score> ScoreInliner<Sc> for WeightedSumInliner<Sc> {
    fn insert(&mut self, constraint: usize, matches: i64) {
        self.apply(constraint, matches);
    }

    fn retract(&mut self, constraint: usize, matches: i64) {
        self.apply(constraint, -matches);
    }

    fn score(&self) -> Sc {
        Sc::from_level_numbers(&self.totals)
    }
}

/// Explicit map from a score definition tag to its inliner.
///
/// Tags are the names used in configuration: `"simple"` for
/// [`SimpleScore`](planwright_core::SimpleScore), `"hard_soft"` for
/// [`HardSoftScore`](planwright_core::HardSoftScore).
pub struct InlinerRegistry<Sc: Score> {
    constructors: HashMap<&'static str, InlinerConstructor<Sc>>,
}

impl<Sc: Score> InlinerRegistry<Sc> {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// A registry with the built-in score definitions registered.
    pub fn with_defaults() -> Self {
        Self::new()
            .with("simple", WeightedSumInliner::<Sc>::boxed)
            .with("hard_soft", WeightedSumInliner::<Sc>::boxed)
    }

    pub fn with(mut self, tag: &'static str, constructor: InlinerConstructor<Sc>) -> Self {
        self.register(tag, constructor);
        self
    }

    pub fn register(&mut self, tag: &'static str, constructor: InlinerConstructor<Sc>) {
        self.constructors.insert(tag, constructor);
    }

    /// # Errors
    ///
    /// [`SolverError::UnknownScoreInliner`] if nothing is registered for `tag`.
    pub fn resolve(&self, tag: &str) -> Result<InlinerConstructor<Sc>, SolverError> {
        self.constructors
            .get(tag)
            .copied()
            .ok_or_else(|| SolverError::UnknownScoreInliner(tag.to_string()))
    }
}

impl<Sc: Score> Default for InlinerRegistry<Sc> {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl<Sc: Score> fmt::Debug for InlinerRegistry<Sc> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<_> = self.constructors.keys().collect();
        tags.sort();
        f.debug_struct("InlinerRegistry").field("tags", &tags).finish()
    }
}
