//! Planning values and variable addressing.

use std::fmt;

/// The value held by a planning or shadow variable.
///
/// Entity references are indices into the owning entity collection, so
/// chains are arena links rather than pointers and survive solution cloning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub enum PlanningValue {
    /// No value assigned yet.
    #[default]
    Unassigned,
    /// A plain integer value.
    Int(i64),
    /// Another planning entity, by index.
    Entity(usize),
    /// A chain anchor (a problem fact heading a chain), by index.
    Anchor(usize),
}

impl PlanningValue {
    /// Returns true unless the value is [`PlanningValue::Unassigned`].
    #[inline]
    pub fn is_assigned(&self) -> bool {
        !matches!(self, PlanningValue::Unassigned)
    }

    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            PlanningValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_entity(&self) -> Option<usize> {
        match self {
            PlanningValue::Entity(e) => Some(*e),
            _ => None,
        }
    }

    #[inline]
    pub fn as_anchor(&self) -> Option<usize> {
        match self {
            PlanningValue::Anchor(a) => Some(*a),
            _ => None,
        }
    }
}

impl From<Option<i64>> for PlanningValue {
    fn from(value: Option<i64>) -> Self {
        value.map_or(PlanningValue::Unassigned, PlanningValue::Int)
    }
}

impl fmt::Display for PlanningValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanningValue::Unassigned => write!(f, "unassigned"),
            PlanningValue::Int(v) => write!(f, "{}", v),
            PlanningValue::Entity(e) => write!(f, "entity#{}", e),
            PlanningValue::Anchor(a) => write!(f, "anchor#{}", a),
        }
    }
}

/// Identifies one variable of one entity class.
///
/// `entity` indexes the entity descriptors of a solution descriptor,
/// `variable` indexes the variables of that entity descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId {
    pub entity: usize,
    pub variable: usize,
}

impl VariableId {
    pub const fn new(entity: usize, variable: usize) -> Self {
        Self { entity, variable }
    }
}

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity, self.variable)
    }
}
