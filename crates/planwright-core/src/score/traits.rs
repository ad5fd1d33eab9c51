//! Core Score trait definition

use std::fmt::{Debug, Display};
use std::ops::{Add, Neg, Sub};

use super::ScoreLevel;

/// Core trait for all score types in planwright.
///
/// Scores are immutable, totally ordered and additive. Every score also
/// carries an init score: the negated number of genuine planning variables
/// that are still unassigned. The init score is compared before any level,
/// so a fully assigned solution always beats a partially assigned one.
///
/// Score calculation backends produce scores with an init score of zero;
/// the score director then overrides it with its own uninitialized count
/// via [`Score::with_init_score`].
pub trait Score:
    Copy
    + Debug
    + Display
    + Default
    + Send
    + Sync
    + PartialEq
    + Eq
    + PartialOrd
    + Ord
    + Add<Output = Self>
    + Sub<Output = Self>
    + Neg<Output = Self>
    + 'static
{
    /// Returns true if this score represents a feasible solution.
    ///
    /// A solution is feasible when it is fully initialized and all hard
    /// constraints are satisfied.
    fn is_feasible(&self) -> bool;

    /// Returns the zero score (identity element for addition).
    fn zero() -> Self;

    /// Returns the number of score levels, excluding the init score.
    fn levels_count() -> usize;

    /// Returns the score values as a vector of i64, highest priority first.
    fn to_level_numbers(&self) -> Vec<i64>;

    /// Creates a score from level numbers with an init score of zero.
    ///
    /// # Panics
    /// Panics if the number of levels doesn't match `levels_count()`.
    fn from_level_numbers(levels: &[i64]) -> Self;

    /// Returns the init score: zero or the negated unassigned variable count.
    fn init_score(&self) -> i32;

    /// Returns a copy of this score with the given init score.
    fn with_init_score(&self, init_score: i32) -> Self;

    /// Returns true if no genuine variable was unassigned when this score
    /// was calculated.
    fn is_solution_initialized(&self) -> bool {
        self.init_score() >= 0
    }

    /// Multiplies every level by a scalar. The init score is kept.
    fn multiply(&self, multiplicand: f64) -> Self;

    /// Divides every level by a scalar. The init score is kept.
    fn divide(&self, divisor: f64) -> Self;

    /// Returns the absolute value of every level.
    fn abs(&self) -> Self;

    /// Returns the semantic label for the score level at the given index.
    ///
    /// # Panics
    /// Panics if `index >= levels_count()`.
    fn level_label(index: usize) -> ScoreLevel;

    /// Returns true if this score is better than the other score.
    fn is_better_than(&self, other: &Self) -> bool {
        self > other
    }

    /// Returns true if this score is worse than the other score.
    fn is_worse_than(&self, other: &Self) -> bool {
        self < other
    }
}

/// Marker trait for scores that can be parsed from a string.
pub trait ParseableScore: Score {
    /// Parses a score from a string representation.
    ///
    /// # Format
    /// - SimpleScore: "42" or "-3init/42"
    /// - HardSoftScore: "0hard/-100soft" or "-2init/-1hard/0soft"
    fn parse(s: &str) -> Result<Self, ScoreParseError>;

    /// Returns the string representation of this score.
    fn to_string_repr(&self) -> String;
}

/// Error when parsing a score from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreParseError {
    pub message: String,
}

impl std::fmt::Display for ScoreParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Score parse error: {}", self.message)
    }
}

impl std::error::Error for ScoreParseError {}

/// Splits an optional leading `"<n>init/"` part off a score string.
pub(crate) fn split_init_score(s: &str) -> Result<(i32, &str), ScoreParseError> {
    let s = s.trim();
    match s.split_once('/') {
        Some((head, rest)) if head.trim().ends_with("init") => {
            let digits = head.trim().trim_end_matches("init");
            let init = digits.parse::<i32>().map_err(|e| ScoreParseError {
                message: format!("Invalid init score '{}': {}", digits, e),
            })?;
            Ok((init, rest))
        }
        _ => Ok((0, s)),
    }
}
