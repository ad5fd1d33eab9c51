//! Configuration system for planwright.
//!
//! Load solver configuration from TOML or YAML to control the environment
//! mode, move threads, termination and the construction heuristic without
//! code changes.
//!
//! # Examples
//!
//! Load configuration from a TOML string:
//!
//! ```
//! use planwright_config::{MoveThreadCount, SolverConfig};
//! use std::time::Duration;
//!
//! let config = SolverConfig::from_toml_str(r#"
//!     environment_mode = "fast_assert"
//!     move_thread_count = { count = 2 }
//!     move_thread_buffer_size = 5
//!
//!     [termination]
//!     seconds_spent_limit = 30
//!
//!     [[phases]]
//!     type = "construction_heuristic"
//!     pick_early_type = "first_feasible_score"
//! "#).unwrap();
//!
//! assert_eq!(config.time_limit(), Some(Duration::from_secs(30)));
//! assert_eq!(config.move_thread_count, MoveThreadCount::Count(2));
//! assert_eq!(config.selected_move_buffer_size(2), 10);
//! ```
//!
//! Use the default config when the file is missing:
//!
//! ```
//! use planwright_config::SolverConfig;
//!
//! let config = SolverConfig::load("solver.toml").unwrap_or_default();
//! assert_eq!(config.flush_step_interval(), 100);
//! ```

use std::path::Path;
use std::time::Duration;

use planwright_core::SolverError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Moves selected per move thread and step when no buffer size is configured.
pub const DEFAULT_MOVE_THREAD_BUFFER_SIZE: usize = 10;

/// Steps between forced score calculations on flushing score backends.
pub const DEFAULT_FLUSH_STEP_INTERVAL: u64 = 100;

/// Seed used by reproducible runs that configure none.
pub const DEFAULT_RANDOM_SEED: u64 = 0;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<ConfigError> for SolverError {
    fn from(error: ConfigError) -> Self {
        SolverError::Config(error.to_string())
    }
}

/// Main solver configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SolverConfig {
    /// Environment mode affecting reproducibility and assertions.
    #[serde(default)]
    pub environment_mode: EnvironmentMode,

    /// Random seed for reproducible results.
    #[serde(default)]
    pub random_seed: Option<u64>,

    /// Number of threads for parallel move evaluation.
    #[serde(default)]
    pub move_thread_count: MoveThreadCount,

    /// Moves selected per move thread before results are foraged.
    #[serde(default)]
    pub move_thread_buffer_size: Option<usize>,

    /// Steps between forced score calculations when the score backend
    /// buffers changes.
    #[serde(default)]
    pub flush_step_interval: Option<u64>,

    /// Termination configuration.
    #[serde(default)]
    pub termination: Option<TerminationConfig>,

    /// Phase configurations.
    #[serde(default)]
    pub phases: Vec<PhaseConfig>,
}

impl SolverConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist or contains invalid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values no solver can run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.move_thread_count == MoveThreadCount::Count(0) {
            return Err(ConfigError::Invalid(
                "move_thread_count must be at least 1".to_string(),
            ));
        }
        if self.move_thread_buffer_size == Some(0) {
            return Err(ConfigError::Invalid(
                "move_thread_buffer_size must be at least 1".to_string(),
            ));
        }
        if self.flush_step_interval == Some(0) {
            return Err(ConfigError::Invalid(
                "flush_step_interval must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Sets the termination time limit.
    pub fn with_termination_seconds(mut self, seconds: u64) -> Self {
        self.termination = Some(TerminationConfig {
            seconds_spent_limit: Some(seconds),
            ..self.termination.unwrap_or_default()
        });
        self
    }

    /// Sets the termination step count limit.
    pub fn with_step_count_limit(mut self, steps: u64) -> Self {
        self.termination = Some(TerminationConfig {
            step_count_limit: Some(steps),
            ..self.termination.unwrap_or_default()
        });
        self
    }

    /// Sets the random seed.
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    pub fn with_environment_mode(mut self, mode: EnvironmentMode) -> Self {
        self.environment_mode = mode;
        self
    }

    pub fn with_move_thread_count(mut self, count: MoveThreadCount) -> Self {
        self.move_thread_count = count;
        self
    }

    pub fn with_move_thread_buffer_size(mut self, size: usize) -> Self {
        self.move_thread_buffer_size = Some(size);
        self
    }

    pub fn with_flush_step_interval(mut self, steps: u64) -> Self {
        self.flush_step_interval = Some(steps);
        self
    }

    /// Adds a phase configuration.
    pub fn with_phase(mut self, phase: PhaseConfig) -> Self {
        self.phases.push(phase);
        self
    }

    /// Returns the termination time limit, if configured.
    ///
    /// Convenience method that delegates to `termination.time_limit()`.
    ///
    /// # Examples
    ///
    /// ```
    /// use planwright_config::SolverConfig;
    /// use std::time::Duration;
    ///
    /// let config = SolverConfig::from_toml_str(r#"
    ///     [termination]
    ///     seconds_spent_limit = 30
    /// "#).unwrap();
    ///
    /// assert_eq!(config.time_limit(), Some(Duration::from_secs(30)));
    /// ```
    pub fn time_limit(&self) -> Option<Duration> {
        self.termination.as_ref().and_then(|t| t.time_limit())
    }

    /// Resolves the number of move threads on a machine with
    /// `available_processors` processors.
    ///
    /// `None` means single-threaded solving. `Auto` leaves one processor for
    /// the operating system and one for the solver thread, takes at most 4,
    /// and falls back to single-threaded solving below 2.
    pub fn resolve_move_thread_count(&self, available_processors: usize) -> Result<Option<usize>, ConfigError> {
        match self.move_thread_count {
            MoveThreadCount::None => Ok(None),
            MoveThreadCount::Auto => {
                let resolved = available_processors.saturating_sub(2).min(4);
                Ok((resolved > 1).then_some(resolved))
            }
            MoveThreadCount::Count(0) => Err(ConfigError::Invalid(
                "move_thread_count must be at least 1".to_string(),
            )),
            MoveThreadCount::Count(count) => Ok(Some(count)),
        }
    }

    /// Number of moves selected per step before results are foraged.
    pub fn selected_move_buffer_size(&self, move_thread_count: usize) -> usize {
        move_thread_count
            * self
                .move_thread_buffer_size
                .unwrap_or(DEFAULT_MOVE_THREAD_BUFFER_SIZE)
    }

    /// Steps between forced score calculations on flushing score backends.
    pub fn flush_step_interval(&self) -> u64 {
        self.flush_step_interval.unwrap_or(DEFAULT_FLUSH_STEP_INTERVAL)
    }

    /// The seed to use, or `None` to seed from OS entropy.
    pub fn effective_random_seed(&self) -> Option<u64> {
        match (self.random_seed, self.environment_mode) {
            (Some(seed), _) => Some(seed),
            (None, EnvironmentMode::NonReproducible) => None,
            (None, _) => Some(DEFAULT_RANDOM_SEED),
        }
    }
}

/// Environment mode affecting solver behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentMode {
    /// Non-reproducible mode with minimal overhead.
    NonReproducible,

    /// Reproducible mode with deterministic behavior.
    #[default]
    Reproducible,

    /// Fast assert mode: undo move scores, step scores and shadow variables
    /// are checked after every step.
    FastAssert,

    /// Full assert mode: fast asserts plus every move score is checked
    /// against a score calculated from scratch.
    FullAssert,
}

impl EnvironmentMode {
    /// True for the modes that run the intrusive fast assertions.
    pub fn is_fast_asserted(&self) -> bool {
        matches!(self, EnvironmentMode::FastAssert | EnvironmentMode::FullAssert)
    }

    /// True when move scores are checked against from-scratch scores.
    pub fn is_full_asserted(&self) -> bool {
        matches!(self, EnvironmentMode::FullAssert)
    }

    pub fn is_reproducible(&self) -> bool {
        !matches!(self, EnvironmentMode::NonReproducible)
    }
}

/// Move thread count configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveThreadCount {
    /// Automatically determine thread count.
    Auto,

    /// No parallel move evaluation.
    #[default]
    None,

    /// Specific number of threads.
    Count(usize),
}

/// Termination configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct TerminationConfig {
    /// Maximum seconds to spend solving.
    pub seconds_spent_limit: Option<u64>,

    /// Maximum minutes to spend solving.
    pub minutes_spent_limit: Option<u64>,

    /// Target best score to achieve (as string, e.g., "0hard/0soft").
    pub best_score_limit: Option<String>,

    /// Maximum number of steps.
    pub step_count_limit: Option<u64>,
}

impl TerminationConfig {
    /// Returns the time limit as a Duration, if any.
    pub fn time_limit(&self) -> Option<Duration> {
        let seconds =
            self.seconds_spent_limit.unwrap_or(0) + self.minutes_spent_limit.unwrap_or(0) * 60;
        if seconds > 0 {
            Some(Duration::from_secs(seconds))
        } else {
            None
        }
    }
}

/// Phase configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PhaseConfig {
    /// Construction heuristic phase.
    ConstructionHeuristic(ConstructionHeuristicConfig),
}

/// Construction heuristic configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ConstructionHeuristicConfig {
    /// Type of construction heuristic.
    #[serde(default)]
    pub construction_heuristic_type: ConstructionHeuristicType,

    /// When the forager stops evaluating the moves of a step.
    #[serde(default)]
    pub pick_early_type: PickEarlyType,

    /// Order in which the values of a placement are tried.
    #[serde(default)]
    pub value_selection_order: SelectionOrder,
}

/// Construction heuristic types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructionHeuristicType {
    /// Entities in declaration order, each assigned its best value.
    #[default]
    FirstFit,

    /// Same placement as `FirstFit`, named after the queue it drains.
    AllocateEntityFromQueue,
}

/// When a construction forager picks a move before every move of the step
/// was evaluated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PickEarlyType {
    /// Evaluate every move and pick the best.
    #[default]
    Never,

    /// Pick the first move scoring at least the last step score.
    FirstNonDeterioratingScore,

    /// Pick the first move with a feasible score.
    FirstFeasibleScore,

    /// Pick the first move with a feasible score or that does not
    /// deteriorate the hard levels of the last step score.
    FirstFeasibleScoreOrNonDeterioratingHard,
}

/// Selection order of values within a placement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionOrder {
    /// The order of the value range.
    #[default]
    Original,

    /// Shuffled with the solver's random generator.
    Random,
}

#[cfg(test)]
mod tests;
