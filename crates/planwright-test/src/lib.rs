//! Shared test fixtures for planwright crates.
//!
//! This crate provides data types, descriptors and pure score functions for
//! testing. It does NOT depend on `planwright-scoring` to avoid circular
//! dependencies; score functions are plain `fn(&S) -> S::Score` pointers.
//!
//! - [`doubling`] - One genuine variable and a shadow holding twice its value
//! - [`routing`] - Chained customers behind depots, with an anchor shadow
//! - [`nqueens`] - N-Queens data types and conflict calculation
//!
//! # Usage
//!
//! Add as a dev-dependency in your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! planwright-test = { workspace = true }
//! ```

pub mod doubling;
pub mod nqueens;
pub mod routing;

mod logging;

pub use doubling::DoublingSolution;
pub use logging::init_test_logging;
pub use nqueens::{NQueensSolution, Queen};
pub use routing::RoutingSolution;
