//! Shared test fixtures and utilities for nestnoise crates.
//!
//! Provides deterministic RNG setup, reproducible tensors, and the nested
//! action bundles used across the noise tests.

pub mod fixtures;
pub mod rng;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use fixtures::{all_within, nested_fixture, scenario_tensor};
pub use rng::{deterministic_tensor, seeded_rng};
