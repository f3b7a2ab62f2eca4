//! Integration seam for transforms over nested tensors.

use nestnoise_core::error::InputError;
use nestnoise_core::nested::NestedTensor;

use crate::clipped::{CLIP_HIGH, CLIP_LOW};

// ---------------------------------------------------------------------------
// NestedModule
// ---------------------------------------------------------------------------

/// A named, parameter-free transform from one nested tensor to another of the
/// same structure.
///
/// Takes `&self` so a module can be shared across threads; stateful modules
/// guard their own state.
pub trait NestedModule: Send + Sync {
    /// Transform `inputs`, returning a new nested tensor.
    fn apply(&self, inputs: &NestedTensor) -> Result<NestedTensor, InputError>;

    /// Human-readable name for this module.
    fn name(&self) -> &str;

    /// Whether repeated calls on the same input give the same output.
    fn is_deterministic(&self) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Clip
// ---------------------------------------------------------------------------

/// Clamps every leaf into `[low, high]`.  The noise-free counterpart of
/// [`ClippedGaussian`](crate::clipped::ClippedGaussian).
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    low: f32,
    high: f32,
}

impl Clip {
    /// # Panics
    ///
    /// Panics if `low > high` or either bound is NaN.
    pub fn new(low: f32, high: f32) -> Self {
        assert!(low <= high, "Clip requires low <= high, got [{low}, {high}]");
        Self { low, high }
    }

    pub const fn bounds(&self) -> (f32, f32) {
        (self.low, self.high)
    }
}

impl Default for Clip {
    fn default() -> Self {
        Self {
            low: CLIP_LOW,
            high: CLIP_HIGH,
        }
    }
}

impl NestedModule for Clip {
    fn apply(&self, inputs: &NestedTensor) -> Result<NestedTensor, InputError> {
        Ok(inputs.clip(self.low, self.high))
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "clip"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
