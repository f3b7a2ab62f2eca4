//! Deterministic RNG utilities for reproducible tests.

use nestnoise_core::tensor::Tensor;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Create a deterministic `ChaCha8Rng` from a seed.
///
/// All test randomization should go through this to ensure reproducibility.
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Generate a deterministic tensor of `shape` with values in `[-1, 1)`.
///
/// Useful for creating consistent policy outputs.
pub fn deterministic_tensor(shape: &[usize], seed: u64) -> Tensor {
    use rand::Rng;
    let mut rng = seeded_rng(seed);
    let mut tensor = Tensor::zeros(shape);
    for val in tensor.as_mut_slice() {
        *val = rng.gen_range(-1.0..1.0);
    }
    tensor
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
