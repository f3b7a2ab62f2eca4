//! Counter-based, splittable pseudo-random keys.
//!
//! A [`PrngKey`] names one independent ChaCha8 sub-stream: the 64-bit seed
//! selects the key schedule and the 64-bit stream id selects the nonce, so
//! two keys that differ in either field never share output.  Keys are plain
//! values; nothing here touches process-wide random state.
//!
//! [`PrngSequence`] turns a single seed into an endless run of keys by
//! counting: the `n`-th key handed out is `(seed, n)`.
//!
//! ```text
//! seed 42
//! ├── next_key() -> (42, 0)
//! ├── next_key() -> (42, 1)
//! └── next_key() -> (42, 2) ...
//! ```

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::tensor::Tensor;

// ---------------------------------------------------------------------------
// PrngKey
// ---------------------------------------------------------------------------

/// Reproducible random sub-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrngKey {
    seed: u64,
    stream: u64,
}

impl PrngKey {
    /// Root key for a seed (stream 0).
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self { seed, stream: 0 }
    }

    #[must_use]
    pub const fn from_parts(seed: u64, stream: u64) -> Self {
        Self { seed, stream }
    }

    pub const fn seed(&self) -> u64 {
        self.seed
    }

    pub const fn stream(&self) -> u64 {
        self.stream
    }

    /// Fresh generator positioned at the start of this key's stream.
    #[must_use]
    pub fn rng(&self) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        rng.set_stream(self.stream);
        rng
    }

    /// Derive two new keys from this one.
    ///
    /// The children are seeded from this key's own output, so they are as
    /// reproducible as the parent and independent of its sibling keys.
    #[must_use]
    pub fn split(&self) -> (Self, Self) {
        let mut rng = self.rng();
        (Self::new(rng.next_u64()), Self::new(rng.next_u64()))
    }

    /// Derive a key from this one and extra `data` (e.g. a step index).
    #[must_use]
    pub fn fold_in(&self, data: u64) -> Self {
        let mut rng = self.rng();
        Self::from_parts(rng.next_u64(), data)
    }
}

// ---------------------------------------------------------------------------
// PrngSequence
// ---------------------------------------------------------------------------

/// Seeded key dispenser that advances a counter on every draw.
///
/// The counter is never reset; once `u64::MAX` keys have been handed out it
/// wraps, which no realistic run reaches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrngSequence {
    seed: u64,
    counter: u64,
}

impl PrngSequence {
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self { seed, counter: 0 }
    }

    /// Sequence rooted at a derived key rather than a raw seed.
    #[must_use]
    pub fn from_key(key: PrngKey) -> Self {
        Self::new(key.rng().next_u64())
    }

    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of keys handed out so far.
    pub const fn draws(&self) -> u64 {
        self.counter
    }

    /// Return the current key and advance the counter.
    pub fn next_key(&mut self) -> PrngKey {
        let key = self.peek();
        self.counter = self.counter.wrapping_add(1);
        key
    }

    /// The key the next [`next_key`](Self::next_key) call will return.
    pub const fn peek(&self) -> PrngKey {
        PrngKey::from_parts(self.seed, self.counter)
    }

    /// Hand out `n` consecutive keys.
    pub fn take(&mut self, n: usize) -> Vec<PrngKey> {
        (0..n).map(|_| self.next_key()).collect()
    }
}

// ---------------------------------------------------------------------------
// Sampling
// ---------------------------------------------------------------------------

/// Draw a standard-normal tensor of the given shape from `key`.
///
/// Elements are generated in row-major order from the start of the key's
/// stream, so the same key and shape always give the same tensor.
pub fn standard_normal(key: &PrngKey, shape: &[usize]) -> Tensor {
    let mut rng = key.rng();
    let mut noise = Tensor::zeros(shape);
    for val in noise.as_mut_slice() {
        *val = StandardNormal.sample(&mut rng);
    }
    noise
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_rng_is_deterministic() {
        let key = PrngKey::from_parts(7, 3);
        assert_eq!(key.rng().next_u64(), key.rng().next_u64());
    }

    #[test]
    fn different_streams_differ() {
        let a = PrngKey::from_parts(7, 0).rng().next_u64();
        let b = PrngKey::from_parts(7, 1).rng().next_u64();
        assert_ne!(a, b);
    }

    #[test]
    fn split_children_differ_from_each_other() {
        let (left, right) = PrngKey::new(42).split();
        assert_ne!(left, right);
        assert_eq!(PrngKey::new(42).split(), (left, right));
    }

    #[test]
    fn fold_in_depends_on_data() {
        let key = PrngKey::new(1);
        assert_ne!(key.fold_in(0), key.fold_in(1));
        assert_eq!(key.fold_in(5), key.fold_in(5));
    }

    #[test]
    fn sequence_counts_draws() {
        let mut seq = PrngSequence::new(42);
        assert_eq!(seq.draws(), 0);
        let peeked = seq.peek();
        assert_eq!(seq.next_key(), peeked);
        assert_eq!(seq.draws(), 1);
        let keys = seq.take(3);
        assert_eq!(keys.len(), 3);
        assert_eq!(seq.draws(), 4);
    }

    #[test]
    fn sequence_keys_are_distinct() {
        let keys: Vec<PrngKey> = PrngSequence::new(0).take(16);
        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn sequences_with_same_seed_match() {
        let a: Vec<PrngKey> = PrngSequence::new(9).take(5);
        let b: Vec<PrngKey> = PrngSequence::new(9).take(5);
        assert_eq!(a, b);
    }

    #[test]
    fn standard_normal_has_requested_shape() {
        let noise = standard_normal(&PrngKey::new(0), &[2, 3]);
        assert_eq!(noise.shape(), &[2, 3]);
        assert_eq!(noise.len(), 6);
    }

    #[test]
    fn standard_normal_is_reproducible() {
        let key = PrngKey::from_parts(42, 7);
        assert_eq!(standard_normal(&key, &[8]), standard_normal(&key, &[8]));
    }

    #[test]
    fn standard_normal_moments_look_right() {
        let noise = standard_normal(&PrngKey::new(123), &[20_000]);
        #[allow(clippy::cast_precision_loss)]
        let n = noise.len() as f32;
        let mean = noise.as_slice().iter().sum::<f32>() / n;
        let var = noise.as_slice().iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n;
        assert!(mean.abs() < 0.05, "mean {mean}");
        assert!((var - 1.0).abs() < 0.05, "variance {var}");
    }
}
