//! Clipped Gaussian exploration noise.
//!
//! [`ClippedGaussian`] perturbs every leaf of a [`NestedTensor`] with
//! independent zero-mean Gaussian noise scaled by `stddev`, then clamps the
//! result into `[-1, 1]`:
//!
//! ```text
//! out = clip(a + N(0, 1) * stddev, -1, 1)
//! ```
//!
//! Each leaf consumes exactly one key from the instance's
//! [`PrngSequence`], so two leaves never share noise and two fresh instances
//! with the same seed produce identical output for identical input.

use std::sync::{Mutex, MutexGuard, PoisonError};

use nestnoise_core::config::ClippedGaussianConfig;
use nestnoise_core::error::{ConfigError, InputError, NoiseError};
use nestnoise_core::nested::NestedTensor;
use nestnoise_core::prng::{PrngSequence, standard_normal};
use nestnoise_core::tensor::Tensor;
use serde_json::Value;
use tracing::{debug, info, trace};

use crate::module::NestedModule;

/// Lower clamp bound for every output element.
pub const CLIP_LOW: f32 = -1.0;
/// Upper clamp bound for every output element.
pub const CLIP_HIGH: f32 = 1.0;

// ---------------------------------------------------------------------------
// ClippedGaussian
// ---------------------------------------------------------------------------

/// Adds clipped Gaussian noise to each leaf of a nested tensor.
///
/// Thread-safe via [`Mutex`]: the key sequence is locked for the whole of an
/// [`apply`](Self::apply) call, so one call always receives a contiguous run
/// of keys and concurrent calls never draw the same key.
///
/// Not `Clone`: a clone would replay the same noise.
#[derive(Debug)]
pub struct ClippedGaussian {
    name: String,
    stddev: f32,
    seed: u64,
    sequence: Mutex<PrngSequence>,
}

impl ClippedGaussian {
    /// Create with the default name `"clipped_gaussian"`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NonFiniteStdDev`] if `stddev` is NaN or infinite.
    pub fn new(stddev: f32, seed: u64) -> Result<Self, ConfigError> {
        Self::from_config(&ClippedGaussianConfig::new(stddev, seed))
    }

    /// Create with an explicit module name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NonFiniteStdDev`] for a non-finite `stddev` and
    /// [`ConfigError::EmptyName`] for a blank name.
    pub fn with_name(stddev: f32, seed: u64, name: impl Into<String>) -> Result<Self, ConfigError> {
        Self::from_config(&ClippedGaussianConfig {
            stddev,
            seed,
            name: name.into(),
        })
    }

    /// Create from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns whatever [`ClippedGaussianConfig::validate`] rejects.
    pub fn from_config(config: &ClippedGaussianConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            name = %config.name,
            stddev = config.stddev,
            seed = config.seed,
            "created clipped gaussian noise"
        );
        Ok(Self {
            name: config.name.clone(),
            stddev: config.stddev,
            seed: config.seed,
            sequence: Mutex::new(PrngSequence::new(config.seed)),
        })
    }

    pub const fn stddev(&self) -> f32 {
        self.stddev
    }

    pub const fn seed(&self) -> u64 {
        self.seed
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of leaves perturbed so far (one key drawn per leaf).
    pub fn draws(&self) -> u64 {
        self.lock_sequence().draws()
    }

    /// Perturb every leaf of `inputs` and return a new nested tensor of the
    /// same structure.  `inputs` is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`InputError`] if a leaf cannot be combined with its noise.
    /// Leaves built through [`Tensor`](nestnoise_core::tensor::Tensor)
    /// constructors always satisfy this.
    ///
    /// NaN elements are not clamped: they come out as NaN (and as `null` in
    /// the JSON form).
    pub fn apply(&self, inputs: &NestedTensor) -> Result<NestedTensor, InputError> {
        let mut sequence = self.lock_sequence();
        let first_draw = sequence.draws();
        let stddev = self.stddev;

        let output = inputs.try_map_structure_with_path(|path, leaf| -> Result<Tensor, InputError> {
            let key = sequence.next_key();
            trace!(%path, stream = key.stream(), "perturbing leaf");
            let noise = standard_normal(&key, leaf.shape());
            let mut noisy = leaf.add_scaled(&noise, stddev)?;
            noisy.clip_in_place(CLIP_LOW, CLIP_HIGH);
            Ok(noisy)
        })?;

        debug!(
            name = %self.name,
            leaves = sequence.draws() - first_draw,
            first_draw,
            "applied clipped gaussian noise"
        );
        Ok(output)
    }

    /// JSON front end for [`apply`](Self::apply).
    ///
    /// The input is fully converted before any key is drawn, so a rejected
    /// document leaves the sequence where it was.
    ///
    /// # Errors
    ///
    /// Returns [`NoiseError::Input`] for non-numeric leaves or ragged arrays.
    pub fn apply_json(&self, inputs: &Value) -> Result<Value, NoiseError> {
        let nested = NestedTensor::from_json(inputs)?;
        Ok(self.apply(&nested)?.to_json())
    }

    fn lock_sequence(&self) -> MutexGuard<'_, PrngSequence> {
        // The counter only moves after a key is produced, so a poisoned
        // guard still holds a consistent sequence.
        self.sequence.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl NestedModule for ClippedGaussian {
    fn apply(&self, inputs: &NestedTensor) -> Result<NestedTensor, InputError> {
        Self::apply(self, inputs)
    }

    fn name(&self) -> &str {
        &self.name
    }

    #[allow(clippy::float_cmp)] // exact zero disables the noise term entirely
    fn is_deterministic(&self) -> bool {
        self.stddev == 0.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
