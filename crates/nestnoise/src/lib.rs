//! Clipped Gaussian exploration noise for reinforcement-learning policies.
//!
//! `nestnoise` perturbs structured policy outputs (a
//! [`NestedTensor`](nestnoise_core::nested::NestedTensor) of action arrays)
//! with independent Gaussian noise per leaf and clamps the result into
//! `[-1, 1]`.  All randomness comes from an explicit, seeded key sequence, so
//! runs are reproducible from the seed alone.
//!
//! # Architecture
//!
//! - [`ClippedGaussian`](clipped::ClippedGaussian) owns a
//!   [`PrngSequence`](nestnoise_core::prng::PrngSequence) and draws one key
//!   per leaf.
//! - [`NestedModule`](module::NestedModule) is the trait a surrounding
//!   network framework calls into; [`Clip`](module::Clip) is its noise-free
//!   sibling.
//!
//! # Quick Start
//!
//! ```
//! use nestnoise::prelude::*;
//!
//! let noise = ClippedGaussian::new(0.1, 42).unwrap();
//! let action = NestedTensor::map([
//!     ("arm", NestedTensor::leaf(Tensor::vector(vec![0.5, -0.2]))),
//!     ("gripper", NestedTensor::leaf(Tensor::scalar(1.0))),
//! ]);
//! let noisy = noise.apply(&action).unwrap();
//! assert_eq!(noisy.structure(), action.structure());
//! ```

pub mod clipped;
pub mod module;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::clipped::{CLIP_HIGH, CLIP_LOW, ClippedGaussian};
    pub use crate::module::{Clip, NestedModule};
    pub use nestnoise_core::prelude::*;
}
