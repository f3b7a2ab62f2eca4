//! Core types for nestnoise: tensors, nested tensors and their tree
//! utilities, counter-based PRNG keys, configuration and errors.
//!
//! Nothing in this crate holds hidden random state.  Randomness always flows
//! through an explicit [`PrngKey`](prng::PrngKey), which makes every
//! transform built on top reproducible from its seed.

pub mod config;
pub mod error;
pub mod nested;
pub mod prng;
pub mod tensor;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::config::ClippedGaussianConfig;
    pub use crate::error::{ConfigError, InputError, NoiseError};
    pub use crate::nested::{NestedTensor, PathSegment, Structure, TreePath, assert_same_structure};
    pub use crate::prng::{PrngKey, PrngSequence, standard_normal};
    pub use crate::tensor::Tensor;
}
