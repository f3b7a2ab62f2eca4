//! Dense row-major `f32` arrays.

use serde::Serialize;

use crate::error::InputError;

// ---------------------------------------------------------------------------
// Tensor
// ---------------------------------------------------------------------------

/// Multi-dimensional `f32` array stored in row-major order.
///
/// An empty shape denotes a scalar holding exactly one element.  The element
/// count always equals the product of the shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl Tensor {
    /// Create a tensor from a shape and row-major data.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::ShapeMismatch`] if `data.len()` differs from the
    /// product of `shape`.  A product that overflows `usize` is reported as
    /// `expected: usize::MAX`.
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Result<Self, InputError> {
        let expected = element_count(&shape).unwrap_or(usize::MAX);
        if expected != data.len() {
            return Err(InputError::ShapeMismatch {
                expected,
                got: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Rank-0 tensor.
    pub fn scalar(value: f32) -> Self {
        Self {
            shape: Vec::new(),
            data: vec![value],
        }
    }

    /// Rank-1 tensor over `data`.
    pub fn vector(data: Vec<f32>) -> Self {
        Self {
            shape: vec![data.len()],
            data,
        }
    }

    /// Tensor of the given shape filled with `value`.
    ///
    /// # Panics
    ///
    /// Panics if the element count does not fit in memory.
    pub fn full(shape: &[usize], value: f32) -> Self {
        let len = element_count(shape).unwrap_or(usize::MAX);
        Self {
            shape: shape.to_vec(),
            data: vec![value; len],
        }
    }

    pub fn zeros(shape: &[usize]) -> Self {
        Self::full(shape, 0.0)
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Number of scalar elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Elementwise `self + other * scale`.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::StructureMismatch`] if the shapes differ.
    pub fn add_scaled(&self, other: &Self, scale: f32) -> Result<Self, InputError> {
        if self.shape != other.shape {
            return Err(InputError::StructureMismatch {
                path: String::new(),
                reason: format!("leaf shape {:?} vs {:?}", self.shape, other.shape),
            });
        }
        let data = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(a, n)| a + n * scale)
            .collect();
        Ok(Self {
            shape: self.shape.clone(),
            data,
        })
    }

    /// Clamp every element into `[low, high]` in place.
    pub fn clip_in_place(&mut self, low: f32, high: f32) {
        for val in &mut self.data {
            *val = val.clamp(low, high);
        }
    }

    /// Clamped copy.
    #[must_use]
    pub fn clipped(&self, low: f32, high: f32) -> Self {
        let mut out = self.clone();
        out.clip_in_place(low, high);
        out
    }
}

/// Product of `shape`, or `None` if it overflows.  Any zero dimension makes
/// the count zero regardless of the others.
fn element_count(shape: &[usize]) -> Option<usize> {
    if shape.contains(&0) {
        return Some(0);
    }
    shape.iter().try_fold(1_usize, |acc, &dim| acc.checked_mul(dim))
}

impl From<Vec<f32>> for Tensor {
    fn from(data: Vec<f32>) -> Self {
        Self::vector(data)
    }
}

impl From<f32> for Tensor {
    fn from(value: f32) -> Self {
        Self::scalar(value)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
