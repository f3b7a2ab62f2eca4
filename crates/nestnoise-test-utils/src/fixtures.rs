//! Nested action bundles shared by noise tests.

use nestnoise_core::nested::NestedTensor;
use nestnoise_core::tensor::Tensor;

use crate::rng::deterministic_tensor;

/// `{"a": [[0.5, 0.5]], "b": [0.0]}`.
pub fn scenario_tensor() -> NestedTensor {
    NestedTensor::map([
        (
            "a",
            NestedTensor::leaf(
                Tensor::new(vec![1, 2], vec![0.5, 0.5]).expect("2 elements for shape [1, 2]"),
            ),
        ),
        ("b", NestedTensor::leaf(Tensor::vector(vec![0.0]))),
    ])
}

/// A deeper bundle mixing maps, sequences, scalars and matrices, with some
/// values already outside `[-1, 1]`.
pub fn nested_fixture(seed: u64) -> NestedTensor {
    NestedTensor::map([
        (
            "arm",
            NestedTensor::sequence([
                NestedTensor::leaf(deterministic_tensor(&[6], seed)),
                NestedTensor::leaf(deterministic_tensor(&[3, 2], seed + 1)),
            ]),
        ),
        ("gripper", NestedTensor::leaf(Tensor::scalar(1.5))),
        (
            "base",
            NestedTensor::map([
                ("linear", NestedTensor::leaf(Tensor::vector(vec![-2.0, 0.25, 3.0]))),
                ("angular", NestedTensor::leaf(deterministic_tensor(&[1], seed + 2))),
            ]),
        ),
    ])
}

/// `true` if every element of every leaf lies in `[low, high]`.
pub fn all_within(nested: &NestedTensor, low: f32, high: f32) -> bool {
    nested
        .flatten()
        .iter()
        .all(|leaf| leaf.as_slice().iter().all(|v| (low..=high).contains(v)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_has_two_leaves() {
        let t = scenario_tensor();
        assert_eq!(t.leaf_count(), 2);
        assert_eq!(t.get("a").and_then(NestedTensor::as_leaf).unwrap().shape(), &[1, 2]);
    }

    #[test]
    fn nested_fixture_has_out_of_range_values() {
        let t = nested_fixture(0);
        assert_eq!(t.leaf_count(), 5);
        assert!(!all_within(&t, -1.0, 1.0));
    }
}
