//! Integration tests: behavioral contract of clipped Gaussian noise.
//!
//! Checks, over realistic nested action bundles, that:
//! 1. Output structure (nesting, keys, leaf shapes) matches the input
//! 2. Every output element lies in [-1, 1]
//! 3. stddev = 0 reduces to a plain clip, whatever the seed
//! 4. Fresh instances with equal seeds reproduce each other
//! 5. Leaves and successive calls receive independent noise
//! 6. Concurrent callers never share keys

use std::sync::Arc;
use std::thread;

use nestnoise::prelude::*;
use nestnoise_test_utils::{all_within, deterministic_tensor, nested_fixture, scenario_tensor};

fn leaf<'a>(nested: &'a NestedTensor, key: &str) -> &'a Tensor {
    nested
        .get(key)
        .and_then(NestedTensor::as_leaf)
        .unwrap_or_else(|| panic!("missing leaf '{key}'"))
}

// ---------------------------------------------------------------------------
// Structure and bounds
// ---------------------------------------------------------------------------

#[test]
fn structure_is_preserved() {
    let noise = ClippedGaussian::new(0.5, 3).unwrap();
    for seed in 0..5 {
        let input = nested_fixture(seed);
        let output = noise.apply(&input).unwrap();
        assert_eq!(output.structure(), input.structure());
        assert!(assert_same_structure(&input, &output).is_ok());
    }
}

#[test]
fn outputs_are_clamped() {
    for stddev in [0.0, 0.1, 1.0, 10.0] {
        let noise = ClippedGaussian::new(stddev, 11).unwrap();
        let output = noise.apply(&nested_fixture(7)).unwrap();
        assert!(all_within(&output, -1.0, 1.0), "stddev {stddev}");
    }
}

#[test]
fn input_is_not_mutated() {
    let input = nested_fixture(1);
    let snapshot = input.clone();
    let noise = ClippedGaussian::new(0.3, 0).unwrap();
    let _ = noise.apply(&input).unwrap();
    assert_eq!(input, snapshot);
}

// ---------------------------------------------------------------------------
// Zero-noise limit
// ---------------------------------------------------------------------------

#[test]
fn zero_stddev_equals_clip_for_any_seed() {
    let input = nested_fixture(4);
    let expected = input.clip(-1.0, 1.0);
    for seed in [0, 1, 42, u64::MAX] {
        let noise = ClippedGaussian::new(0.0, seed).unwrap();
        assert_eq!(noise.apply(&input).unwrap(), expected);
        assert_eq!(noise.apply(&input).unwrap(), expected);
    }
}

#[test]
fn zero_stddev_matches_clip_module() {
    let input = nested_fixture(9);
    let noise = ClippedGaussian::new(0.0, 5).unwrap();
    assert_eq!(
        noise.apply(&input).unwrap(),
        Clip::default().apply(&input).unwrap()
    );
}

// ---------------------------------------------------------------------------
// Determinism and independence
// ---------------------------------------------------------------------------

#[test]
fn fresh_instances_with_same_seed_agree() {
    let input = nested_fixture(2);
    let a = ClippedGaussian::new(0.2, 42).unwrap();
    let b = ClippedGaussian::new(0.2, 42).unwrap();
    for _ in 0..3 {
        assert_eq!(a.apply(&input).unwrap(), b.apply(&input).unwrap());
    }
}

#[test]
fn different_seeds_disagree() {
    let input = nested_fixture(2);
    let a = ClippedGaussian::new(0.2, 1).unwrap().apply(&input).unwrap();
    let b = ClippedGaussian::new(0.2, 2).unwrap().apply(&input).unwrap();
    assert_ne!(a, b);
}

#[test]
fn identical_leaves_receive_different_noise() {
    let shared = deterministic_tensor(&[16], 5);
    let input = NestedTensor::sequence([
        NestedTensor::leaf(shared.clone()),
        NestedTensor::leaf(shared),
    ]);
    let noise = ClippedGaussian::new(0.1, 42).unwrap();
    let output = noise.apply(&input).unwrap();
    let leaves = output.flatten();
    assert_ne!(leaves[0], leaves[1]);
}

#[test]
fn draw_count_tracks_leaves() {
    let input = nested_fixture(0);
    let noise = ClippedGaussian::new(0.1, 0).unwrap();
    for call in 1..=3_u64 {
        noise.apply(&input).unwrap();
        assert_eq!(noise.draws(), call * input.leaf_count() as u64);
    }
}

// ---------------------------------------------------------------------------
// Concrete scenario
// ---------------------------------------------------------------------------

#[test]
fn scenario_seed_42() {
    let input = scenario_tensor();
    let output = ClippedGaussian::new(0.1, 42).unwrap().apply(&input).unwrap();

    assert_eq!(output.structure(), input.structure());
    let a = leaf(&output, "a");
    assert_eq!(a.shape(), &[1, 2]);
    assert_eq!(leaf(&output, "b").shape(), &[1]);

    // "a" is the first leaf, so it uses the first key of seed 42.
    let n = standard_normal(&PrngSequence::new(42).next_key(), &[1, 2]);
    for (v, n) in a.as_slice().iter().zip(n.as_slice()) {
        assert!((-1.0..=1.0).contains(v));
        assert!((v - (0.5 + n * 0.1).clamp(-1.0, 1.0)).abs() < 1e-6);
    }

    let again = ClippedGaussian::new(0.1, 42).unwrap().apply(&input).unwrap();
    assert_eq!(again, output);
}

#[test]
fn scenario_through_json() {
    let input = serde_json::json!({"a": [[0.5, 0.5]], "b": [0.0]});
    let first = ClippedGaussian::new(0.1, 42).unwrap().apply_json(&input).unwrap();
    let second = ClippedGaussian::new(0.1, 42).unwrap().apply_json(&input).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        NestedTensor::from_json(&first).unwrap().structure(),
        scenario_tensor().structure()
    );
}

// ---------------------------------------------------------------------------
// Extreme stddev
// ---------------------------------------------------------------------------

#[test]
fn huge_stddev_saturates() {
    let input = NestedTensor::leaf(Tensor::zeros(&[2_000]));
    let output = ClippedGaussian::new(100.0, 7).unwrap().apply(&input).unwrap();
    let values = output.as_leaf().unwrap().as_slice();
    let saturated = values.iter().filter(|v| v.abs() == 1.0).count();
    assert!(
        saturated * 100 >= values.len() * 95,
        "only {saturated} of {} saturated",
        values.len()
    );
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[test]
fn concurrent_calls_use_disjoint_contiguous_keys() {
    const THREADS: usize = 4;
    const CALLS: usize = 25;

    let input = NestedTensor::map([
        ("x", NestedTensor::leaf(Tensor::zeros(&[4]))),
        ("y", NestedTensor::leaf(Tensor::zeros(&[4]))),
    ]);

    let shared = Arc::new(ClippedGaussian::new(0.3, 17).unwrap());
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let noise = Arc::clone(&shared);
            let input = input.clone();
            thread::spawn(move || {
                (0..CALLS)
                    .map(|_| noise.apply(&input).unwrap().to_json().to_string())
                    .collect::<Vec<_>>()
            })
        })
        .collect();
    let mut concurrent: Vec<String> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();

    let sequential_noise = ClippedGaussian::new(0.3, 17).unwrap();
    let mut sequential: Vec<String> = (0..THREADS * CALLS)
        .map(|_| sequential_noise.apply(&input).unwrap().to_json().to_string())
        .collect();

    assert_eq!(shared.draws(), (THREADS * CALLS * 2) as u64);
    concurrent.sort();
    sequential.sort();
    assert_eq!(concurrent, sequential);
}
