//! Nested tensors and structure-preserving tree utilities.
//!
//! A [`NestedTensor`] is either a [`Tensor`] leaf, an ordered sequence of
//! nested tensors, or a string-keyed map of nested tensors.  Every traversal
//! in this module is depth-first with sequence indices ascending and map keys
//! in sorted order, so two structurally identical values always visit their
//! leaves in the same order.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::InputError;
use crate::tensor::Tensor;

// ---------------------------------------------------------------------------
// TreePath
// ---------------------------------------------------------------------------

/// One step from a node to a child.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Location of a node inside a nested tensor, rendered as `a/0/b`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TreePath(Vec<PathSegment>);

impl TreePath {
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }

    fn pop(&mut self) {
        self.0.pop();
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            match segment {
                PathSegment::Key(key) => f.write_str(key)?,
                PathSegment::Index(index) => write!(f, "{index}")?,
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Structure
// ---------------------------------------------------------------------------

/// Shape-and-keys signature of a nested tensor: nesting, map keys, sequence
/// lengths and leaf shapes, without any values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Structure {
    Leaf(Vec<usize>),
    Sequence(Vec<Structure>),
    Map(BTreeMap<String, Structure>),
}

// ---------------------------------------------------------------------------
// NestedTensor
// ---------------------------------------------------------------------------

/// Recursively nested collection of [`Tensor`] leaves.
#[derive(Debug, Clone, PartialEq)]
pub enum NestedTensor {
    Leaf(Tensor),
    Sequence(Vec<NestedTensor>),
    Map(BTreeMap<String, NestedTensor>),
}

impl NestedTensor {
    pub fn leaf(tensor: impl Into<Tensor>) -> Self {
        Self::Leaf(tensor.into())
    }

    pub fn sequence(items: impl IntoIterator<Item = Self>) -> Self {
        Self::Sequence(items.into_iter().collect())
    }

    /// Build a map node from `(key, child)` pairs.
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Self)>) -> Self {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub const fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }

    pub const fn as_leaf(&self) -> Option<&Tensor> {
        match self {
            Self::Leaf(t) => Some(t),
            _ => None,
        }
    }

    /// Child of a map node.
    pub fn get(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Map(entries) => entries.get(key),
            _ => None,
        }
    }

    /// Child of a sequence node.
    pub fn index(&self, index: usize) -> Option<&Self> {
        match self {
            Self::Sequence(items) => items.get(index),
            _ => None,
        }
    }

    /// Number of tensor leaves.
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Sequence(items) => items.iter().map(Self::leaf_count).sum(),
            Self::Map(entries) => entries.values().map(Self::leaf_count).sum(),
        }
    }

    pub fn structure(&self) -> Structure {
        match self {
            Self::Leaf(t) => Structure::Leaf(t.shape().to_vec()),
            Self::Sequence(items) => Structure::Sequence(items.iter().map(Self::structure).collect()),
            Self::Map(entries) => Structure::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.structure()))
                    .collect(),
            ),
        }
    }

    // -- Mapping --

    /// Apply `f` to every leaf, preserving structure.
    #[must_use]
    pub fn map_structure<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&Tensor) -> Tensor,
    {
        match self.try_map_structure(|t| Ok::<_, Infallible>(f(t))) {
            Ok(mapped) => mapped,
            Err(never) => match never {},
        }
    }

    /// Fallible [`map_structure`](Self::map_structure).  Stops at the first
    /// error; leaves after it are not visited.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by `f`.
    pub fn try_map_structure<E, F>(&self, mut f: F) -> Result<Self, E>
    where
        F: FnMut(&Tensor) -> Result<Tensor, E>,
    {
        self.try_map_structure_with_path(|_, t| f(t))
    }

    /// Like [`try_map_structure`](Self::try_map_structure) but also passes the
    /// path of each leaf.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by `f`.
    pub fn try_map_structure_with_path<E, F>(&self, mut f: F) -> Result<Self, E>
    where
        F: FnMut(&TreePath, &Tensor) -> Result<Tensor, E>,
    {
        let mut path = TreePath::root();
        self.try_map_inner(&mut path, &mut f)
    }

    fn try_map_inner<E, F>(&self, path: &mut TreePath, f: &mut F) -> Result<Self, E>
    where
        F: FnMut(&TreePath, &Tensor) -> Result<Tensor, E>,
    {
        match self {
            Self::Leaf(t) => f(path, t).map(Self::Leaf),
            Self::Sequence(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    path.push(PathSegment::Index(i));
                    let mapped = item.try_map_inner(path, f);
                    path.pop();
                    out.push(mapped?);
                }
                Ok(Self::Sequence(out))
            }
            Self::Map(entries) => {
                let mut out = BTreeMap::new();
                for (key, child) in entries {
                    path.push(PathSegment::Key(key.clone()));
                    let mapped = child.try_map_inner(path, f);
                    path.pop();
                    out.insert(key.clone(), mapped?);
                }
                Ok(Self::Map(out))
            }
        }
    }

    /// Clamp every leaf into `[low, high]`.
    #[must_use]
    pub fn clip(&self, low: f32, high: f32) -> Self {
        self.map_structure(|t| t.clipped(low, high))
    }

    // -- Flatten / unflatten --

    /// Leaves in traversal order.
    pub fn flatten(&self) -> Vec<&Tensor> {
        let mut out = Vec::with_capacity(self.leaf_count());
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into<'a>(&'a self, out: &mut Vec<&'a Tensor>) {
        match self {
            Self::Leaf(t) => out.push(t),
            Self::Sequence(items) => items.iter().for_each(|item| item.flatten_into(out)),
            Self::Map(entries) => entries.values().for_each(|child| child.flatten_into(out)),
        }
    }

    /// Leaves in traversal order, each paired with its path.
    pub fn flatten_with_paths(&self) -> Vec<(TreePath, &Tensor)> {
        let mut out = Vec::with_capacity(self.leaf_count());
        let mut path = TreePath::root();
        self.flatten_paths_into(&mut path, &mut out);
        out
    }

    fn flatten_paths_into<'a>(&'a self, path: &mut TreePath, out: &mut Vec<(TreePath, &'a Tensor)>) {
        match self {
            Self::Leaf(t) => out.push((path.clone(), t)),
            Self::Sequence(items) => {
                for (i, item) in items.iter().enumerate() {
                    path.push(PathSegment::Index(i));
                    item.flatten_paths_into(path, out);
                    path.pop();
                }
            }
            Self::Map(entries) => {
                for (key, child) in entries {
                    path.push(PathSegment::Key(key.clone()));
                    child.flatten_paths_into(path, out);
                    path.pop();
                }
            }
        }
    }

    /// Rebuild a value shaped like `structure` from `leaves` in traversal
    /// order.  Only the leaf count is checked; leaf shapes are taken from
    /// `leaves` as given.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::LeafCountMismatch`] if `leaves.len()` differs from
    /// `structure.leaf_count()`.
    pub fn unflatten_as(structure: &Self, leaves: Vec<Tensor>) -> Result<Self, InputError> {
        let expected = structure.leaf_count();
        if leaves.len() != expected {
            return Err(InputError::LeafCountMismatch {
                expected,
                got: leaves.len(),
            });
        }
        let mut iter = leaves.into_iter();
        structure.try_map_structure(|_| {
            iter.next().ok_or(InputError::LeafCountMismatch {
                expected,
                got: 0,
            })
        })
    }

    // -- JSON --

    /// Convert a JSON value into a nested tensor.
    ///
    /// Numbers become rank-0 leaves.  An array whose elements are all numbers
    /// or (recursively) numeric arrays becomes a single leaf whose shape is the
    /// nesting of the arrays; any other array becomes a sequence.  Objects
    /// become maps.
    ///
    /// # Errors
    ///
    /// - [`InputError::NonNumericLeaf`] for strings, booleans and nulls.
    /// - [`InputError::RaggedArray`] for numeric arrays with inconsistent
    ///   nested lengths.
    pub fn from_json(value: &Value) -> Result<Self, InputError> {
        let mut path = TreePath::root();
        Self::from_json_inner(value, &mut path)
    }

    fn from_json_inner(value: &Value, path: &mut TreePath) -> Result<Self, InputError> {
        match value {
            Value::Number(_) => numeric_json_to_tensor(value, path).map(Self::Leaf),
            Value::Array(_) if is_numeric_json(value) => {
                numeric_json_to_tensor(value, path).map(Self::Leaf)
            }
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    path.push(PathSegment::Index(i));
                    let converted = Self::from_json_inner(item, path);
                    path.pop();
                    out.push(converted?);
                }
                Ok(Self::Sequence(out))
            }
            Value::Object(entries) => {
                let mut out = BTreeMap::new();
                for (key, child) in entries {
                    path.push(PathSegment::Key(key.clone()));
                    let converted = Self::from_json_inner(child, path);
                    path.pop();
                    out.insert(key.clone(), converted?);
                }
                Ok(Self::Map(out))
            }
            Value::String(_) => Err(non_numeric(path, "string")),
            Value::Bool(_) => Err(non_numeric(path, "bool")),
            Value::Null => Err(non_numeric(path, "null")),
        }
    }

    /// Convert into JSON, rendering each leaf as nested arrays.  Non-finite
    /// elements become `null`.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Leaf(t) => tensor_to_json(t.shape(), t.as_slice()),
            Self::Sequence(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<Tensor> for NestedTensor {
    fn from(tensor: Tensor) -> Self {
        Self::Leaf(tensor)
    }
}

impl Serialize for NestedTensor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NestedTensor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Structure comparison
// ---------------------------------------------------------------------------

/// Check that `a` and `b` have identical nesting, keys, sequence lengths and
/// leaf shapes.
///
/// # Errors
///
/// Returns [`InputError::StructureMismatch`] naming the first differing path.
pub fn assert_same_structure(a: &NestedTensor, b: &NestedTensor) -> Result<(), InputError> {
    let mut path = TreePath::root();
    compare_inner(a, b, &mut path)
}

fn compare_inner(a: &NestedTensor, b: &NestedTensor, path: &mut TreePath) -> Result<(), InputError> {
    let mismatch = |path: &TreePath, reason: String| InputError::StructureMismatch {
        path: path.to_string(),
        reason,
    };
    match (a, b) {
        (NestedTensor::Leaf(x), NestedTensor::Leaf(y)) => {
            if x.shape() == y.shape() {
                Ok(())
            } else {
                Err(mismatch(
                    path,
                    format!("leaf shape {:?} vs {:?}", x.shape(), y.shape()),
                ))
            }
        }
        (NestedTensor::Sequence(xs), NestedTensor::Sequence(ys)) => {
            if xs.len() != ys.len() {
                return Err(mismatch(
                    path,
                    format!("sequence length {} vs {}", xs.len(), ys.len()),
                ));
            }
            for (i, (x, y)) in xs.iter().zip(ys).enumerate() {
                path.push(PathSegment::Index(i));
                let result = compare_inner(x, y, path);
                path.pop();
                result?;
            }
            Ok(())
        }
        (NestedTensor::Map(xs), NestedTensor::Map(ys)) => {
            if let Some(key) = xs.keys().find(|k| !ys.contains_key(*k)) {
                return Err(mismatch(path, format!("key '{key}' missing from second")));
            }
            if let Some(key) = ys.keys().find(|k| !xs.contains_key(*k)) {
                return Err(mismatch(path, format!("key '{key}' missing from first")));
            }
            for (key, x) in xs {
                if let Some(y) = ys.get(key) {
                    path.push(PathSegment::Key(key.clone()));
                    let result = compare_inner(x, y, path);
                    path.pop();
                    result?;
                }
            }
            Ok(())
        }
        _ => Err(mismatch(
            path,
            format!("expected {}, got {}", kind(a), kind(b)),
        )),
    }
}

const fn kind(node: &NestedTensor) -> &'static str {
    match node {
        NestedTensor::Leaf(_) => "leaf",
        NestedTensor::Sequence(_) => "sequence",
        NestedTensor::Map(_) => "map",
    }
}

// ---------------------------------------------------------------------------
// JSON helpers
// ---------------------------------------------------------------------------

fn non_numeric(path: &TreePath, found: &'static str) -> InputError {
    InputError::NonNumericLeaf {
        path: path.to_string(),
        found,
    }
}

/// `true` for numbers and for arrays made only of numbers or numeric arrays.
fn is_numeric_json(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::Array(items) => items.iter().all(is_numeric_json),
        _ => false,
    }
}

fn numeric_json_to_tensor(value: &Value, path: &TreePath) -> Result<Tensor, InputError> {
    // Shape follows the first element at each depth.
    let mut shape = Vec::new();
    let mut cursor = value;
    while let Value::Array(items) = cursor {
        shape.push(items.len());
        match items.first() {
            Some(first) => cursor = first,
            None => break,
        }
    }

    let mut data = Vec::with_capacity(shape.iter().product());
    collect_numbers(value, &shape, 0, path, &mut data)?;
    Tensor::new(shape, data)
}

#[allow(clippy::cast_possible_truncation)] // JSON numbers are read as f64, leaves are f32
fn collect_numbers(
    value: &Value,
    shape: &[usize],
    depth: usize,
    path: &TreePath,
    out: &mut Vec<f32>,
) -> Result<(), InputError> {
    let ragged = || InputError::RaggedArray {
        path: path.to_string(),
    };
    match value {
        Value::Number(n) if depth == shape.len() => {
            let v = n.as_f64().ok_or_else(|| non_numeric(path, "number"))?;
            out.push(v as f32);
            Ok(())
        }
        Value::Array(items) if depth < shape.len() && items.len() == shape[depth] => {
            for item in items {
                collect_numbers(item, shape, depth + 1, path, out)?;
            }
            Ok(())
        }
        _ => Err(ragged()),
    }
}

fn tensor_to_json(shape: &[usize], data: &[f32]) -> Value {
    match shape.split_first() {
        None => data.first().map_or(Value::Null, |&v| f32_to_json(v)),
        Some((&outer, inner)) => {
            let chunk = inner.iter().product::<usize>();
            let items = (0..outer)
                .map(|i| tensor_to_json(inner, &data[i * chunk..(i + 1) * chunk]))
                .collect();
            Value::Array(items)
        }
    }
}

fn f32_to_json(v: f32) -> Value {
    // Round-trip through the shortest f32 text so 0.1f32 prints as 0.1.
    let widened = v.to_string().parse::<f64>().unwrap_or_else(|_| f64::from(v));
    serde_json::Number::from_f64(widened).map_or(Value::Null, Value::Number)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
