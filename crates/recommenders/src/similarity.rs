//! Similarity Engine shared by both recommenders.
//!
//! Everything here is cosine similarity: the dot product of two vectors
//! divided by the product of their magnitudes. The result is always in
//! `[-1, 1]`, is symmetric in its arguments, and is `0.0` whenever either
//! vector has zero magnitude.
//!
//! Two flavours exist for sparse vectors:
//! - [`Cosine`]: absent entries are zeros (feature vectors)
//! - [`CoRatedCosine`]: only indices present in *both* vectors count, so an
//!   unobserved rating is never read as a zero rating
//!
//! Sums are accumulated in `f64` and narrowed at the end.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Magnitudes below this are treated as zero
const MAGNITUDE_EPSILON: f64 = 1e-12;

/// Cosine similarity between two dense vectors
///
/// If the slices differ in length the shorter one is padded with zeros.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(&x, &y)| x as f64 * y as f64)
        .sum();
    let norm_a: f64 = a.iter().map(|&x| x as f64 * x as f64).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|&y| y as f64 * y as f64).sum::<f64>().sqrt();
    finish_cosine(dot, norm_a, norm_b)
}

fn finish_cosine(dot: f64, norm_a: f64, norm_b: f64) -> f32 {
    if norm_a < MAGNITUDE_EPSILON || norm_b < MAGNITUDE_EPSILON {
        return 0.0;
    }
    // Clamping absorbs rounding that lands just outside the range
    ((dot / (norm_a * norm_b)) as f32).clamp(-1.0, 1.0)
}

/// A sparse vector with sorted, unique `u32` indices
///
/// Stored entries are *observed* values: an explicit `0.0` is kept, which
/// matters for [`CoRatedCosine`] where presence carries meaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    dim: usize,
    indices: Vec<u32>,
    values: Vec<f32>,
}

impl SparseVector {
    /// An empty vector of the given dimension
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Build from `(index, value)` pairs in any order
    ///
    /// Repeated indices are summed. Indices `>= dim` are ignored.
    pub fn from_entries(dim: usize, entries: impl IntoIterator<Item = (u32, f32)>) -> Self {
        let mut merged: BTreeMap<u32, f32> = BTreeMap::new();
        for (index, value) in entries {
            if (index as usize) < dim {
                *merged.entry(index).or_insert(0.0) += value;
            }
        }
        let (indices, values) = merged.into_iter().unzip();
        Self {
            dim,
            indices,
            values,
        }
    }

    /// Declared dimensionality
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Value at `index`, if one is stored
    pub fn get(&self, index: u32) -> Option<f32> {
        self.indices
            .binary_search(&index)
            .ok()
            .map(|pos| self.values[pos])
    }

    /// Stored entries in ascending index order
    pub fn iter(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Euclidean magnitude
    pub fn norm(&self) -> f32 {
        self.norm_f64() as f32
    }

    fn norm_f64(&self) -> f64 {
        self.values
            .iter()
            .map(|&v| v as f64 * v as f64)
            .sum::<f64>()
            .sqrt()
    }

    /// Apply `f(index, value)` to every stored entry, keeping the sparsity pattern
    pub fn map_values(&self, f: impl Fn(u32, f32) -> f32) -> Self {
        Self {
            dim: self.dim,
            indices: self.indices.clone(),
            values: self.iter().map(|(i, v)| f(i, v)).collect(),
        }
    }

    /// Expand into a dense vector of length `dim`
    pub fn to_dense(&self) -> Vec<f32> {
        let mut dense = vec![0.0; self.dim];
        for (index, value) in self.iter() {
            dense[index as usize] = value;
        }
        dense
    }

    /// Walk the entries present in both vectors, in index order
    fn for_each_common(&self, other: &SparseVector, mut f: impl FnMut(f32, f32)) {
        let (mut i, mut j) = (0, 0);
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    f(self.values[i], other.values[j]);
                    i += 1;
                    j += 1;
                }
            }
        }
    }
}

/// A similarity function over sparse vectors
///
/// Implementations must be symmetric, return values in `[-1, 1]`, and return
/// `0.0` rather than failing when a vector has no magnitude.
pub trait SimilarityMeasure: Send + Sync {
    /// Short name for logging
    fn name(&self) -> &str;

    fn similarity(&self, a: &SparseVector, b: &SparseVector) -> f32;
}

/// Plain cosine similarity; missing entries count as zeros
#[derive(Debug, Clone, Copy, Default)]
pub struct Cosine;

impl SimilarityMeasure for Cosine {
    fn name(&self) -> &str {
        "cosine"
    }

    fn similarity(&self, a: &SparseVector, b: &SparseVector) -> f32 {
        let mut dot = 0.0f64;
        a.for_each_common(b, |x, y| dot += x as f64 * y as f64);
        finish_cosine(dot, a.norm_f64(), b.norm_f64())
    }
}

/// Cosine similarity restricted to indices both vectors observe
///
/// With rating columns this compares two movies over the users who rated
/// both. No overlap gives `0.0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoRatedCosine;

impl SimilarityMeasure for CoRatedCosine {
    fn name(&self) -> &str {
        "co-rated cosine"
    }

    fn similarity(&self, a: &SparseVector, b: &SparseVector) -> f32 {
        let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
        a.for_each_common(b, |x, y| {
            let (x, y) = (x as f64, y as f64);
            dot += x * y;
            norm_a += x * x;
            norm_b += y * y;
        });
        finish_cosine(dot, norm_a.sqrt(), norm_b.sqrt())
    }
}
