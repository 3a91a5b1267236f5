use super::feature::Feature;
use crate::error::{CascadeError, Result};
use crate::image::ImageView;
use serde::{Deserialize, Serialize};

/// Threshold carried by trees that do not close a stage.
pub const NO_THRESHOLD: f32 = -1000.0;

/// Number of internal nodes of a full tree of `depth` levels.
#[inline]
pub const fn node_count(depth: usize) -> usize {
    (1 << depth) - 1
}

/// Number of leaves of a full tree of `depth` levels.
#[inline]
pub const fn leaf_count(depth: usize) -> usize {
    1 << depth
}

/// Full, complete binary tree of pixel tests stored as flat arrays.
///
/// Internal node `i` has children `2i + 1` (test false) and `2i + 2`
/// (test true). Leaves are indexed from `node_count(depth)` onwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Feature>,
    pub leaves: Vec<f32>,
    /// Stage rejection threshold, or [`NO_THRESHOLD`].
    pub threshold: f32,
}

impl Tree {
    /// Tree of `depth` levels with placeholder tests and zero leaves.
    pub fn new(depth: usize) -> Self {
        Self {
            nodes: vec![Feature::default(); node_count(depth)],
            leaves: vec![0.0; leaf_count(depth)],
            threshold: NO_THRESHOLD,
        }
    }

    /// Build a tree from explicit parts, checking the full-tree invariant.
    pub fn from_parts(nodes: Vec<Feature>, leaves: Vec<f32>, threshold: f32) -> Result<Self> {
        if leaves.len() != nodes.len() + 1 || !leaves.len().is_power_of_two() {
            return Err(CascadeError::Malformed(format!(
                "tree with {} nodes and {} leaves is not full",
                nodes.len(),
                leaves.len()
            )));
        }
        Ok(Self {
            nodes,
            leaves,
            threshold,
        })
    }

    #[inline]
    pub fn depth(&self) -> usize {
        (self.nodes.len() + 1).trailing_zeros() as usize
    }

    /// True when this tree closes a stage: any threshold except the
    /// [`NO_THRESHOLD`] sentinel, however negative.
    #[inline]
    pub fn is_stage_end(&self) -> bool {
        self.threshold != NO_THRESHOLD
    }

    /// Index into `leaves` reached by `patch`.
    #[inline]
    pub fn leaf_index<I>(&self, patch: &I) -> usize
    where
        I: ImageView<Pixel = u8> + ?Sized,
    {
        let mut idx = 0usize;
        for _ in 0..self.depth() {
            idx = if self.nodes[idx].evaluate(patch) {
                2 * idx + 2
            } else {
                2 * idx + 1
            };
        }
        idx - self.nodes.len()
    }

    /// Leaf confidence for `patch`.
    #[inline]
    pub fn evaluate<I>(&self, patch: &I) -> f32
    where
        I: ImageView<Pixel = u8> + ?Sized,
    {
        self.leaves[self.leaf_index(patch)]
    }
}
