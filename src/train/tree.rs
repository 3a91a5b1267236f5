//! Greedy, weighted construction of one full tree.
//!
//! Nodes are grown depth first from the root. Every internal node draws a
//! fresh pool of random pixel tests and keeps the one with the lowest
//! weighted sum of squared errors over its two partitions. Leaves store the
//! weighted mean label of the samples that reach them.

use crate::error::{CascadeError, Result};
use crate::image::ImageView;
use crate::model::{check_patch_dims, node_count, Feature, Tree, MAX_OFFSET};
use rand::Rng;

/// Stabiliser added to the weight sum of the split mean.
const SSE_EPS: f64 = 1e-5;

/// Read-only training view shared by every node.
struct Samples<'a, P> {
    patches: &'a [P],
    labels: &'a [f32],
    weights: &'a [f64],
}

/// Running weighted moments of one side of a split.
#[derive(Clone, Copy, Default)]
struct Moments {
    w: f64,
    wy: f64,
    wyy: f64,
}

impl Moments {
    #[inline]
    fn add(&mut self, w: f64, y: f64) {
        self.w += w;
        self.wy += w * y;
        self.wyy += w * y * y;
    }

    /// `sum w (y - m)^2` with `m = sum(w y) / (sum(w) + eps)`.
    #[inline]
    fn sse(&self) -> f64 {
        let m = self.wy / (self.w + SSE_EPS);
        self.wyy - 2.0 * m * self.wy + m * m * self.w
    }
}

/// Builds full trees of a fixed depth.
#[derive(Clone, Copy, Debug)]
pub struct TreeTrainer {
    depth: usize,
    candidate_count: usize,
}

impl TreeTrainer {
    pub fn new(depth: usize, candidate_count: usize) -> Self {
        Self {
            depth,
            candidate_count,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Train one tree on `patches` with the given labels and sample weights.
    pub fn train<P, R>(
        &self,
        patches: &[P],
        labels: &[f32],
        weights: &[f64],
        rng: &mut R,
    ) -> Result<Tree>
    where
        P: ImageView<Pixel = u8> + Sync,
        R: Rng,
    {
        if self.depth == 0 || self.candidate_count == 0 {
            return Err(CascadeError::InvalidParams(format!(
                "tree trainer needs depth >= 1 and candidates >= 1 (got {} and {})",
                self.depth, self.candidate_count
            )));
        }
        if patches.len() != labels.len() || patches.len() != weights.len() {
            return Err(CascadeError::InvalidData(format!(
                "{} patches, {} labels, {} weights",
                patches.len(),
                labels.len(),
                weights.len()
            )));
        }
        for p in patches {
            check_patch_dims(p.width(), p.height())?;
        }

        let samples = Samples {
            patches,
            labels,
            weights,
        };
        let mut tree = Tree::new(self.depth);
        let all: Vec<usize> = (0..patches.len()).collect();
        self.grow(&mut tree, 0, 0, &all, &samples, rng);
        Ok(tree)
    }

    fn grow<P, R>(
        &self,
        tree: &mut Tree,
        node: usize,
        level: usize,
        idx: &[usize],
        samples: &Samples<'_, P>,
        rng: &mut R,
    ) where
        P: ImageView<Pixel = u8> + Sync,
        R: Rng,
    {
        if level == self.depth {
            tree.leaves[node - node_count(self.depth)] = leaf_value(idx, samples);
            return;
        }

        // Nothing left to separate: placeholder test, same samples on both sides.
        if idx.len() <= 1 {
            tree.nodes[node] = Feature::default();
            self.grow(tree, 2 * node + 1, level + 1, idx, samples, rng);
            self.grow(tree, 2 * node + 2, level + 1, idx, samples, rng);
            return;
        }

        let candidates = random_features(rng, self.candidate_count);
        let errors = split_errors(&candidates, idx, samples);
        let best = argmin(&errors);
        let feature = candidates[best];
        tree.nodes[node] = feature;

        let (right, left): (Vec<usize>, Vec<usize>) = idx
            .iter()
            .copied()
            .partition(|&i| feature.evaluate(&samples.patches[i]));
        self.grow(tree, 2 * node + 1, level + 1, &left, samples, rng);
        self.grow(tree, 2 * node + 2, level + 1, &right, samples, rng);
    }
}

/// Draw `count` tests with every offset uniform in `[-127, 127]`.
pub fn random_features<R: Rng>(rng: &mut R, count: usize) -> Vec<Feature> {
    (0..count)
        .map(|_| Feature {
            row_a: rng.gen_range(-MAX_OFFSET..=MAX_OFFSET),
            col_a: rng.gen_range(-MAX_OFFSET..=MAX_OFFSET),
            row_b: rng.gen_range(-MAX_OFFSET..=MAX_OFFSET),
            col_b: rng.gen_range(-MAX_OFFSET..=MAX_OFFSET),
        })
        .collect()
}

fn split_error<P>(feature: &Feature, idx: &[usize], samples: &Samples<'_, P>) -> f64
where
    P: ImageView<Pixel = u8>,
{
    let mut left = Moments::default();
    let mut right = Moments::default();
    for &i in idx {
        let (w, y) = (samples.weights[i], f64::from(samples.labels[i]));
        if feature.evaluate(&samples.patches[i]) {
            right.add(w, y);
        } else {
            left.add(w, y);
        }
    }
    left.sse() + right.sse()
}

#[cfg(not(feature = "parallel"))]
fn split_errors<P>(candidates: &[Feature], idx: &[usize], samples: &Samples<'_, P>) -> Vec<f64>
where
    P: ImageView<Pixel = u8> + Sync,
{
    candidates
        .iter()
        .map(|f| split_error(f, idx, samples))
        .collect()
}

#[cfg(feature = "parallel")]
fn split_errors<P>(candidates: &[Feature], idx: &[usize], samples: &Samples<'_, P>) -> Vec<f64>
where
    P: ImageView<Pixel = u8> + Sync,
{
    use rayon::prelude::*;

    candidates
        .par_iter()
        .map(|f| split_error(f, idx, samples))
        .collect()
}

/// Index of the first minimum.
fn argmin(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v < values[best] {
            best = i;
        }
    }
    best
}

fn leaf_value<P>(idx: &[usize], samples: &Samples<'_, P>) -> f32 {
    let mut m = Moments::default();
    for &i in idx {
        m.add(samples.weights[i], f64::from(samples.labels[i]));
    }
    if m.w > 0.0 {
        (m.wy / m.w) as f32
    } else {
        0.0
    }
}
