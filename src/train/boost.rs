//! One boosting stage: add trees until the stage FPR target or the tree
//! budget is reached, then close the stage with a ROC-derived threshold.
//!
//! Sample weights follow the exponential loss: positives are weighted by
//! `exp(-conf)`, negatives by `exp(conf)`, each class normalised by its size
//! and the whole vector normalised to sum to one.
//!
//! Each tree's raw leaf values are added to the running confidences. No
//! per-tree reliability weight (the alpha of classic AdaBoost) is fitted; the
//! stored models depend on this, so it stays that way.

use super::params::StageParams;
use super::roc::search_threshold;
use super::tree::TreeTrainer;
use crate::error::{CascadeError, Result};
use crate::image::ImageView;
use crate::model::{Cascade, Tree};
use log::debug;
use rand::Rng;
use serde::Serialize;

/// Result of a stage. `confidences` is the updated running sum, handed back
/// to the caller that owns it.
#[derive(Clone, Debug)]
pub struct StageOutcome {
    pub confidences: Vec<f32>,
    pub summary: StageSummary,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageSummary {
    pub trees_added: usize,
    pub tpr: f32,
    pub fpr: f32,
    pub threshold: f32,
}

/// Exponential-loss sample weights, normalised to sum to one.
///
/// Computed in the log domain so large confidences do not overflow.
pub fn sample_weights(labels: &[f32], confidences: &[f32]) -> Vec<f64> {
    let n_pos = labels.iter().filter(|&&l| l > 0.0).count();
    let n_neg = labels.len() - n_pos;
    let log_w: Vec<f64> = labels
        .iter()
        .zip(confidences)
        .map(|(&l, &c)| {
            let c = f64::from(c);
            if l > 0.0 {
                -c - (n_pos as f64).ln()
            } else {
                c - (n_neg as f64).ln()
            }
        })
        .collect();
    let peak = log_w.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut weights: Vec<f64> = log_w.iter().map(|&lw| (lw - peak).exp()).collect();
    let total: f64 = weights.iter().sum();
    if total > 0.0 {
        weights.iter_mut().for_each(|w| *w /= total);
    }
    weights
}

#[cfg(not(feature = "parallel"))]
fn accumulate<P>(tree: &Tree, patches: &[P], confidences: &mut [f32])
where
    P: ImageView<Pixel = u8> + Sync,
{
    for (conf, patch) in confidences.iter_mut().zip(patches) {
        *conf += tree.evaluate(patch);
    }
}

#[cfg(feature = "parallel")]
fn accumulate<P>(tree: &Tree, patches: &[P], confidences: &mut [f32])
where
    P: ImageView<Pixel = u8> + Sync,
{
    use rayon::prelude::*;

    confidences
        .par_iter_mut()
        .zip(patches.par_iter())
        .for_each(|(conf, patch)| *conf += tree.evaluate(patch));
}

/// Grows one cascade stage.
#[derive(Clone, Copy, Debug)]
pub struct BoostTrainer {
    trees: TreeTrainer,
    params: StageParams,
}

impl BoostTrainer {
    pub fn new(trees: TreeTrainer, params: StageParams) -> Self {
        Self { trees, params }
    }

    /// Append a stage to `cascade`.
    ///
    /// `confidences` holds the current cascade output of every sample and is
    /// returned updated in the outcome.
    pub fn train_stage<P, R>(
        &self,
        cascade: &mut Cascade,
        patches: &[P],
        labels: &[f32],
        mut confidences: Vec<f32>,
        rng: &mut R,
    ) -> Result<StageOutcome>
    where
        P: ImageView<Pixel = u8> + Sync,
        R: Rng,
    {
        if self.params.max_trees == 0 {
            return Err(CascadeError::InvalidParams(
                "a stage needs a budget of at least one tree".into(),
            ));
        }
        if patches.len() != labels.len() || patches.len() != confidences.len() {
            return Err(CascadeError::InvalidData(format!(
                "{} patches, {} labels, {} confidences",
                patches.len(),
                labels.len(),
                confidences.len()
            )));
        }
        if !labels.iter().any(|&l| l > 0.0) {
            return Err(CascadeError::InvalidData(
                "stage training needs at least one positive sample".into(),
            ));
        }
        if self.trees.depth() != cascade.tree_depth {
            return Err(CascadeError::InvalidParams(format!(
                "trainer depth {} differs from cascade depth {}",
                self.trees.depth(),
                cascade.tree_depth
            )));
        }

        let mut trees_added = 0;
        let mut fpr = 1.0f32;
        let mut search = None;
        while trees_added < self.params.max_trees && fpr > self.params.max_fpr {
            let weights = sample_weights(labels, &confidences);
            let tree = self.trees.train(patches, labels, &weights, rng)?;
            accumulate(&tree, patches, &mut confidences);
            cascade.push_tree(tree)?;
            trees_added += 1;

            let s = search_threshold(
                labels,
                &confidences,
                self.params.min_tpr,
                self.params.roc_step,
            )?;
            fpr = s.fpr;
            search = Some(s);
            debug!(
                "tree {}/{}: tpr={:.4} fpr={:.4} threshold={:.4}",
                trees_added, self.params.max_trees, s.tpr, s.fpr, s.threshold
            );
        }

        let s = search.ok_or_else(|| CascadeError::InvalidData("stage trained no trees".into()))?;
        cascade.close_stage(s.threshold)?;
        Ok(StageOutcome {
            confidences,
            summary: StageSummary {
                trees_added,
                tpr: s.tpr,
                fpr: s.fpr,
                threshold: s.threshold,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::GrayImageU8;
    use crate::model::NO_THRESHOLD;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[test]
    fn weights_balance_classes() {
        let labels = [1.0, 1.0, 1.0, -1.0];
        let w = sample_weights(&labels, &[0.0; 4]);
        assert_abs_diff_eq!(w.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(w[0], 1.0 / 6.0, epsilon = 1e-12);
        assert_abs_diff_eq!(w[3], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn weights_emphasise_mistakes() {
        let labels = [1.0, 1.0, -1.0, -1.0];
        let w = sample_weights(&labels, &[2.0, -2.0, -2.0, 2.0]);
        assert!(w[1] > w[0]);
        assert!(w[3] > w[2]);
    }

    #[test]
    fn weights_survive_huge_confidences() {
        let w = sample_weights(&[1.0, -1.0], &[-5000.0, 5000.0]);
        assert!(w.iter().all(|v| v.is_finite()));
        assert_abs_diff_eq!(w.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    }

    fn bright_centre(value: u8) -> GrayImageU8 {
        let mut img = GrayImageU8::filled(12, 12, 40);
        for y in 4..8 {
            for x in 4..8 {
                img.set(x, y, value);
            }
        }
        img
    }

    #[test]
    fn stage_closes_on_last_tree() {
        let mut patches = Vec::new();
        let mut labels = Vec::new();
        for i in 0..8u8 {
            patches.push(bright_centre(200 + i));
            labels.push(1.0);
            patches.push(bright_centre(10 + i));
            labels.push(-1.0);
        }
        let params = StageParams {
            max_trees: 4,
            max_fpr: 0.0,
            min_tpr: 1.0,
            roc_step: 0.001,
        };
        let mut cascade = Cascade::new(1.0, 1);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(11);
        let outcome = BoostTrainer::new(TreeTrainer::new(1, 256), params)
            .train_stage(&mut cascade, &patches, &labels, vec![0.0; 16], &mut rng)
            .unwrap();

        let n = outcome.summary.trees_added;
        assert!(n >= 1 && n <= 4);
        assert_eq!(cascade.trees.len(), n);
        assert_eq!(cascade.stage_count(), 1);
        assert!(cascade.trees[..n - 1]
            .iter()
            .all(|t| t.threshold == NO_THRESHOLD));
        assert_eq!(cascade.trees[n - 1].threshold, outcome.summary.threshold);
        assert_abs_diff_eq!(outcome.summary.tpr, 1.0);
        assert_abs_diff_eq!(outcome.summary.fpr, 0.0);

        // Every positive passes the freshly closed stage with its running confidence.
        for (i, p) in patches.iter().enumerate() {
            let pred = cascade.predict(p);
            assert_abs_diff_eq!(pred.confidence, outcome.confidences[i], epsilon = 1e-5);
            if labels[i] > 0.0 {
                assert!(pred.passed);
            }
        }
    }

    #[test]
    fn budget_ends_stage_without_error() {
        // Identical patches cannot be separated; the stage stops at its budget.
        let patches = vec![GrayImageU8::filled(8, 8, 9); 6];
        let labels = [1.0, 1.0, 1.0, -1.0, -1.0, -1.0];
        let params = StageParams {
            max_trees: 2,
            max_fpr: 0.1,
            min_tpr: 1.0,
            roc_step: 0.001,
        };
        let mut cascade = Cascade::new(1.0, 2);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(2);
        let outcome = BoostTrainer::new(TreeTrainer::new(2, 8), params)
            .train_stage(&mut cascade, &patches, &labels, vec![0.0; 6], &mut rng)
            .unwrap();
        assert_eq!(outcome.summary.trees_added, 2);
        assert_abs_diff_eq!(outcome.summary.fpr, 1.0);
        assert_eq!(cascade.stage_count(), 1);
    }
}
