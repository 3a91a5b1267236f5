//! Parameter types configuring cascade training.
//!
//! Defaults follow the reference training setup: depth-5 trees, up to 64
//! trees per stage, a stage is accepted once its FPR drops to 0.5 and the
//! cascade stops growing once hard negatives pass at 1e-3 or less.

use crate::error::{CascadeError, Result};
use crate::model::io::MAX_TREE_DEPTH;
use serde::{Deserialize, Serialize};

/// Random feature pool drawn for every internal node.
pub const DEFAULT_CANDIDATE_COUNT: usize = 1024;

/// Threshold decrement of the linear ROC search.
pub const DEFAULT_ROC_STEP: f32 = 0.001;

/// Training knobs for the tree, stage and cascade trainers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainParams {
    /// Depth shared by every tree of the cascade.
    pub tree_depth: usize,
    /// Window width divided by height.
    pub wh_ratio: f32,
    /// Tree budget per stage.
    pub max_trees: usize,
    /// A stage stops adding trees once its FPR is at or below this value.
    pub max_fpr: f32,
    /// Training stops once hard negatives pass the cascade at this rate.
    pub target_fpr: f32,
    /// Minimum TPR to retain for each stage; its length bounds the stage count.
    pub min_tprs: Vec<f32>,
    /// Random features scored per internal node.
    pub candidate_count: usize,
    /// Threshold decrement of the ROC search.
    pub roc_step: f32,
    pub seed: u64,
}

impl Default for TrainParams {
    fn default() -> Self {
        let mut min_tprs = vec![0.980, 0.990, 0.995, 0.995];
        min_tprs.extend(std::iter::repeat(0.997).take(100));
        Self {
            tree_depth: 5,
            wh_ratio: 1.0,
            max_trees: 64,
            max_fpr: 0.5,
            target_fpr: 1e-3,
            min_tprs,
            candidate_count: DEFAULT_CANDIDATE_COUNT,
            roc_step: DEFAULT_ROC_STEP,
            seed: 0,
        }
    }
}

fn check_range<T>(name: &str, val: T, min: T, max: T) -> Result<()>
where
    T: PartialOrd + std::fmt::Display,
{
    if val < min || val > max || val.partial_cmp(&val).is_none() {
        return Err(CascadeError::InvalidParams(format!(
            "{name} has an unsupported value: {val}. Valid range: ({min}, {max})"
        )));
    }
    Ok(())
}

impl TrainParams {
    pub fn validate(&self) -> Result<()> {
        check_range("wh_ratio", self.wh_ratio, 0.01, 10.0)?;
        check_range("tree_depth", self.tree_depth, 1, MAX_TREE_DEPTH)?;
        check_range("max_trees", self.max_trees, 1, 256)?;
        check_range("max_fpr", self.max_fpr, 0.0, 1.0)?;
        check_range("target_fpr", self.target_fpr, 0.0, 1.0)?;
        for &tpr in &self.min_tprs {
            check_range("min_tprs", tpr, 0.01, 1.0)?;
        }
        if self.candidate_count == 0 {
            return Err(CascadeError::InvalidParams(
                "candidate_count must be at least 1".into(),
            ));
        }
        if !(self.roc_step > 0.0 && self.roc_step.is_finite()) {
            return Err(CascadeError::InvalidParams(format!(
                "roc_step must be positive, got {}",
                self.roc_step
            )));
        }
        Ok(())
    }

    /// Stage-level view of these parameters for stage `stage_idx`.
    pub fn stage(&self, stage_idx: usize) -> Option<StageParams> {
        self.min_tprs.get(stage_idx).map(|&min_tpr| StageParams {
            max_trees: self.max_trees,
            max_fpr: self.max_fpr,
            min_tpr,
            roc_step: self.roc_step,
        })
    }
}

/// Knobs of a single boosting stage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StageParams {
    pub max_trees: usize,
    pub max_fpr: f32,
    pub min_tpr: f32,
    pub roc_step: f32,
}
