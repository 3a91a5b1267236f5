use super::feature::check_patch_dims;
use super::tree::Tree;
use crate::error::{CascadeError, Result};
use crate::image::ImageView;
use serde::{Deserialize, Serialize};

/// Outcome of running a patch through the cascade.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Prediction {
    pub passed: bool,
    /// Accumulated leaf values up to the last evaluated tree.
    pub confidence: f32,
    pub trees_evaluated: usize,
}

/// Boosted cascade: every stage's trees flattened into one sequence.
///
/// Only the last tree of a stage carries a real threshold. Tree outputs are
/// summed as-is, without a per-tree boosting weight.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cascade {
    /// Window width divided by window height.
    pub wh_ratio: f32,
    pub tree_depth: usize,
    pub trees: Vec<Tree>,
}

impl Cascade {
    pub fn new(wh_ratio: f32, tree_depth: usize) -> Self {
        Self {
            wh_ratio,
            tree_depth,
            trees: Vec::new(),
        }
    }

    pub fn stage_count(&self) -> usize {
        self.trees.iter().filter(|t| t.is_stage_end()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Append a tree, enforcing the shared depth.
    pub fn push_tree(&mut self, tree: Tree) -> Result<()> {
        if tree.depth() != self.tree_depth {
            return Err(CascadeError::InvalidData(format!(
                "tree of depth {} does not match cascade depth {}",
                tree.depth(),
                self.tree_depth
            )));
        }
        self.trees.push(tree);
        Ok(())
    }

    /// Sets the rejection threshold of the most recent tree, closing a stage.
    pub fn close_stage(&mut self, threshold: f32) -> Result<()> {
        let last = self
            .trees
            .last_mut()
            .ok_or_else(|| CascadeError::InvalidData("cannot close an empty stage".into()))?;
        last.threshold = threshold;
        Ok(())
    }

    /// Accumulate tree outputs and stop at the first stage whose running sum
    /// falls below its threshold.
    pub fn predict<I>(&self, patch: &I) -> Prediction
    where
        I: ImageView<Pixel = u8> + ?Sized,
    {
        let mut confidence = 0.0f32;
        for (idx, tree) in self.trees.iter().enumerate() {
            confidence += tree.evaluate(patch);
            if tree.is_stage_end() && confidence < tree.threshold {
                return Prediction {
                    passed: false,
                    confidence,
                    trees_evaluated: idx + 1,
                };
            }
        }
        Prediction {
            passed: true,
            confidence,
            trees_evaluated: self.trees.len(),
        }
    }

    /// Confidence of a surviving patch, `None` when rejected.
    #[inline]
    pub fn classify<I>(&self, patch: &I) -> Option<f32>
    where
        I: ImageView<Pixel = u8> + ?Sized,
    {
        let p = self.predict(patch);
        p.passed.then_some(p.confidence)
    }

    /// Validated variant of [`Cascade::predict`] for patches of unknown origin.
    pub fn try_predict<I>(&self, patch: &I) -> Result<Prediction>
    where
        I: ImageView<Pixel = u8> + ?Sized,
    {
        check_patch_dims(patch.width(), patch.height())?;
        Ok(self.predict(patch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::GrayImageU8;
    use crate::model::{Feature, NO_THRESHOLD};

    fn constant_tree(value: f32, threshold: f32) -> Tree {
        Tree::from_parts(vec![Feature::default()], vec![value, value], threshold).unwrap()
    }

    #[test]
    fn empty_cascade_accepts_everything() {
        let c = Cascade::new(1.0, 1);
        let p = c.predict(&GrayImageU8::filled(4, 4, 0));
        assert!(p.passed);
        assert_eq!(p.confidence, 0.0);
        assert_eq!(p.trees_evaluated, 0);
    }

    #[test]
    fn stage_count_ignores_sentinel_trees() {
        let mut c = Cascade::new(1.0, 1);
        c.push_tree(constant_tree(0.1, NO_THRESHOLD)).unwrap();
        c.push_tree(constant_tree(0.1, 0.0)).unwrap();
        c.push_tree(constant_tree(0.1, NO_THRESHOLD)).unwrap();
        assert_eq!(c.stage_count(), 1);
        c.close_stage(0.2).unwrap();
        assert_eq!(c.stage_count(), 2);
    }

    #[test]
    fn threshold_below_sentinel_still_closes_stage() {
        let mut c = Cascade::new(1.0, 1);
        c.push_tree(constant_tree(-2000.0, -1500.0)).unwrap();
        assert_eq!(c.stage_count(), 1);

        let p = c.predict(&GrayImageU8::filled(4, 4, 9));
        assert!(!p.passed);
        assert_eq!(p.trees_evaluated, 1);
    }

    #[test]
    fn unreachable_first_stage_stops_evaluation() {
        let mut c = Cascade::new(1.0, 1);
        c.push_tree(constant_tree(0.5, NO_THRESHOLD)).unwrap();
        c.push_tree(constant_tree(0.5, 100.0)).unwrap();
        c.push_tree(constant_tree(10.0, NO_THRESHOLD)).unwrap();
        c.push_tree(constant_tree(10.0, 0.0)).unwrap();

        let p = c.predict(&GrayImageU8::filled(6, 6, 3));
        assert!(!p.passed);
        assert_eq!(p.trees_evaluated, 2);
        assert!((p.confidence - 1.0).abs() < 1e-6);
        assert_eq!(c.classify(&GrayImageU8::filled(6, 6, 3)), None);
    }

    #[test]
    fn depth_mismatch_rejected() {
        let mut c = Cascade::new(1.0, 2);
        assert!(c.push_tree(Tree::new(1)).is_err());
        assert!(c.close_stage(0.0).is_err());
    }
}
