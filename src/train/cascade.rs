//! Bootstrap loop growing a cascade one stage at a time.
//!
//! Before every stage the trainer re-samples the positives the cascade still
//! accepts and mines hard negatives (negatives it wrongly accepts). Training
//! ends once those negatives pass at or below the target FPR, or when the
//! per-stage TPR schedule runs out. The cascade is persisted after each stage
//! so an interrupted run resumes from its last completed stage.

use super::boost::BoostTrainer;
use super::params::TrainParams;
use super::sampling::sample_passing;
use super::tree::TreeTrainer;
use crate::dataset::PatchSource;
use crate::diagnostics::{elapsed_ms, StageReport, StopReason, TimingBreakdown, TrainingReport};
use crate::error::{CascadeError, Result};
use crate::model::{load_or_create, save_cascade, Cascade};
use log::info;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::path::Path;
use std::time::Instant;

pub struct CascadeTrainer {
    params: TrainParams,
}

impl CascadeTrainer {
    pub fn new(params: TrainParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &TrainParams {
        &self.params
    }

    /// Grow `cascade` from its current stage count to the end of the TPR
    /// schedule, calling `persist` after every appended stage.
    pub fn train<P, N, F>(
        &self,
        cascade: &mut Cascade,
        positives: &mut P,
        negatives: &mut N,
        mut persist: F,
    ) -> Result<TrainingReport>
    where
        P: PatchSource + ?Sized,
        N: PatchSource + ?Sized,
        F: FnMut(&Cascade) -> Result<()>,
    {
        let t_run = Instant::now();
        let start_stage = cascade.stage_count();
        // Offset by the resume point so a resumed run draws fresh features.
        let mut rng =
            Xoshiro256PlusPlus::seed_from_u64(self.params.seed.wrapping_add(start_stage as u64));

        let mut stages = Vec::new();
        let mut stop_reason = StopReason::ScheduleExhausted;
        for stage in start_stage..self.params.min_tprs.len() {
            let mut report = self.try_append_stage(cascade, stage, positives, negatives, &mut rng)?;
            let Some(summary) = report.boost else {
                info!(
                    "stage {stage}: negatives pass at {:.6} <= {}, done",
                    report.negative_hit_rate, self.params.target_fpr
                );
                stages.push(report);
                stop_reason = StopReason::TargetReached;
                break;
            };

            let t = Instant::now();
            persist(cascade)?;
            report.timing.record("persist", t);
            info!(
                "stage {stage}: {} trees, tpr={:.4} fpr={:.4} threshold={:.4} ({:.1} ms)",
                summary.trees_added,
                summary.tpr,
                summary.fpr,
                summary.threshold,
                report.timing.total_ms
            );
            stages.push(report);
        }

        Ok(TrainingReport {
            start_stage,
            stages,
            stop_reason,
            total_stages: cascade.stage_count(),
            total_trees: cascade.trees.len(),
            total_ms: elapsed_ms(t_run),
        })
    }

    /// Sample the current positives and hard negatives, then append one stage
    /// unless the negatives already pass at or below the target FPR.
    pub fn try_append_stage<P, N>(
        &self,
        cascade: &mut Cascade,
        stage: usize,
        positives: &mut P,
        negatives: &mut N,
        rng: &mut Xoshiro256PlusPlus,
    ) -> Result<StageReport>
    where
        P: PatchSource + ?Sized,
        N: PatchSource + ?Sized,
    {
        let stage_params = self.params.stage(stage).ok_or_else(|| {
            CascadeError::InvalidParams(format!(
                "stage {stage} is past the {}-entry TPR schedule",
                self.params.min_tprs.len()
            ))
        })?;
        let pool = positives.len();
        if pool == 0 {
            return Err(CascadeError::InvalidData("positive source is empty".to_string()));
        }
        let mut timing = TimingBreakdown::default();

        let t = Instant::now();
        let pos = sample_passing(cascade, positives, pool, 0.0)?;
        let neg_target = (2 * pool).saturating_sub(pos.len());
        let neg = sample_passing(cascade, negatives, neg_target, self.params.target_fpr)?;
        timing.record("sampling", t);
        info!(
            "stage {stage}: positives {}/{} (hit rate {:.4}), negatives {}/{} in {} trials (hit rate {:.6})",
            pos.len(),
            pool,
            pos.hit_rate,
            neg.len(),
            neg_target,
            neg.trials,
            neg.hit_rate
        );

        let mut report = StageReport {
            stage,
            min_tpr: stage_params.min_tpr,
            positives: pos.len(),
            positive_hit_rate: pos.hit_rate,
            negatives: neg.len(),
            negative_hit_rate: neg.hit_rate,
            negative_trials: neg.trials,
            boost: None,
            timing,
        };
        if neg.hit_rate <= self.params.target_fpr {
            return Ok(report);
        }
        if pos.is_empty() {
            return Err(CascadeError::InvalidData(format!(
                "no positive passes the cascade before stage {stage}"
            )));
        }

        let n_pos = pos.len();
        let n_neg = neg.len();
        let mut patches = pos.patches;
        patches.extend(neg.patches);
        let mut labels = vec![1.0f32; n_pos];
        labels.resize(n_pos + n_neg, -1.0);
        let mut confidences = pos.confidences;
        confidences.extend(neg.confidences);

        let t = Instant::now();
        let booster = BoostTrainer::new(
            TreeTrainer::new(cascade.tree_depth, self.params.candidate_count),
            stage_params,
        );
        let outcome = booster.train_stage(cascade, &patches, &labels, confidences, rng)?;
        report.timing.record("boosting", t);
        report.boost = Some(outcome.summary);
        Ok(report)
    }
}

/// Resume (or start) training of the model at `path`, saving after every stage.
///
/// A stored model's depth and ratio win over `params`, so `sources` builds the
/// positive and negative sources from the resolved cascade.
pub fn train_to_file<P, N, F>(
    params: TrainParams,
    path: &Path,
    sources: F,
) -> Result<(Cascade, TrainingReport)>
where
    P: PatchSource,
    N: PatchSource,
    F: FnOnce(&Cascade) -> Result<(P, N)>,
{
    let trainer = CascadeTrainer::new(params)?;
    let mut cascade = load_or_create(path, trainer.params.wh_ratio, trainer.params.tree_depth)?;
    let (mut positives, mut negatives) = sources(&cascade)?;
    let report = trainer.train(&mut cascade, &mut positives, &mut negatives, |c| {
        save_cascade(c, path)
    })?;
    Ok((cascade, report))
}
