use super::timing::TimingBreakdown;
use crate::train::boost::StageSummary;
use serde::Serialize;

/// What happened while appending (or trying to append) one stage.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageReport {
    pub stage: usize,
    pub min_tpr: f32,
    /// Positives still accepted by the cascade before this stage.
    pub positives: usize,
    pub positive_hit_rate: f32,
    /// Hard negatives found, and the rate at which they passed.
    pub negatives: usize,
    pub negative_hit_rate: f32,
    pub negative_trials: usize,
    /// `None` when the negative hit rate already met the target.
    pub boost: Option<StageSummary>,
    pub timing: TimingBreakdown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StopReason {
    /// Hard negatives pass at or below the target FPR.
    TargetReached,
    /// Every stage of the TPR schedule has been trained.
    ScheduleExhausted,
}

/// Summary of one training run, possibly resumed mid-schedule.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingReport {
    pub start_stage: usize,
    pub stages: Vec<StageReport>,
    pub stop_reason: StopReason,
    pub total_stages: usize,
    pub total_trees: usize,
    pub total_ms: f64,
}

impl TrainingReport {
    /// Stages appended during this run.
    pub fn stages_added(&self) -> usize {
        self.stages.iter().filter(|s| s.boost.is_some()).count()
    }
}
