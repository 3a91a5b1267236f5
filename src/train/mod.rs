//! Cascade training: greedy tree growth, boosting stages closed on a ROC
//! threshold, and the hard-negative bootstrap loop that stacks stages.

pub mod boost;
pub mod cascade;
pub mod params;
pub mod roc;
pub mod sampling;
pub mod tree;

pub use boost::{sample_weights, BoostTrainer, StageOutcome, StageSummary};
pub use cascade::{train_to_file, CascadeTrainer};
pub use params::{StageParams, TrainParams};
pub use roc::{roc_point, search_threshold, RocPoint, ThresholdSearch};
pub use sampling::{sample_passing, Sampled};
pub use tree::{random_features, TreeTrainer};
