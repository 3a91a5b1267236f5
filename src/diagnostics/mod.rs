//! Serializable reports produced by training runs and detector scans.
//!
//! `TrainingReport` lists every stage the cascade trainer visited with its
//! sampling statistics, while `ScanReport` wraps the raw detections of one
//! image with per-scale window counts.

pub mod scan;
pub mod timing;
pub mod training;

pub use scan::{ScaleReport, ScanReport};
pub use timing::{elapsed_ms, PhaseTiming, TimingBreakdown};
pub use training::{StageReport, StopReason, TrainingReport};
