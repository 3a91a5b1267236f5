use super::{config_dir, load_json, resolve_path};
use crate::dataset::RoiJitter;
use crate::train::TrainParams;
use crate::types::Rect;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct TrainToolConfig {
    /// Model file; training resumes from it when it already exists.
    pub model: PathBuf,
    pub images: Vec<ImageEntry>,
    #[serde(default)]
    pub params: TrainParams,
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub report_json: Option<PathBuf>,
}

/// One training image and the object regions annotated on it.
#[derive(Debug, Deserialize)]
pub struct ImageEntry {
    pub path: PathBuf,
    #[serde(default)]
    pub regions: Vec<Rect>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// `None` disables positive jitter.
    pub jitter: Option<RoiJitter>,
    /// Smallest height of a random negative crop.
    pub negative_min_size: usize,
    /// Seed of the dataset random streams.
    pub seed: u64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            jitter: Some(RoiJitter::default()),
            negative_min_size: 50,
            seed: 0,
        }
    }
}

/// Load a training config, resolving every path against its directory.
pub fn load_config(path: &Path) -> Result<TrainToolConfig, String> {
    let mut config: TrainToolConfig = load_json(path)?;
    let base = config_dir(path);
    config.model = resolve_path(&base, &config.model);
    for entry in &mut config.images {
        entry.path = resolve_path(&base, &entry.path);
    }
    if let Some(report) = config.report_json.as_mut() {
        *report = resolve_path(&base, report);
    }
    config.params.validate().map_err(|e| e.to_string())?;
    Ok(config)
}
