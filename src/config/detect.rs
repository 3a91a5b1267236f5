use super::{config_dir, load_json, resolve_path};
use crate::detector::DetectorParams;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct DetectToolConfig {
    pub input: PathBuf,
    pub model: PathBuf,
    #[serde(default)]
    pub detector: DetectorParams,
    #[serde(default)]
    pub output: DetectOutputConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DetectOutputConfig {
    /// Scan report destination; printed to stdout when absent.
    pub json_out: Option<PathBuf>,
    /// Copy of the input with detection outlines drawn in white.
    pub overlay_png: Option<PathBuf>,
}

pub fn load_config(path: &Path) -> Result<DetectToolConfig, String> {
    let mut config: DetectToolConfig = load_json(path)?;
    let base = config_dir(path);
    config.input = resolve_path(&base, &config.input);
    config.model = resolve_path(&base, &config.model);
    for out in [&mut config.output.json_out, &mut config.output.overlay_png]
        .into_iter()
        .flatten()
    {
        *out = resolve_path(&base, out);
    }
    config.detector.validate().map_err(|e| e.to_string())?;
    Ok(config)
}
