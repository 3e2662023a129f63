use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::detect::DetectionConfig;
use crate::io::VolumeFormat;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Input volume: a raw file or a directory of slices.
    pub input: PathBuf,
    /// Output directory for centroids and labels.
    pub output: PathBuf,
    /// Also write the label volume as 16-bit TIFF slices.
    #[serde(default)]
    pub label_slices: bool,
    #[serde(default)]
    pub input_format: VolumeFormat,
    #[serde(default)]
    pub detection: DetectionConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("probability"),
            output: PathBuf::from("detections"),
            label_slices: false,
            input_format: VolumeFormat::default(),
            detection: DetectionConfig::default(),
        }
    }
}
