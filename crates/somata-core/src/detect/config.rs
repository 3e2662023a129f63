use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_DILATION_SIZE, DEFAULT_MAX_CELLS, DEFAULT_PROBABILITY_THRESHOLD,
    DEFAULT_STOPPING_CRITERION, DEFAULT_TEMPLATE_RADIUS, TEMPLATE_BOX_MARGIN,
};
use crate::correlate::CorrelationMethod;
use crate::error::{Result, SomataError};

/// Parameters of the greedy cell search.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Voxels with probability below this are zeroed before the search, in (0, 1).
    #[serde(default = "default_probability_threshold")]
    pub probability_threshold: f32,
    /// Minimum normalized correlation for a detection to be accepted, in (0, 1).
    #[serde(default = "default_stopping_criterion")]
    pub stopping_criterion: f64,
    /// Template sizes to sweep. Each builds a sphere of radius `(r - 1) / 2`.
    #[serde(default = "default_template_radii")]
    pub template_radii: Vec<f32>,
    /// Growth of the suppression template over the detection template.
    #[serde(default = "default_dilation_size")]
    pub dilation_size: f32,
    /// Maximum number of detections.
    #[serde(default = "default_max_cells")]
    pub max_cells: usize,
    /// Correlation kernel selection.
    #[serde(default)]
    pub correlation: CorrelationMethod,
}

fn default_probability_threshold() -> f32 {
    DEFAULT_PROBABILITY_THRESHOLD
}
fn default_stopping_criterion() -> f64 {
    DEFAULT_STOPPING_CRITERION
}
fn default_template_radii() -> Vec<f32> {
    vec![DEFAULT_TEMPLATE_RADIUS]
}
fn default_dilation_size() -> f32 {
    DEFAULT_DILATION_SIZE
}
fn default_max_cells() -> usize {
    DEFAULT_MAX_CELLS
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            probability_threshold: DEFAULT_PROBABILITY_THRESHOLD,
            stopping_criterion: DEFAULT_STOPPING_CRITERION,
            template_radii: default_template_radii(),
            dilation_size: DEFAULT_DILATION_SIZE,
            max_cells: DEFAULT_MAX_CELLS,
            correlation: CorrelationMethod::default(),
        }
    }
}

impl DetectionConfig {
    /// Check parameter ranges before any work is done.
    pub fn validate(&self) -> Result<()> {
        if !(self.probability_threshold > 0.0 && self.probability_threshold < 1.0) {
            return Err(SomataError::InvalidInput(format!(
                "probability_threshold must be in (0, 1), got {}",
                self.probability_threshold
            )));
        }
        if !(self.stopping_criterion > 0.0 && self.stopping_criterion < 1.0) {
            return Err(SomataError::InvalidInput(format!(
                "stopping_criterion must be in (0, 1), got {}",
                self.stopping_criterion
            )));
        }
        if self.template_radii.is_empty() {
            return Err(SomataError::InvalidInput(
                "template_radii must hold at least one radius".into(),
            ));
        }
        if let Some(r) = self
            .template_radii
            .iter()
            .find(|r| !r.is_finite() || **r <= 0.0)
        {
            return Err(SomataError::InvalidInput(format!(
                "template radii must be positive, got {r}"
            )));
        }
        if !self.dilation_size.is_finite() || self.dilation_size < 0.0 {
            return Err(SomataError::InvalidInput(format!(
                "dilation_size must be non-negative, got {}",
                self.dilation_size
            )));
        }
        if self.max_cells == 0 || self.max_cells > u32::MAX as usize {
            return Err(SomataError::InvalidInput(format!(
                "max_cells must be in 1..={}, got {}",
                u32::MAX,
                self.max_cells
            )));
        }
        Ok(())
    }

    /// Radii of the suppression templates: each detection radius grown by `dilation_size`.
    pub fn suppression_radii(&self) -> Vec<f32> {
        self.template_radii
            .iter()
            .map(|r| r + self.dilation_size)
            .collect()
    }

    /// Half-side of the box shared by detection and suppression templates.
    ///
    /// `ceil(max_radius / 2) + 1`, grown only if the largest suppression
    /// sphere would not fit otherwise.
    pub fn box_radius(&self) -> usize {
        let max_detect = self.template_radii.iter().copied().fold(0.0_f32, f32::max);
        let max_suppress = max_detect + self.dilation_size;
        let base = (max_detect / 2.0).ceil() as usize + TEMPLATE_BOX_MARGIN;
        let needed = (max_suppress / 2.0).ceil() as usize;
        base.max(needed)
    }
}
