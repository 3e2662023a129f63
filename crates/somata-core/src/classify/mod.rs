//! Seam for the upstream voxel classifier.
//!
//! Producing a probability volume from raw image data is done by an external
//! model. The pipeline only relies on the [`VoxelClassifier`] contract: one
//! probability in `[0, 1]` per input voxel, same shape as the input.

use ndarray::Array3;

use crate::error::{Result, SomataError};

/// Turns a raw intensity volume into a per-voxel cell-body probability volume.
pub trait VoxelClassifier: Send + Sync {
    /// Human-readable name for logs and summaries.
    fn name(&self) -> &str;

    fn classify(&self, raw: &Array3<f32>) -> Result<Array3<f32>>;
}

/// Pass-through classifier for inputs that already are probability maps.
///
/// Values are clamped to `[0, 1]`; non-finite values are rejected.
#[derive(Clone, Copy, Debug, Default)]
pub struct PrecomputedProbabilities;

impl VoxelClassifier for PrecomputedProbabilities {
    fn name(&self) -> &str {
        "precomputed"
    }

    fn classify(&self, raw: &Array3<f32>) -> Result<Array3<f32>> {
        if raw.iter().any(|v| !v.is_finite()) {
            return Err(SomataError::InvalidInput(
                "probability map contains non-finite values".into(),
            ));
        }
        Ok(raw.mapv(|v| v.clamp(0.0, 1.0)))
    }
}

/// Run a classifier and check that it kept the input shape.
pub fn classify_checked(
    classifier: &dyn VoxelClassifier,
    raw: &Array3<f32>,
) -> Result<Array3<f32>> {
    let probability = classifier.classify(raw)?;
    if probability.dim() != raw.dim() {
        return Err(SomataError::ShapeMismatch {
            expected: raw.dim(),
            actual: probability.dim(),
        });
    }
    Ok(probability)
}
