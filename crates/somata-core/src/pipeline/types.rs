use std::path::PathBuf;

use crate::correlate::CorrelationMethod;
use crate::detect::CellDetections;

/// Pipeline processing stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Reading,
    Classifying,
    Detecting,
    Writing,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reading => write!(f, "Reading volume"),
            Self::Classifying => write!(f, "Classifying voxels"),
            Self::Detecting => write!(f, "Detecting cells"),
            Self::Writing => write!(f, "Writing output"),
        }
    }
}

/// Result of a pipeline run.
#[derive(Clone, Debug)]
pub struct PipelineOutput {
    pub detections: CellDetections,
    /// Correlation method actually used.
    pub method: CorrelationMethod,
    pub centroids_path: PathBuf,
    pub labels_path: PathBuf,
    pub label_slices_dir: Option<PathBuf>,
}

/// Stage and detection-count callbacks from a pipeline run.
///
/// Called from the pipeline thread only; every method defaults to doing nothing.
pub trait ProgressReporter: Send + Sync {
    /// `total_items` is the detection cap while `Detecting`, `None` elsewhere.
    fn begin_stage(&self, _stage: PipelineStage, _total_items: Option<usize>) {}

    /// `items_done` cells accepted so far.
    fn advance(&self, _items_done: usize) {}

    fn finish_stage(&self) {}
}

/// Reporter for [`super::run_pipeline`], which shows no progress.
pub(super) struct NoOpReporter;

impl ProgressReporter for NoOpReporter {}
