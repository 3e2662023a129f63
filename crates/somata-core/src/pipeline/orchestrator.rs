use std::fs;
use std::sync::Arc;

use tracing::info;

use crate::classify::{classify_checked, PrecomputedProbabilities, VoxelClassifier};
use crate::consts::{CENTROIDS_FILE_NAME, LABELS_FILE_NAME, LABEL_SLICES_DIR};
use crate::detect::{CancelToken, GreedyDetector};
use crate::error::Result;
use crate::io::{load_volume, save_label_slices, write_centroids_csv, write_raw_labels};

use super::config::PipelineConfig;
use super::types::{NoOpReporter, PipelineOutput, PipelineStage, ProgressReporter};

/// Run read -> classify -> detect -> write with a progress reporter and a
/// cancellation token checked between detection iterations.
pub fn run_pipeline_reported(
    config: &PipelineConfig,
    classifier: &dyn VoxelClassifier,
    reporter: Arc<dyn ProgressReporter>,
    cancel: &CancelToken,
) -> Result<PipelineOutput> {
    config.detection.validate()?;

    // Read
    reporter.begin_stage(PipelineStage::Reading, None);
    let raw = load_volume(&config.input, &config.input_format)?;
    info!(
        input = %config.input.display(),
        shape = ?raw.dim(),
        "Volume loaded"
    );
    reporter.finish_stage();

    // Classify
    reporter.begin_stage(PipelineStage::Classifying, None);
    let probability = classify_checked(classifier, &raw)?;
    drop(raw);
    info!(classifier = classifier.name(), "Probability map ready");
    reporter.finish_stage();

    // Detect
    reporter.begin_stage(PipelineStage::Detecting, Some(config.detection.max_cells));
    let mut detector = GreedyDetector::new(&probability, &config.detection)?;
    let method = detector.method();
    let r = reporter.clone();
    detector.run(cancel, move |done, _| r.advance(done))?;
    let detections = detector.finish();
    reporter.finish_stage();

    // Write
    reporter.begin_stage(PipelineStage::Writing, None);
    fs::create_dir_all(&config.output)?;
    let centroids_path = config.output.join(CENTROIDS_FILE_NAME);
    write_centroids_csv(&detections.centroids, &centroids_path)?;
    let labels_path = config.output.join(LABELS_FILE_NAME);
    write_raw_labels(&detections.labels, &labels_path)?;
    let label_slices_dir = if config.label_slices {
        let dir = config.output.join(LABEL_SLICES_DIR);
        save_label_slices(&detections.labels, &dir)?;
        Some(dir)
    } else {
        None
    };
    info!(
        output = %config.output.display(),
        cells = detections.len(),
        termination = %detections.termination,
        "Output saved"
    );
    reporter.finish_stage();

    Ok(PipelineOutput {
        detections,
        method,
        centroids_path,
        labels_path,
        label_slices_dir,
    })
}

/// Run the full pipeline on a precomputed probability map, without progress
/// reporting or cancellation.
pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineOutput> {
    run_pipeline_reported(
        config,
        &PrecomputedProbabilities,
        Arc::new(NoOpReporter),
        &CancelToken::new(),
    )
}
