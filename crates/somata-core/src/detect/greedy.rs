use ndarray::{Array3, ArrayView3, Zip};
use tracing::{debug, info};

use crate::consts::DETECTION_LOG_INTERVAL;
use crate::correlate::{tie_tolerance, CorrelationMethod, LibraryCorrelator, Peak};
use crate::error::Result;
use crate::geometry::{unravel_index, validate_volume};
use crate::placement::place_template;
use crate::template::TemplateLibrary;

use super::config::DetectionConfig;
use super::types::{CancelToken, CellDetections, Centroid, StepOutcome, Termination};

/// Greedy template-matching search over one probability volume.
///
/// Each step correlates the residual volume with every detection template,
/// takes the global best response, zeroes the suppression footprint around
/// it, and either accepts it (labeling the detection footprint) or ends the
/// search when its confidence is at or below the stopping criterion.
pub struct GreedyDetector {
    config: DetectionConfig,
    detect: TemplateLibrary,
    suppress: TemplateLibrary,
    correlator: LibraryCorrelator,
    residual: Array3<f32>,
    labels: Array3<u32>,
    centroids: Vec<Centroid>,
    next_id: u32,
    termination: Option<Termination>,
}

impl GreedyDetector {
    /// Validate inputs, threshold the volume and build both template libraries.
    pub fn new(probability: &Array3<f32>, config: &DetectionConfig) -> Result<Self> {
        config.validate()?;
        validate_volume(probability)?;

        let box_radius = config.box_radius();
        let detect = TemplateLibrary::build(&config.template_radii, box_radius)?;
        let suppress = TemplateLibrary::build(&config.suppression_radii(), box_radius)?;

        let shape = probability.dim();
        let correlator = LibraryCorrelator::new(&detect, shape, config.correlation)?;

        let threshold = config.probability_threshold;
        let residual = probability.mapv(|p| if p < threshold { 0.0 } else { p });

        info!(
            shape = ?shape,
            templates = detect.len(),
            box_length = detect.box_length(),
            method = %correlator.method(),
            max_cells = config.max_cells,
            "Starting cell detection"
        );

        Ok(Self {
            config: config.clone(),
            detect,
            suppress,
            correlator,
            residual,
            labels: Array3::zeros(shape),
            centroids: Vec::new(),
            next_id: 1,
            termination: None,
        })
    }

    /// Run one greedy iteration.
    pub fn step(&mut self) -> Result<StepOutcome> {
        if let Some(t) = self.termination {
            return Ok(StepOutcome::Finished(t));
        }
        if self.centroids.len() >= self.config.max_cells {
            self.termination = Some(Termination::MaxCells);
            return Ok(StepOutcome::Finished(Termination::MaxCells));
        }

        let peaks = self.correlator.peaks(&self.residual)?;
        let (winner, peak) = select_winner(&peaks);

        let shape = self.residual.dim();
        let box_length = self.detect.box_length();
        let detect_t = &self.detect.templates()[winner];
        let suppress_t = &self.suppress.templates()[winner];

        let detect_mask = place_template(detect_t.vector(), box_length, peak.flat_index, shape)?;
        let suppress_mask =
            place_template(suppress_t.vector(), box_length, peak.flat_index, shape)?;

        Zip::from(&mut self.residual)
            .and(&suppress_mask)
            .for_each(|r, &m| {
                if m != 0.0 {
                    *r = 0.0;
                }
            });

        let confidence = peak.value / detect_t.weight_sum();
        let (row, col, z) = unravel_index(peak.flat_index, shape);
        debug!(
            iteration = self.centroids.len(),
            template = winner,
            row,
            col,
            z,
            confidence,
            "Best candidate"
        );

        if confidence <= self.config.stopping_criterion {
            self.termination = Some(Termination::BelowStoppingCriterion);
            return Ok(StepOutcome::Rejected { confidence });
        }

        let id = self.next_id;
        Zip::from(&mut self.labels)
            .and(&detect_mask)
            .for_each(|l, &m| {
                if m != 0.0 && *l == 0 {
                    *l = id;
                }
            });
        self.next_id += 1;

        let centroid = Centroid {
            row,
            col,
            z,
            confidence,
        };
        self.centroids.push(centroid);

        if self.centroids.len() % DETECTION_LOG_INTERVAL == 1 {
            info!(
                detected = self.centroids.len(),
                remaining = self.config.max_cells - self.centroids.len(),
                confidence,
                "Cell detection progress"
            );
        }

        Ok(StepOutcome::Accepted(centroid))
    }

    /// Iterate until the search terminates or `cancel` is raised.
    ///
    /// `on_accept` is called with the running count after every accepted detection.
    pub fn run<F>(&mut self, cancel: &CancelToken, mut on_accept: F) -> Result<Termination>
    where
        F: FnMut(usize, &Centroid),
    {
        loop {
            if cancel.is_cancelled() && self.termination.is_none() {
                self.termination = Some(Termination::Cancelled);
            }
            match self.step()? {
                StepOutcome::Accepted(c) => on_accept(self.centroids.len(), &c),
                StepOutcome::Rejected { .. } => {}
                StepOutcome::Finished(t) => return Ok(t),
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.termination.is_some()
    }

    pub fn termination(&self) -> Option<Termination> {
        self.termination
    }

    pub fn centroids(&self) -> &[Centroid] {
        &self.centroids
    }

    pub fn labels(&self) -> ArrayView3<'_, u32> {
        self.labels.view()
    }

    /// Read-only view of the thresholded, progressively suppressed volume.
    pub fn residual(&self) -> ArrayView3<'_, f32> {
        self.residual.view()
    }

    pub fn detect_library(&self) -> &TemplateLibrary {
        &self.detect
    }

    pub fn suppress_library(&self) -> &TemplateLibrary {
        &self.suppress
    }

    /// Correlation method in use after resolving `Auto`.
    pub fn method(&self) -> CorrelationMethod {
        self.correlator.method()
    }

    /// Consume the detector. A search stopped before terminating reports `Cancelled`.
    pub fn finish(self) -> CellDetections {
        let termination = self.termination.unwrap_or(Termination::Cancelled);
        info!(
            detected = self.centroids.len(),
            termination = %termination,
            "Cell detection done"
        );
        CellDetections {
            centroids: self.centroids,
            labels: self.labels,
            termination,
        }
    }
}

/// Highest peak across templates; ties go to the earliest template.
fn select_winner(peaks: &[Peak]) -> (usize, Peak) {
    let max = peaks
        .iter()
        .map(|p| p.value)
        .fold(f64::NEG_INFINITY, f64::max);
    let floor = max - tie_tolerance(max);
    let winner = peaks.iter().position(|p| p.value >= floor).unwrap_or(0);
    (winner, peaks[winner])
}

/// Detect cell bodies in a probability volume.
pub fn detect_cells(probability: &Array3<f32>, config: &DetectionConfig) -> Result<CellDetections> {
    detect_cells_with(probability, config, &CancelToken::new(), |_, _| {})
}

/// [`detect_cells`] with cooperative cancellation and per-detection progress.
pub fn detect_cells_with<F>(
    probability: &Array3<f32>,
    config: &DetectionConfig,
    cancel: &CancelToken,
    on_accept: F,
) -> Result<CellDetections>
where
    F: FnMut(usize, &Centroid),
{
    let mut detector = GreedyDetector::new(probability, config)?;
    detector.run(cancel, on_accept)?;
    Ok(detector.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_winner_prefers_first_on_tie() {
        let peaks = [
            Peak {
                value: 2.0,
                flat_index: 7,
            },
            Peak {
                value: 2.0,
                flat_index: 3,
            },
            Peak {
                value: 1.0,
                flat_index: 0,
            },
        ];
        assert_eq!(select_winner(&peaks), (0, peaks[0]));
    }

    #[test]
    fn test_select_winner_treats_rounding_noise_as_tie() {
        let peaks = [
            Peak {
                value: 0.5,
                flat_index: 4,
            },
            Peak {
                value: 0.5 + 1e-14,
                flat_index: 9,
            },
        ];
        assert_eq!(select_winner(&peaks).0, 0);
    }

    #[test]
    fn test_select_winner_picks_max() {
        let peaks = [
            Peak {
                value: 0.5,
                flat_index: 1,
            },
            Peak {
                value: 0.9,
                flat_index: 2,
            },
        ];
        assert_eq!(select_winner(&peaks).0, 1);
    }
}
