use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};

/// One detected cell body.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Centroid {
    pub row: usize,
    pub col: usize,
    pub z: usize,
    /// Peak correlation divided by the template's value sum.
    pub confidence: f64,
}

/// Why the greedy search stopped. None of these is an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// The best remaining candidate scored at or below the stopping criterion.
    BelowStoppingCriterion,
    /// `max_cells` detections were accepted.
    MaxCells,
    /// The caller cancelled between iterations.
    Cancelled,
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BelowStoppingCriterion => write!(f, "Below stopping criterion"),
            Self::MaxCells => write!(f, "Reached max cells"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Result of a detection run.
#[derive(Clone, Debug)]
pub struct CellDetections {
    /// Centroids in detection order.
    pub centroids: Vec<Centroid>,
    /// 0 = unassigned, otherwise the 1-based index of the claiming detection.
    pub labels: Array3<u32>,
    pub termination: Termination,
}

impl CellDetections {
    pub fn len(&self) -> usize {
        self.centroids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centroids.is_empty()
    }

    /// Dense `D x 4` table: `row, col, z, confidence`.
    pub fn to_array(&self) -> Array2<f64> {
        let mut table = Array2::<f64>::zeros((self.centroids.len(), 4));
        for (mut row, c) in table.rows_mut().into_iter().zip(&self.centroids) {
            row[0] = c.row as f64;
            row[1] = c.col as f64;
            row[2] = c.z as f64;
            row[3] = c.confidence;
        }
        table
    }

    /// Largest label id present in the label volume.
    pub fn max_label(&self) -> u32 {
        self.labels.iter().copied().max().unwrap_or(0)
    }
}

/// Outcome of a single greedy iteration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StepOutcome {
    /// The candidate passed and was labeled.
    Accepted(Centroid),
    /// The candidate failed the stopping criterion; the search is over.
    Rejected { confidence: f64 },
    /// The search had already terminated.
    Finished(Termination),
}

/// Cooperative cancellation flag, checked between iterations.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
