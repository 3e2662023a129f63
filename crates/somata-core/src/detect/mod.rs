pub mod config;
mod greedy;
mod types;

pub use config::DetectionConfig;
pub use greedy::{detect_cells, detect_cells_with, GreedyDetector};
pub use types::{CancelToken, CellDetections, Centroid, StepOutcome, Termination};
