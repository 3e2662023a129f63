pub mod centroids;
pub mod raw;
pub mod slices;

use std::path::Path;

use ndarray::Array3;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SomataError};

pub use centroids::{read_centroids_csv, write_centroids_csv};
pub use raw::{read_raw_labels, read_raw_volume, write_raw_labels, write_raw_volume};
pub use slices::{list_slices, load_slice_stack, save_label_slices};

/// On-disk layout of an input volume.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum VolumeFormat {
    /// Directory -> slice stack. Files need an explicit raw shape.
    #[default]
    Auto,
    /// Headerless little-endian `f32`, row-major, with the given `[rows, cols, slices]`.
    Raw { shape: [usize; 3] },
    /// Directory of 2D grayscale images, one per z-plane.
    SliceStack,
}

impl std::fmt::Display for VolumeFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "Auto"),
            Self::Raw { shape } => write!(f, "Raw ({}x{}x{})", shape[0], shape[1], shape[2]),
            Self::SliceStack => write!(f, "Slice stack"),
        }
    }
}

/// Load a volume according to `format`.
pub fn load_volume(path: &Path, format: &VolumeFormat) -> Result<Array3<f32>> {
    match format {
        VolumeFormat::Raw { shape } => read_raw_volume(path, (shape[0], shape[1], shape[2])),
        VolumeFormat::SliceStack => load_slice_stack(path),
        VolumeFormat::Auto if path.is_dir() => load_slice_stack(path),
        VolumeFormat::Auto => Err(SomataError::InvalidInput(format!(
            "{} is a file; raw volumes need an explicit shape",
            path.display()
        ))),
    }
}

/// Summary statistics of a volume.
#[derive(Clone, Debug, PartialEq)]
pub struct VolumeStats {
    pub shape: (usize, usize, usize),
    pub min: f32,
    pub max: f32,
    pub mean: f64,
    /// Number of voxels at or above the requested threshold.
    pub above_threshold: usize,
}

pub fn volume_stats(volume: &Array3<f32>, threshold: f32) -> VolumeStats {
    let n = volume.len();
    let (mut min, mut max, mut sum, mut above) = (f32::INFINITY, f32::NEG_INFINITY, 0.0_f64, 0);
    for &v in volume.iter() {
        min = min.min(v);
        max = max.max(v);
        sum += v as f64;
        if v >= threshold {
            above += 1;
        }
    }
    if n == 0 {
        min = 0.0;
        max = 0.0;
    }
    VolumeStats {
        shape: volume.dim(),
        min,
        max,
        mean: if n > 0 { sum / n as f64 } else { 0.0 },
        above_threshold: above,
    }
}
