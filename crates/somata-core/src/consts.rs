/// Default probability threshold: voxels below it are zeroed before the search.
pub const DEFAULT_PROBABILITY_THRESHOLD: f32 = 0.2;

/// Default minimum normalized correlation for a detection to be accepted.
pub const DEFAULT_STOPPING_CRITERION: f64 = 0.47;

/// Default template size (sphere diameter in voxels, plus one).
pub const DEFAULT_TEMPLATE_RADIUS: f32 = 18.0;

/// Default growth of the suppression template relative to the detection template.
pub const DEFAULT_DILATION_SIZE: f32 = 8.0;

/// Default cap on the number of detections.
pub const DEFAULT_MAX_CELLS: usize = 500;

/// Extra voxels added around the largest template to form the shared bounding box.
pub const TEMPLATE_BOX_MARGIN: usize = 1;

/// Relative cost of one complex FFT butterfly versus one direct multiply-add.
/// `Auto` correlation switches to FFT once direct work exceeds FFT work by this factor.
pub const FFT_COST_FACTOR: f64 = 4.0;

/// Relative tolerance under which two correlation values count as a tie.
/// Ties go to the earlier voxel or template, whichever backend produced them.
pub const PEAK_TIE_TOLERANCE: f64 = 1e-9;

/// Log an `info!` progress line every this many accepted detections.
pub const DETECTION_LOG_INTERVAL: usize = 10;

/// Tolerance used when checking template normalization.
pub const NORM_TOLERANCE: f64 = 1e-5;

/// Largest label id representable in a 16-bit label slice.
pub const MAX_SLICE_LABEL: u32 = u16::MAX as u32;

/// Default file name for the centroid table written by the pipeline.
pub const CENTROIDS_FILE_NAME: &str = "centroids.csv";

/// Default file name for the raw label volume written by the pipeline.
pub const LABELS_FILE_NAME: &str = "labels.raw";

/// Sub-directory holding per-z label slices when slice output is enabled.
pub const LABEL_SLICES_DIR: &str = "labels";
