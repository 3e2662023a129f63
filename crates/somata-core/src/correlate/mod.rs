pub mod direct;
pub mod fft;

use ndarray::{Array3, ArrayView3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::consts::{FFT_COST_FACTOR, PEAK_TIE_TOLERANCE};
use crate::error::{Result, SomataError};
use crate::geometry::{cube_view, voxel_count, Shape3};
use crate::template::TemplateLibrary;

pub use direct::{correlate_direct, DirectKernel};
pub use fft::{correlate_fft, FftCorrelator};

/// How the volume/template correlation is evaluated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrelationMethod {
    /// Pick direct or FFT from the estimated operation count.
    #[default]
    Auto,
    /// Spatial-domain correlation over the non-zero template voxels.
    Direct,
    /// Frequency-domain correlation with cached template spectra.
    Fft,
}

impl std::fmt::Display for CorrelationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "Auto"),
            Self::Direct => write!(f, "Direct"),
            Self::Fft => write!(f, "FFT"),
        }
    }
}

/// Global maximum of one correlation response.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Peak {
    pub value: f64,
    /// Row-major flat index of the first voxel attaining `value`.
    pub flat_index: usize,
}

/// Locate the maximum of a response; ties resolve to the lowest flat index.
///
/// Values within [`tie_tolerance`] of the maximum count as tied, so direct and
/// FFT responses of the same volume pick the same voxel.
pub fn find_peak(response: &Array3<f64>) -> Peak {
    let max = response.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let floor = max - tie_tolerance(max);
    response
        .iter()
        .enumerate()
        .find(|(_, &v)| v >= floor)
        .map(|(i, &v)| Peak {
            value: v,
            flat_index: i,
        })
        .unwrap_or(Peak {
            value: f64::NEG_INFINITY,
            flat_index: 0,
        })
}

/// Absolute tie tolerance around a correlation value.
pub fn tie_tolerance(value: f64) -> f64 {
    PEAK_TIE_TOLERANCE * value.abs().max(1.0)
}

/// Same-size correlation of `volume` with a cubic `kernel`, using `method`.
pub fn correlate(
    volume: &Array3<f32>,
    kernel: ArrayView3<'_, f32>,
    method: CorrelationMethod,
) -> Array3<f64> {
    let sparse = DirectKernel::from_cube(kernel);
    let resolved = resolve_method(method, volume.dim(), kernel.dim().0, sparse.len(), 1);
    match resolved {
        CorrelationMethod::Fft => correlate_fft(volume, kernel),
        _ => correlate_direct(volume, &sparse),
    }
}

/// Replace `Auto` by `Direct` or `Fft` from a rough operation count.
///
/// Direct costs one multiply-add per template tap per voxel. FFT costs one
/// forward volume transform plus one inverse per template over the padded grid.
pub fn resolve_method(
    method: CorrelationMethod,
    shape: Shape3,
    box_length: usize,
    total_taps: usize,
    kernel_count: usize,
) -> CorrelationMethod {
    if method != CorrelationMethod::Auto {
        return method;
    }
    let n = voxel_count(shape) as f64;
    let padded = voxel_count((
        shape.0 + box_length - 1,
        shape.1 + box_length - 1,
        shape.2 + box_length - 1,
    )) as f64;
    let direct_ops = n * total_taps as f64;
    let fft_ops = FFT_COST_FACTOR * (kernel_count as f64 + 1.0) * padded * padded.log2().max(1.0);
    if direct_ops > fft_ops {
        CorrelationMethod::Fft
    } else {
        CorrelationMethod::Direct
    }
}

enum Engine {
    Direct(Vec<DirectKernel>),
    Fft(FftCorrelator),
}

/// Correlates a volume of fixed shape against every template of a library.
pub struct LibraryCorrelator {
    shape: Shape3,
    engine: Engine,
}

impl LibraryCorrelator {
    pub fn new(library: &TemplateLibrary, shape: Shape3, method: CorrelationMethod) -> Result<Self> {
        let box_length = library.box_length();
        let cubes = library
            .iter()
            .map(|t| cube_view(t.vector(), box_length))
            .collect::<Result<Vec<_>>>()?;
        let kernels: Vec<DirectKernel> = cubes
            .iter()
            .map(|c| DirectKernel::from_cube(c.view()))
            .collect();
        let total_taps: usize = kernels.iter().map(DirectKernel::len).sum();

        let engine = match resolve_method(method, shape, box_length, total_taps, kernels.len()) {
            CorrelationMethod::Fft => Engine::Fft(FftCorrelator::new(&cubes, box_length, shape)),
            _ => Engine::Direct(kernels),
        };
        Ok(Self { shape, engine })
    }

    /// The concrete method in use (never `Auto`).
    pub fn method(&self) -> CorrelationMethod {
        match self.engine {
            Engine::Direct(_) => CorrelationMethod::Direct,
            Engine::Fft(_) => CorrelationMethod::Fft,
        }
    }

    /// Peak of the correlation with each template, in library order.
    ///
    /// Templates are evaluated in parallel; the collected order is stable.
    pub fn peaks(&self, volume: &Array3<f32>) -> Result<Vec<Peak>> {
        if volume.dim() != self.shape {
            return Err(SomataError::ShapeMismatch {
                expected: self.shape,
                actual: volume.dim(),
            });
        }
        let peaks = match &self.engine {
            Engine::Direct(kernels) => kernels
                .par_iter()
                .map(|k| find_peak(&correlate_direct(volume, k)))
                .collect(),
            Engine::Fft(correlator) => {
                let spectrum = correlator.spectrum(volume);
                (0..correlator.kernel_count())
                    .into_par_iter()
                    .map(|i| find_peak(&correlator.response(&spectrum, i)))
                    .collect()
            }
        };
        Ok(peaks)
    }
}
