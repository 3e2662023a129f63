use std::sync::Arc;

use ndarray::{s, Array3, ArrayView3, Axis};
use num_complex::Complex;
use rayon::prelude::*;
use rustfft::{Fft, FftPlanner};

use crate::geometry::{voxel_count, Shape3};

/// Frequency-domain correlator for a fixed volume shape and a fixed set of
/// odd-sided cubic kernels.
///
/// Kernel spectra are computed once; each call to [`FftCorrelator::spectrum`]
/// transforms the volume, and [`FftCorrelator::response`] multiplies by one
/// kernel spectrum and transforms back. The padded size is `n + L - 1` per
/// axis, so the linear correlation never wraps around.
pub struct FftCorrelator {
    shape: Shape3,
    padded: Shape3,
    half: usize,
    spectra: Vec<Array3<Complex<f64>>>,
    forward: [Arc<dyn Fft<f64>>; 3],
    inverse: [Arc<dyn Fft<f64>>; 3],
}

impl FftCorrelator {
    /// Prepare spectra for `kernels`, all of side `box_length`.
    pub fn new(kernels: &[ArrayView3<'_, f32>], box_length: usize, shape: Shape3) -> Self {
        let padded = (
            shape.0 + box_length - 1,
            shape.1 + box_length - 1,
            shape.2 + box_length - 1,
        );
        let mut planner = FftPlanner::new();
        let forward = [
            planner.plan_fft_forward(padded.0),
            planner.plan_fft_forward(padded.1),
            planner.plan_fft_forward(padded.2),
        ];
        let inverse = [
            planner.plan_fft_inverse(padded.0),
            planner.plan_fft_inverse(padded.1),
            planner.plan_fft_inverse(padded.2),
        ];

        let spectra = kernels
            .iter()
            .map(|kernel| {
                // Flip the kernel so convolution in the frequency domain
                // yields correlation.
                let last = box_length - 1;
                let mut buf = Array3::<Complex<f64>>::zeros(padded);
                for ((i, j, k), &w) in kernel.indexed_iter() {
                    if w != 0.0 {
                        buf[[last - i, last - j, last - k]] = Complex::new(w as f64, 0.0);
                    }
                }
                transform(&mut buf, &forward);
                buf
            })
            .collect();

        Self {
            shape,
            padded,
            half: box_length / 2,
            spectra,
            forward,
            inverse,
        }
    }

    pub fn shape(&self) -> Shape3 {
        self.shape
    }

    pub fn kernel_count(&self) -> usize {
        self.spectra.len()
    }

    /// Zero-pad the volume and take its 3D FFT.
    pub fn spectrum(&self, volume: &Array3<f32>) -> Array3<Complex<f64>> {
        let (n0, n1, n2) = self.shape;
        let mut buf = Array3::<Complex<f64>>::zeros(self.padded);
        buf.slice_mut(s![..n0, ..n1, ..n2])
            .zip_mut_with(volume, |d, &v| *d = Complex::new(v as f64, 0.0));
        transform(&mut buf, &self.forward);
        buf
    }

    /// Same-size correlation of the volume behind `spectrum` with kernel `index`.
    pub fn response(&self, spectrum: &Array3<Complex<f64>>, index: usize) -> Array3<f64> {
        let mut buf = spectrum.clone();
        buf.zip_mut_with(&self.spectra[index], |a, &b| *a *= b);
        transform(&mut buf, &self.inverse);

        let scale = 1.0 / voxel_count(self.padded) as f64;
        let h = self.half;
        Array3::from_shape_fn(self.shape, |(r, c, z)| buf[[r + h, c + h, z + h]].re * scale)
    }
}

/// Same-size correlation of one volume with one kernel via FFT.
pub fn correlate_fft(volume: &Array3<f32>, kernel: ArrayView3<'_, f32>) -> Array3<f64> {
    let box_length = kernel.dim().0;
    let correlator = FftCorrelator::new(&[kernel], box_length, volume.dim());
    let spectrum = correlator.spectrum(volume);
    correlator.response(&spectrum, 0)
}

/// In-place separable 3D FFT: 1D transforms along each axis in turn.
fn transform(data: &mut Array3<Complex<f64>>, plans: &[Arc<dyn Fft<f64>>; 3]) {
    for (axis, plan) in plans.iter().enumerate() {
        let len = data.len_of(Axis(axis));
        // Split along a different axis so each rayon task owns whole lanes.
        let outer = if axis == 0 { 1 } else { 0 };
        let inner = if axis > outer { axis - 1 } else { axis };

        data.axis_iter_mut(Axis(outer))
            .into_par_iter()
            .for_each(|mut sheet| {
                let mut lane_buf = vec![Complex::new(0.0, 0.0); len];
                for mut lane in sheet.lanes_mut(Axis(inner)) {
                    for (b, v) in lane_buf.iter_mut().zip(lane.iter()) {
                        *b = *v;
                    }
                    plan.process(&mut lane_buf);
                    for (v, b) in lane.iter_mut().zip(lane_buf.iter()) {
                        *v = *b;
                    }
                }
            });
    }
}
