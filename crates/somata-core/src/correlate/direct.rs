use ndarray::{Array3, ArrayView3, Zip};

/// Sparse correlation kernel: only the non-zero template voxels, stored as
/// offsets relative to the box center together with their weight.
#[derive(Clone, Debug)]
pub struct DirectKernel {
    taps: Vec<(isize, isize, isize, f32)>,
}

impl DirectKernel {
    /// Collect the non-zero taps of an odd-sided cubic kernel.
    pub fn from_cube(cube: ArrayView3<'_, f32>) -> Self {
        let half = (cube.dim().0 / 2) as isize;
        let taps = cube
            .indexed_iter()
            .filter(|(_, &w)| w != 0.0)
            .map(|((i, j, k), &w)| (i as isize - half, j as isize - half, k as isize - half, w))
            .collect();
        Self { taps }
    }

    /// Number of non-zero taps, i.e. multiply-adds per output voxel.
    pub fn len(&self) -> usize {
        self.taps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }
}

/// Same-size cross-correlation in the spatial domain:
/// `out[p] = sum_o kernel[o] * volume[p + o]`, with zero outside the volume.
pub fn correlate_direct(volume: &Array3<f32>, kernel: &DirectKernel) -> Array3<f64> {
    let (d0, d1, d2) = volume.dim();
    let mut out = Array3::<f64>::zeros((d0, d1, d2));

    Zip::indexed(&mut out).par_for_each(|(r, c, z), o| {
        let mut acc = 0.0_f64;
        for &(dr, dc, dz, w) in &kernel.taps {
            let nr = r as isize + dr;
            let nc = c as isize + dc;
            let nz = z as isize + dz;
            if nr < 0
                || nr >= d0 as isize
                || nc < 0
                || nc >= d1 as isize
                || nz < 0
                || nz >= d2 as isize
            {
                continue;
            }
            acc += w as f64 * volume[[nr as usize, nc as usize, nz as usize]] as f64;
        }
        *o = acc;
    });

    out
}
