use ndarray::Array3;
use somata_core::correlate::CorrelationMethod;
use somata_core::detect::DetectionConfig;
use somata_core::template::ball;

/// Zero volume with one voxel set to `value`.
pub fn single_voxel(shape: (usize, usize, usize), at: (usize, usize, usize), value: f32) -> Array3<f32> {
    let mut vol = Array3::<f32>::zeros(shape);
    vol[[at.0, at.1, at.2]] = value;
    vol
}

/// Paint a solid ball of the given radius at `center`, clipped to the volume.
pub fn paint_ball(vol: &mut Array3<f32>, center: (usize, usize, usize), radius: f64, value: f32) {
    let (nr, nc, nz) = vol.dim();
    for (dr, dc, dz) in ball(radius) {
        let r = center.0 as isize + dr;
        let c = center.1 as isize + dc;
        let z = center.2 as isize + dz;
        if r < 0 || c < 0 || z < 0 {
            continue;
        }
        let (r, c, z) = (r as usize, c as usize, z as usize);
        if r < nr && c < nc && z < nz {
            vol[[r, c, z]] = value;
        }
    }
}

/// 20³ volume with four radius-1 blobs of decreasing intensity.
///
/// Blob centers are returned in the order a greedy search should find them.
pub fn four_blobs() -> (Array3<f32>, Vec<(usize, usize, usize)>) {
    let centers = vec![(4, 4, 4), (4, 4, 14), (14, 14, 4), (14, 14, 14)];
    let values = [1.0, 0.9, 0.8, 0.7];
    let mut vol = Array3::<f32>::zeros((20, 20, 20));
    for (&c, &v) in centers.iter().zip(&values) {
        paint_ball(&mut vol, c, 1.0, v);
    }
    (vol, centers)
}

/// Small-template configuration matching radius-1 blobs.
pub fn small_config(method: CorrelationMethod) -> DetectionConfig {
    DetectionConfig {
        probability_threshold: 0.5,
        stopping_criterion: 0.1,
        template_radii: vec![3.0],
        dilation_size: 2.0,
        max_cells: 10,
        correlation: method,
    }
}

/// Chebyshev distance between two voxel coordinates.
pub fn chebyshev(a: (usize, usize, usize), b: (usize, usize, usize)) -> usize {
    let d = |x: usize, y: usize| x.abs_diff(y);
    d(a.0, b.0).max(d(a.1, b.1)).max(d(a.2, b.2))
}
