use ndarray::Array3;

/// Integer offset `(dr, dc, dz)` of a structuring element voxel.
pub type Offset = (isize, isize, isize);

/// Ball structuring element of the given (possibly fractional) radius.
///
/// Contains every integer offset with `dr² + dc² + dz² <= radius²`. A radius
/// of zero or less collapses to the single center offset.
pub fn ball(radius: f64) -> Vec<Offset> {
    if radius <= 0.0 {
        return vec![(0, 0, 0)];
    }
    let extent = radius.floor() as isize;
    let r2 = radius * radius;
    let mut offsets = Vec::new();
    for dr in -extent..=extent {
        for dc in -extent..=extent {
            for dz in -extent..=extent {
                let d2 = (dr * dr + dc * dc + dz * dz) as f64;
                if d2 <= r2 {
                    offsets.push((dr, dc, dz));
                }
            }
        }
    }
    offsets
}

/// Binary dilation: a voxel becomes true if ANY voxel under the (symmetric)
/// structuring element centered on it is true. Out-of-bounds voxels count as false.
pub fn dilate(mask: &Array3<bool>, element: &[Offset]) -> Array3<bool> {
    let (d0, d1, d2) = mask.dim();
    let mut result = Array3::from_elem((d0, d1, d2), false);

    for ((r, c, z), &set) in mask.indexed_iter() {
        if !set {
            continue;
        }
        for &(dr, dc, dz) in element {
            let nr = r as isize + dr;
            let nc = c as isize + dc;
            let nz = z as isize + dz;
            if nr >= 0
                && nr < d0 as isize
                && nc >= 0
                && nc < d1 as isize
                && nz >= 0
                && nz < d2 as isize
            {
                result[[nr as usize, nc as usize, nz as usize]] = true;
            }
        }
    }

    result
}
