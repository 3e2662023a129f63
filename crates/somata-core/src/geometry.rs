//! Flat-index and cube reshaping helpers.
//!
//! Every flatten/reshape in the crate goes through these functions and uses
//! row-major (C) order: the last axis (`z`) varies fastest, so
//! `flat = (r * nc + c) * nz + z`.

use ndarray::{Array3, ArrayView3};

use crate::error::{Result, SomataError};

/// Volume shape as `(rows, cols, slices)`.
pub type Shape3 = (usize, usize, usize);

/// Total number of voxels in a volume of the given shape.
pub fn voxel_count(shape: Shape3) -> usize {
    shape.0 * shape.1 * shape.2
}

/// Convert a row-major flat index into `(r, c, z)`.
///
/// Callers must ensure `flat < voxel_count(shape)`.
pub fn unravel_index(flat: usize, shape: Shape3) -> (usize, usize, usize) {
    let (_, nc, nz) = shape;
    let z = flat % nz;
    let c = (flat / nz) % nc;
    let r = flat / (nz * nc);
    (r, c, z)
}

/// Convert `(r, c, z)` into a row-major flat index.
pub fn ravel_index(r: usize, c: usize, z: usize, shape: Shape3) -> usize {
    let (_, nc, nz) = shape;
    (r * nc + c) * nz + z
}

/// View a flattened template vector as a `box_length`³ cube.
pub fn cube_view(vector: &[f32], box_length: usize) -> Result<ArrayView3<'_, f32>> {
    let expected = box_length * box_length * box_length;
    if vector.len() != expected {
        return Err(SomataError::InvalidInput(format!(
            "template vector has {} elements, expected {}^3 = {}",
            vector.len(),
            box_length,
            expected
        )));
    }
    ArrayView3::from_shape((box_length, box_length, box_length), vector)
        .map_err(|e| SomataError::InvalidInput(format!("cannot reshape template: {e}")))
}

/// Flatten a volume in row-major order regardless of its memory layout.
pub fn flatten(volume: &Array3<f32>) -> Vec<f32> {
    volume.iter().copied().collect()
}

/// Reject empty volumes and volumes holding non-finite values.
pub fn validate_volume(volume: &Array3<f32>) -> Result<()> {
    let (nr, nc, nz) = volume.dim();
    if nr == 0 || nc == 0 || nz == 0 {
        return Err(SomataError::InvalidInput(format!(
            "volume has an empty axis: {nr}x{nc}x{nz}"
        )));
    }
    if let Some(pos) = volume.iter().position(|v| !v.is_finite()) {
        let (r, c, z) = unravel_index(pos, (nr, nc, nz));
        return Err(SomataError::InvalidInput(format!(
            "volume contains a non-finite value at ({r}, {c}, {z})"
        )));
    }
    Ok(())
}
