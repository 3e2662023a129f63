use ndarray::{s, Array3};

use crate::error::{Result, SomataError};
use crate::geometry::{cube_view, unravel_index, voxel_count, Shape3};

/// Place a flattened `box_length`³ template into a zero volume of `shape`,
/// centered on the voxel at `flat_location`.
///
/// Equivalent to padding the output by `box_length` on every side, writing
/// the whole cube, and cropping the padding off again: cube voxels falling
/// outside `shape` are dropped, never wrapped. Values are copied unchanged.
pub fn place_template(
    vector: &[f32],
    box_length: usize,
    flat_location: usize,
    shape: Shape3,
) -> Result<Array3<f32>> {
    if box_length % 2 == 0 {
        return Err(SomataError::InvalidInput(format!(
            "template box length must be odd, got {box_length}"
        )));
    }
    let total = voxel_count(shape);
    if flat_location >= total {
        return Err(SomataError::InvalidInput(format!(
            "location {flat_location} outside volume of {total} voxels"
        )));
    }
    let cube = cube_view(vector, box_length)?;
    let center = unravel_index(flat_location, shape);
    let half = box_length / 2;

    let (r0, r1, tr0) = clip_axis(center.0, half, box_length, shape.0);
    let (c0, c1, tc0) = clip_axis(center.1, half, box_length, shape.1);
    let (z0, z1, tz0) = clip_axis(center.2, half, box_length, shape.2);

    let mut output = Array3::<f32>::zeros(shape);
    output
        .slice_mut(s![r0..r1, c0..c1, z0..z1])
        .assign(&cube.slice(s![
            tr0..tr0 + (r1 - r0),
            tc0..tc0 + (c1 - c0),
            tz0..tz0 + (z1 - z0)
        ]));
    Ok(output)
}

/// Intersect the cube span `[center - half, center - half + box_length)` with
/// `[0, len)` along one axis.
///
/// Returns `(start, end, cube_offset)` in output coordinates; `cube_offset`
/// is the index inside the cube that lands on `start`.
fn clip_axis(center: usize, half: usize, box_length: usize, len: usize) -> (usize, usize, usize) {
    let start = center.saturating_sub(half);
    let end = (center + box_length - half).min(len);
    let cube_offset = start + half - center;
    (start, end, cube_offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_axis_interior() {
        assert_eq!(clip_axis(5, 1, 3, 10), (4, 7, 0));
    }

    #[test]
    fn test_clip_axis_low_edge() {
        // Center at 0 with half-width 2: cube indices 2..5 land on 0..3.
        assert_eq!(clip_axis(0, 2, 5, 10), (0, 3, 2));
    }

    #[test]
    fn test_clip_axis_high_edge() {
        assert_eq!(clip_axis(9, 2, 5, 10), (7, 10, 0));
    }

    #[test]
    fn test_clip_axis_box_larger_than_volume() {
        assert_eq!(clip_axis(1, 3, 7, 3), (0, 3, 2));
    }
}
