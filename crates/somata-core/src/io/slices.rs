use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageBuffer, Luma};
use ndarray::{Array3, Axis};

use crate::consts::MAX_SLICE_LABEL;
use crate::error::{Result, SomataError};

const SLICE_EXTENSIONS: [&str; 3] = ["tif", "tiff", "png"];

/// Image files in `dir` that look like volume slices, sorted by file name.
pub fn list_slices(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| SLICE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
        })
        .collect();
    paths.sort();
    Ok(paths)
}

/// Load a directory of grayscale slices into a `(rows, cols, slices)` volume.
///
/// Each image becomes one z-plane; pixel values are scaled to `[0, 1]`.
pub fn load_slice_stack(dir: &Path) -> Result<Array3<f32>> {
    let paths = list_slices(dir)?;
    if paths.is_empty() {
        return Err(SomataError::InvalidVolumeFile(format!(
            "no image slices found in {}",
            dir.display()
        )));
    }

    let mut volume: Option<Array3<f32>> = None;
    for (z, path) in paths.iter().enumerate() {
        let gray = image::open(path)?.to_luma16();
        let (w, h) = gray.dimensions();
        let vol = volume.get_or_insert_with(|| {
            Array3::<f32>::zeros((h as usize, w as usize, paths.len()))
        });
        let (rows, cols, _) = vol.dim();
        if rows != h as usize || cols != w as usize {
            return Err(SomataError::InvalidVolumeFile(format!(
                "slice {} is {}x{}, expected {}x{}",
                path.display(),
                w,
                h,
                cols,
                rows
            )));
        }
        let mut plane = vol.index_axis_mut(Axis(2), z);
        for (x, y, pixel) in gray.enumerate_pixels() {
            plane[[y as usize, x as usize]] = pixel.0[0] as f32 / 65535.0;
        }
    }

    volume.ok_or_else(|| SomataError::InvalidVolumeFile("empty slice stack".into()))
}

/// Save a label volume as one 16-bit grayscale TIFF per z-plane.
///
/// Files are named `slice_0000.tiff`, `slice_0001.tiff`, ... so that
/// [`load_slice_stack`] reads them back in order.
pub fn save_label_slices(labels: &Array3<u32>, dir: &Path) -> Result<Vec<PathBuf>> {
    if let Some(&max) = labels.iter().max() {
        if max > MAX_SLICE_LABEL {
            return Err(SomataError::InvalidInput(format!(
                "label id {max} does not fit a 16-bit slice"
            )));
        }
    }
    fs::create_dir_all(dir)?;

    let (rows, cols, slices) = labels.dim();
    let mut written = Vec::with_capacity(slices);
    for z in 0..slices {
        let plane = labels.index_axis(Axis(2), z);
        let mut pixels: Vec<u16> = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                pixels.push(plane[[row, col]] as u16);
            }
        }
        let img = ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(cols as u32, rows as u32, pixels)
            .ok_or_else(|| SomataError::Pipeline("slice buffer size mismatch".into()))?;
        let path = dir.join(format!("slice_{z:04}.tiff"));
        img.save(&path)?;
        written.push(path);
    }
    Ok(written)
}
