use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use memmap2::Mmap;
use ndarray::Array3;

use crate::error::{Result, SomataError};
use crate::geometry::{voxel_count, Shape3};

/// Bytes per stored voxel (`f32` or `u32`).
const VOXEL_BYTES: usize = 4;

/// Memory-map a headerless little-endian raw file and check its size.
fn map_raw(path: &Path, shape: Shape3) -> Result<Mmap> {
    let n = voxel_count(shape);
    if n == 0 {
        return Err(SomataError::InvalidVolumeFile(format!(
            "raw volume shape has an empty axis: {shape:?}"
        )));
    }
    let file = File::open(path)?;
    let mmap = unsafe { Mmap::map(&file)? };

    let expected = n * VOXEL_BYTES;
    if mmap.len() != expected {
        return Err(SomataError::InvalidVolumeFile(format!(
            "{}: expected {} bytes for shape {:?}, got {}",
            path.display(),
            expected,
            shape,
            mmap.len()
        )));
    }
    Ok(mmap)
}

/// Read a raw `f32` volume stored row-major (z fastest), little-endian.
pub fn read_raw_volume(path: &Path, shape: Shape3) -> Result<Array3<f32>> {
    let mmap = map_raw(path, shape)?;
    let mut data = vec![0.0_f32; voxel_count(shape)];
    (&mmap[..]).read_f32_into::<LittleEndian>(&mut data)?;
    Array3::from_shape_vec(shape, data)
        .map_err(|e| SomataError::InvalidVolumeFile(format!("{}: {e}", path.display())))
}

/// Read a raw `u32` label volume stored row-major, little-endian.
pub fn read_raw_labels(path: &Path, shape: Shape3) -> Result<Array3<u32>> {
    let mmap = map_raw(path, shape)?;
    let mut data = vec![0_u32; voxel_count(shape)];
    (&mmap[..]).read_u32_into::<LittleEndian>(&mut data)?;
    Array3::from_shape_vec(shape, data)
        .map_err(|e| SomataError::InvalidVolumeFile(format!("{}: {e}", path.display())))
}

/// Write an `f32` volume as headerless little-endian row-major data.
pub fn write_raw_volume(volume: &Array3<f32>, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for &v in volume.iter() {
        writer.write_f32::<LittleEndian>(v)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write a label volume as headerless little-endian `u32` row-major data.
pub fn write_raw_labels(labels: &Array3<u32>, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for &v in labels.iter() {
        writer.write_u32::<LittleEndian>(v)?;
    }
    writer.flush()?;
    Ok(())
}
