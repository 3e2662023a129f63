pub mod config;
pub mod detect;
pub mod info;
pub mod templates;

use anyhow::{bail, Context, Result};
use somata_core::io::VolumeFormat;

/// Parse a comma-separated list such as `12,18`.
pub fn parse_list<T>(text: &str) -> Result<Vec<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    text.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<T>().with_context(|| format!("Invalid value '{s}'")))
        .collect()
}

/// Raw shape from `--shape R,C,Z`, or auto-detection when absent.
pub fn volume_format(shape: Option<&str>) -> Result<VolumeFormat> {
    let Some(text) = shape else {
        return Ok(VolumeFormat::Auto);
    };
    let dims: Vec<usize> = parse_list(text)?;
    if dims.len() != 3 {
        bail!("--shape needs three comma-separated sizes, got '{text}'");
    }
    Ok(VolumeFormat::Raw {
        shape: [dims[0], dims[1], dims[2]],
    })
}
