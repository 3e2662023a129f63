use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use somata_core::io::{load_volume, volume_stats};

use super::volume_format;

#[derive(Args)]
pub struct InfoArgs {
    /// Input volume (raw file or slice directory)
    pub input: PathBuf,

    /// Shape of a raw volume as ROWS,COLS,SLICES
    #[arg(long)]
    pub shape: Option<String>,

    /// Count voxels at or above this probability
    #[arg(long, default_value = "0.5")]
    pub threshold: f32,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let format = volume_format(args.shape.as_deref())?;
    let volume = load_volume(&args.input, &format)
        .with_context(|| format!("Failed to read volume {}", args.input.display()))?;
    let stats = volume_stats(&volume, args.threshold);
    let (r, c, z) = stats.shape;
    let total = volume.len();

    println!("Input:       {}", args.input.display());
    println!("Format:      {}", format);
    println!("Shape:       {}x{}x{}", r, c, z);
    println!("Voxels:      {}", total);
    println!("Range:       {:.4} .. {:.4}", stats.min, stats.max);
    println!("Mean:        {:.4}", stats.mean);
    println!(
        "Above {:.2}:  {} ({:.2}%)",
        args.threshold,
        stats.above_threshold,
        100.0 * stats.above_threshold as f64 / total.max(1) as f64
    );

    Ok(())
}
