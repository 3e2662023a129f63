use anyhow::{Context, Result};
use clap::Args;
use somata_core::detect::DetectionConfig;
use somata_core::template::TemplateLibrary;

use super::parse_list;
use crate::summary::print_template_libraries;

#[derive(Args)]
pub struct TemplatesArgs {
    /// Comma-separated template sizes
    #[arg(long, default_value = "18")]
    pub radii: String,

    /// Suppression growth over each template size
    #[arg(long, default_value = "8")]
    pub dilation: f32,
}

pub fn run(args: &TemplatesArgs) -> Result<()> {
    let config = DetectionConfig {
        template_radii: parse_list(&args.radii)?,
        dilation_size: args.dilation,
        ..Default::default()
    };
    config.validate()?;

    let box_radius = config.box_radius();
    let detect = TemplateLibrary::build(&config.template_radii, box_radius)
        .context("Failed to build detection templates")?;
    let suppress = TemplateLibrary::build(&config.suppression_radii(), box_radius)
        .context("Failed to build suppression templates")?;

    print_template_libraries(&detect, &suppress);
    Ok(())
}
