use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use somata_core::classify::PrecomputedProbabilities;
use somata_core::correlate::CorrelationMethod;
use somata_core::detect::{CancelToken, DetectionConfig};
use somata_core::pipeline::{
    run_pipeline_reported, PipelineConfig, PipelineStage, ProgressReporter,
};
use tracing::{info, warn};

use super::{parse_list, volume_format};
use crate::summary::{print_detection_result, print_detection_summary};

#[derive(Clone, ValueEnum)]
pub enum MethodArg {
    Auto,
    Direct,
    Fft,
}

impl From<&MethodArg> for CorrelationMethod {
    fn from(arg: &MethodArg) -> Self {
        match arg {
            MethodArg::Auto => CorrelationMethod::Auto,
            MethodArg::Direct => CorrelationMethod::Direct,
            MethodArg::Fft => CorrelationMethod::Fft,
        }
    }
}

#[derive(Args)]
pub struct DetectArgs {
    /// Input probability volume (raw file or slice directory)
    #[arg(required_unless_present = "config")]
    pub input: Option<PathBuf>,

    /// Pipeline config file (TOML); overrides all other options
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Shape of a raw volume as ROWS,COLS,SLICES
    #[arg(long)]
    pub shape: Option<String>,

    /// Comma-separated template sizes
    #[arg(long, default_value = "18")]
    pub radii: String,

    /// Suppression growth over each template size
    #[arg(long, default_value = "8")]
    pub dilation: f32,

    /// Probability threshold applied before the search
    #[arg(long, default_value = "0.2")]
    pub threshold: f32,

    /// Minimum normalized correlation to accept a detection
    #[arg(long, default_value = "0.47")]
    pub stop: f64,

    /// Maximum number of detections
    #[arg(long, default_value = "500")]
    pub max_cells: usize,

    /// Correlation kernel
    #[arg(long, value_enum, default_value = "auto")]
    pub method: MethodArg,

    /// Also write labels as 16-bit TIFF slices
    #[arg(long)]
    pub label_slices: bool,

    /// Stop the search after this many seconds, keeping what was found
    #[arg(long)]
    pub time_limit: Option<u64>,

    /// Output directory
    #[arg(short, long, default_value = "detections")]
    pub output: PathBuf,
}

/// Drives an indicatif bar from pipeline stage events.
struct BarReporter {
    bar: ProgressBar,
}

impl ProgressReporter for BarReporter {
    fn begin_stage(&self, stage: PipelineStage, total_items: Option<usize>) {
        self.bar.set_message(stage.to_string());
        self.bar.set_position(0);
        self.bar.set_length(total_items.unwrap_or(1) as u64);
    }

    fn advance(&self, items_done: usize) {
        self.bar.set_position(items_done as u64);
    }

    fn finish_stage(&self) {
        if let Some(len) = self.bar.length() {
            self.bar.set_position(len);
        }
    }
}

pub fn run(args: &DetectArgs) -> Result<()> {
    let config = if let Some(ref config_path) = args.config {
        if let Some(ref input) = args.input {
            warn!(
                input = %input.display(),
                "Input path ignored; the config file names the input"
            );
        }
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        toml::from_str(&contents).context("Invalid pipeline config")?
    } else {
        build_config_from_args(args)?
    };

    print_detection_summary(&config);

    let cancel = CancelToken::new();
    if let Some(secs) = args.time_limit {
        info!(seconds = secs, "Search time limit set");
        let token = cancel.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_secs(secs));
            token.cancel();
        });
    }

    let bar = ProgressBar::new(1);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{msg:20} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );
    let reporter = Arc::new(BarReporter { bar: bar.clone() });

    let output = run_pipeline_reported(&config, &PrecomputedProbabilities, reporter, &cancel)
        .context("Cell detection failed")?;
    bar.finish_with_message("Done");

    print_detection_result(&output);
    Ok(())
}

fn build_config_from_args(args: &DetectArgs) -> Result<PipelineConfig> {
    let input = args
        .input
        .clone()
        .context("An input volume is required without --config")?;
    Ok(PipelineConfig {
        input,
        output: args.output.clone(),
        label_slices: args.label_slices,
        input_format: volume_format(args.shape.as_deref())?,
        detection: DetectionConfig {
            probability_threshold: args.threshold,
            stopping_criterion: args.stop,
            template_radii: parse_list(&args.radii)?,
            dilation_size: args.dilation,
            max_cells: args.max_cells,
            correlation: (&args.method).into(),
        },
    })
}
