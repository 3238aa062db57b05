// twincam-cli/src/config.rs
//
// Builds the core `PipelineConfig` for a run from an optional JSON file and
// the command-line flags. Flags win over file values.

use crate::cli::RunArgs;
use crate::error::{CliErrorContext, CliResult};
use std::fs;
use std::path::Path;
use twincam_core::{PipelineConfig, PipelineConfigBuilder};

/// Reads a JSON config file without validating it; validation happens once
/// all flag overrides are applied.
pub fn load_config_file(path: &Path) -> CliResult<PipelineConfig> {
    let text = fs::read_to_string(path)
        .cli_with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    serde_json::from_str(&text)
        .cli_with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

pub fn build_pipeline_config(args: &RunArgs) -> CliResult<PipelineConfig> {
    let base = match &args.config {
        Some(path) => load_config_file(path)?,
        None => PipelineConfig::default(),
    };

    let mut builder = PipelineConfigBuilder::from_config(base);
    if let Some(dir) = &args.output_dir {
        builder = builder.output_dir(dir);
    }
    if let Some(mode) = args.mode {
        builder = builder.mode(mode);
    }
    if let Some(crf) = args.crf {
        builder = builder.crf(crf);
    }
    if let Some(preset) = args.preset {
        builder = builder.preset(preset);
    }
    if let Some(width) = args.max_width {
        builder = builder.max_width(width);
    }
    if let Some(bitrate) = &args.audio_bitrate {
        builder = builder.audio_bitrate(bitrate.clone());
    }
    if let Some(tolerance) = args.pad_tolerance {
        builder = builder.pad_tolerance_secs(tolerance);
    }
    builder.build()
}
