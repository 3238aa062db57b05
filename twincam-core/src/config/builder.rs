// ============================================================================
// twincam-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for PipelineConfig
//
// Fluent construction of `PipelineConfig` with defaults for every optional
// field. `build()` runs the same validation as `PipelineConfig::validate`.

// ---- Standard library imports ----
use std::path::PathBuf;

// ---- Internal crate imports ----
use super::{IntermediateEncoding, PipelineConfig, PipelineMode, Preset};
use crate::error::CoreResult;

/// Builder for creating PipelineConfig instances.
///
/// # Examples
///
/// ```rust
/// use twincam_core::config::{PipelineConfigBuilder, Preset};
///
/// let config = PipelineConfigBuilder::new()
///     .output_dir("/srv/twincam")
///     .preset(Preset::Fast)
///     .build()
///     .unwrap();
/// assert_eq!(config.preset, Preset::Fast);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Creates a new builder holding the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing configuration, e.g. one loaded from a file.
    pub fn from_config(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Sets the root directory for job work areas.
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    /// Sets the CRF used by the final compression.
    pub fn crf(mut self, crf: u8) -> Self {
        self.config.crf = crf;
        self
    }

    /// Sets the encoder preset used by the final compression.
    pub fn preset(mut self, preset: Preset) -> Self {
        self.config.preset = preset;
        self
    }

    /// Limits the output width.
    pub fn max_width(mut self, width: u32) -> Self {
        self.config.max_width = Some(width);
        self
    }

    /// Keeps the source width.
    pub fn no_max_width(mut self) -> Self {
        self.config.max_width = None;
        self
    }

    /// Sets the audio bitrate token used by the final compression.
    pub fn audio_bitrate(mut self, bitrate: impl Into<String>) -> Self {
        self.config.audio_bitrate = bitrate.into();
        self
    }

    /// Selects the pipeline topology.
    pub fn mode(mut self, mode: PipelineMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Sets the duration mismatch tolerated before padding.
    pub fn pad_tolerance_secs(mut self, secs: f64) -> Self {
        self.config.pad_tolerance_secs = secs;
        self
    }

    /// Replaces the intermediate encoding settings.
    pub fn intermediate(mut self, intermediate: IntermediateEncoding) -> Self {
        self.config.intermediate = intermediate;
        self
    }

    /// Validates and returns the configuration.
    pub fn build(self) -> CoreResult<PipelineConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
