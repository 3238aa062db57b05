//! Configuration structures and constants for the twincam-core library.
//!
//! A [`PipelineConfig`] carries the caller's choices for a single job: output
//! quality, encoder preset, optional width limit, audio bitrate and the
//! pipeline topology. The [`IntermediateEncoding`] settings are shared by every
//! re-encoding intermediate stage so that pair outputs stay homogeneous.

mod builder;

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub use builder::PipelineConfigBuilder;

// Default constants

/// Default CRF for the final compression stage.
/// Lower values produce higher quality but larger files. Range: 0-51.
pub const DEFAULT_CRF: u8 = 23;

/// Highest CRF accepted by libx264.
pub const MAX_CRF: u8 = 51;

/// Default audio bitrate for the final compression stage.
pub const DEFAULT_AUDIO_BITRATE: &str = "96k";

/// Maximum duration mismatch (seconds) between the two cameras before the
/// shorter one is padded.
pub const DEFAULT_PAD_TOLERANCE_SECS: f64 = 5.0;

/// Frame rate every intermediate is normalized to.
pub const DEFAULT_INTERMEDIATE_FRAME_RATE: u32 = 30;

/// Named encoder speed/compression tradeoffs, fastest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Ultrafast,
    Superfast,
    Veryfast,
    Faster,
    Fast,
    #[default]
    Medium,
    Slow,
    Slower,
    Veryslow,
}

impl Preset {
    /// All presets, ordered from fastest/largest to slowest/smallest.
    pub const ALL: [Preset; 9] = [
        Preset::Ultrafast,
        Preset::Superfast,
        Preset::Veryfast,
        Preset::Faster,
        Preset::Fast,
        Preset::Medium,
        Preset::Slow,
        Preset::Slower,
        Preset::Veryslow,
    ];

    /// The token passed to the encoder's `-preset` option.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Preset::Ultrafast => "ultrafast",
            Preset::Superfast => "superfast",
            Preset::Veryfast => "veryfast",
            Preset::Faster => "faster",
            Preset::Fast => "fast",
            Preset::Medium => "medium",
            Preset::Slow => "slow",
            Preset::Slower => "slower",
            Preset::Veryslow => "veryslow",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preset {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Preset::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| {
                CoreError::InvalidConfig(format!(
                    "Unknown preset '{s}' (expected one of: {})",
                    Preset::ALL.map(Preset::as_str).join(", ")
                ))
            })
    }
}

/// Pipeline topology chosen for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineMode {
    /// Combine segment i of camera A with segment i of camera B, then join the pairs.
    #[default]
    Pairwise,
    /// Join each camera's segments first, then combine the two long recordings.
    ConcatenateFirst,
}

impl PipelineMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineMode::Pairwise => "pairwise",
            PipelineMode::ConcatenateFirst => "concatenate-first",
        }
    }
}

impl fmt::Display for PipelineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineMode {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "pairwise" => Ok(PipelineMode::Pairwise),
            "concatenate-first" | "concat-first" => Ok(PipelineMode::ConcatenateFirst),
            other => Err(CoreError::InvalidConfig(format!(
                "Unknown pipeline mode '{other}' (expected 'pairwise' or 'concatenate-first')"
            ))),
        }
    }
}

/// Encoder settings shared by the Combine, re-encoding Concatenate and Pad
/// stages. Every intermediate must come out with identical codec parameters
/// and a constant frame rate, otherwise the stream-copy join of pairs breaks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntermediateEncoding {
    pub video_codec: String,
    pub preset: Preset,
    pub crf: u8,
    pub pixel_format: String,
    pub frame_rate: u32,
    pub audio_codec: String,
    pub audio_bitrate: String,
    pub audio_sample_rate: u32,
}

impl Default for IntermediateEncoding {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            preset: Preset::Veryfast,
            crf: 18,
            pixel_format: "yuv420p".to_string(),
            frame_rate: DEFAULT_INTERMEDIATE_FRAME_RATE,
            audio_codec: "aac".to_string(),
            audio_bitrate: "192k".to_string(),
            audio_sample_rate: 48_000,
        }
    }
}

/// Main configuration structure for a twincam job.
///
/// Created by the caller (e.g. twincam-cli) and handed to
/// [`JobManager::create_job`](crate::jobs::JobManager::create_job) together
/// with the two ordered camera streams.
///
/// # Examples
///
/// ```rust
/// use twincam_core::config::{PipelineConfigBuilder, PipelineMode, Preset};
///
/// let config = PipelineConfigBuilder::new()
///     .output_dir("/tmp/twincam")
///     .crf(26)
///     .preset(Preset::Slow)
///     .max_width(1920)
///     .audio_bitrate("128k")
///     .mode(PipelineMode::ConcatenateFirst)
///     .build()
///     .unwrap();
/// assert_eq!(config.crf, 26);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Quality factor for the final compression (lower = better/larger)
    pub crf: u8,

    /// Encoder preset for the final compression
    pub preset: Preset,

    /// Optional width limit; `None` keeps the source width
    pub max_width: Option<u32>,

    /// Audio bitrate token for the final compression (e.g. "96k")
    pub audio_bitrate: String,

    /// Pipeline topology
    pub mode: PipelineMode,

    /// Root under which each job gets its own work directory
    pub output_dir: PathBuf,

    /// Duration mismatch (seconds) tolerated before padding the shorter camera
    pub pad_tolerance_secs: f64,

    /// Settings for every re-encoding intermediate stage
    pub intermediate: IntermediateEncoding,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            crf: DEFAULT_CRF,
            preset: Preset::default(),
            max_width: None,
            audio_bitrate: DEFAULT_AUDIO_BITRATE.to_string(),
            mode: PipelineMode::default(),
            output_dir: PathBuf::from("output"),
            pad_tolerance_secs: DEFAULT_PAD_TOLERANCE_SECS,
            intermediate: IntermediateEncoding::default(),
        }
    }
}

impl PipelineConfig {
    /// Creates a configuration with defaults, writing into `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    /// Loads a configuration from a JSON document. Missing fields take defaults.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        let config: PipelineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> CoreResult<()> {
        if self.crf > MAX_CRF {
            return Err(CoreError::InvalidConfig(format!(
                "crf must be between 0 and {MAX_CRF}, got {}",
                self.crf
            )));
        }

        if let Some(width) = self.max_width {
            if width == 0 {
                return Err(CoreError::InvalidConfig(
                    "max_width must be a positive number of pixels".to_string(),
                ));
            }
        }

        if !is_bitrate_token(&self.audio_bitrate) {
            return Err(CoreError::InvalidConfig(format!(
                "audio_bitrate '{}' is not a bitrate (e.g. 96k)",
                self.audio_bitrate
            )));
        }

        if !is_bitrate_token(&self.intermediate.audio_bitrate) {
            return Err(CoreError::InvalidConfig(format!(
                "intermediate audio_bitrate '{}' is not a bitrate",
                self.intermediate.audio_bitrate
            )));
        }

        if self.intermediate.frame_rate == 0 || self.intermediate.audio_sample_rate == 0 {
            return Err(CoreError::InvalidConfig(
                "intermediate frame_rate and audio_sample_rate must be positive".to_string(),
            ));
        }

        if !(self.pad_tolerance_secs.is_finite() && self.pad_tolerance_secs >= 0.0) {
            return Err(CoreError::InvalidConfig(format!(
                "pad_tolerance_secs must be a non-negative number, got {}",
                self.pad_tolerance_secs
            )));
        }

        if self.output_dir.as_os_str().is_empty() {
            return Err(CoreError::InvalidConfig(
                "output_dir must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Accepts tokens like "96k", "128K", "1M" or a bare number of bits per second.
fn is_bitrate_token(token: &str) -> bool {
    let digits = token
        .strip_suffix(['k', 'K', 'm', 'M'])
        .unwrap_or(token);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) && digits != "0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::new("/tmp/out");
        assert!(config.validate().is_ok());
        assert_eq!(config.crf, DEFAULT_CRF);
        assert_eq!(config.preset, Preset::Medium);
        assert_eq!(config.audio_bitrate, "96k");
        assert_eq!(config.mode, PipelineMode::Pairwise);
        assert_eq!(config.max_width, None);
    }

    #[test]
    fn test_preset_parsing() {
        assert_eq!("veryslow".parse::<Preset>().unwrap(), Preset::Veryslow);
        assert_eq!(" Fast ".parse::<Preset>().unwrap(), Preset::Fast);
        assert!("placebo".parse::<Preset>().is_err());
        assert_eq!(Preset::ALL.len(), 9);
        assert!(Preset::Ultrafast < Preset::Veryslow);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("pairwise".parse::<PipelineMode>().unwrap(), PipelineMode::Pairwise);
        assert_eq!(
            "concatenate_first".parse::<PipelineMode>().unwrap(),
            PipelineMode::ConcatenateFirst
        );
        assert!("sideways".parse::<PipelineMode>().is_err());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = PipelineConfig::new("/tmp/out");
        config.crf = 60;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::new("/tmp/out");
        config.max_width = Some(0);
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::new("/tmp/out");
        config.audio_bitrate = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::new("/tmp/out");
        config.pad_tolerance_secs = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bitrate_tokens() {
        assert!(is_bitrate_token("96k"));
        assert!(is_bitrate_token("1M"));
        assert!(is_bitrate_token("128000"));
        assert!(!is_bitrate_token("k"));
        assert!(!is_bitrate_token("0"));
        assert!(!is_bitrate_token("9 6k"));
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = PipelineConfig::from_json(
            r#"{"crf": 28, "preset": "slower", "mode": "concatenate-first", "output_dir": "/srv/out"}"#,
        )
        .unwrap();
        assert_eq!(config.crf, 28);
        assert_eq!(config.preset, Preset::Slower);
        assert_eq!(config.mode, PipelineMode::ConcatenateFirst);
        assert_eq!(config.audio_bitrate, DEFAULT_AUDIO_BITRATE);
        assert_eq!(config.intermediate, IntermediateEncoding::default());
    }

    #[test]
    fn test_from_json_rejects_unknown_preset() {
        let result = PipelineConfig::from_json(r#"{"preset": "placebo"}"#);
        assert!(matches!(result, Err(CoreError::JsonParse(_))));
    }
}
