// twincam-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use twincam_core::config::{DEFAULT_PAD_TOLERANCE_SECS, MAX_CRF};
use twincam_core::{PipelineMode, Preset};

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "Twincam: side-by-side video from two cameras",
    long_about = "Combines the recordings of two cameras into one side-by-side video using ffmpeg via twincam-core."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Runs one job: combine both cameras and compress the result
    Run(RunArgs),
    /// Prints the duration of two files and whether the shorter would be padded
    Probe(ProbeArgs),
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Camera A files, in playback order
    #[arg(short = 'a', long = "camera-a", required = true, num_args = 1.., value_name = "FILE")]
    pub camera_a: Vec<PathBuf>,

    /// Camera B files, in playback order
    #[arg(short = 'b', long = "camera-b", required = true, num_args = 1.., value_name = "FILE")]
    pub camera_b: Vec<PathBuf>,

    /// Pipeline topology (pairwise or concatenate-first)
    #[arg(short, long, value_name = "MODE")]
    pub mode: Option<PipelineMode>,

    /// CRF for the final compression (0-51, lower is better quality)
    #[arg(long, value_name = "CRF", value_parser = clap::value_parser!(u8).range(0..=MAX_CRF as i64))]
    pub crf: Option<u8>,

    /// x264 preset for the final compression (ultrafast ... veryslow)
    #[arg(long, value_name = "PRESET")]
    pub preset: Option<Preset>,

    /// Scale the output down to at most this width
    #[arg(long, value_name = "PIXELS")]
    pub max_width: Option<u32>,

    /// Audio bitrate for the final compression (e.g. 96k)
    #[arg(long, value_name = "BITRATE")]
    pub audio_bitrate: Option<String>,

    /// Duration difference in seconds tolerated before padding (concatenate-first)
    #[arg(long, value_name = "SECONDS")]
    pub pad_tolerance: Option<f64>,

    /// JSON file with pipeline settings; flags given here take precedence
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory that receives one work directory per job
    #[arg(short = 'o', long, value_name = "DIR", required_unless_present = "config")]
    pub output_dir: Option<PathBuf>,

    /// Write a run log file into this directory
    #[arg(short, long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// ntfy.sh topic URL for notifications (e.g., https://ntfy.sh/your_topic).
    /// Can also be set via the TWINCAM_NTFY_TOPIC environment variable.
    #[arg(long, value_name = "TOPIC_URL", env = "TWINCAM_NTFY_TOPIC")]
    pub ntfy: Option<String>,

    /// Print the final job record as JSON
    #[arg(long)]
    pub json: bool,

    /// Block until the job finishes instead of drawing a progress bar
    #[arg(long)]
    pub no_progress: bool,
}

#[derive(Parser, Debug)]
pub struct ProbeArgs {
    /// Camera A recording
    #[arg(value_name = "CAMERA_A")]
    pub camera_a: PathBuf,

    /// Camera B recording
    #[arg(value_name = "CAMERA_B")]
    pub camera_b: PathBuf,

    /// Duration difference in seconds tolerated before padding
    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_PAD_TOLERANCE_SECS)]
    pub tolerance: f64,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}
