//! Implementation of the 'probe' subcommand.
//!
//! Looks up the duration of one recording per camera and reports whether a
//! concatenate-first job would pad the shorter one.

use crate::cli::ProbeArgs;
use crate::error::CliResult;

use owo_colors::OwoColorize;
use serde_json::json;
use std::path::Path;
use twincam_core::{
    CoreError, CrateFfprobeExecutor, DurationProbe, PaddingDecision, check_dependency,
    format_duration, should_pad,
};

/// Durations of both recordings and the resulting padding decision.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReport {
    pub camera_a: f64,
    pub camera_b: f64,
    pub decision: PaddingDecision,
}

impl ProbeReport {
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "camera_a_secs": self.camera_a,
            "camera_b_secs": self.camera_b,
            "pad": self.decision.pad,
            "pad_target": self.decision.target.map(|c| c.to_string()),
            "pad_secs": self.decision.amount,
        })
    }
}

pub fn probe_pair<P: DurationProbe>(
    probe: &P,
    camera_a: &Path,
    camera_b: &Path,
    tolerance: f64,
) -> CliResult<ProbeReport> {
    if !(tolerance.is_finite() && tolerance >= 0.0) {
        return Err(CoreError::InputValidation(format!(
            "tolerance must be a non-negative number, got {tolerance}"
        )));
    }
    let a = probe.duration(camera_a)?;
    let b = probe.duration(camera_b)?;
    Ok(ProbeReport {
        camera_a: a,
        camera_b: b,
        decision: should_pad(a, b, tolerance),
    })
}

pub fn run_probe(args: ProbeArgs) -> CliResult<()> {
    check_dependency("ffprobe")?;
    let report = probe_pair(
        &CrateFfprobeExecutor::new(),
        &args.camera_a,
        &args.camera_b,
        args.tolerance,
    )?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report.to_json())?);
        return Ok(());
    }

    println!(
        "{} {:.3}s ({})  {}",
        "Camera A:".bold(),
        report.camera_a,
        format_duration(report.camera_a),
        args.camera_a.display()
    );
    println!(
        "{} {:.3}s ({})  {}",
        "Camera B:".bold(),
        report.camera_b,
        format_duration(report.camera_b),
        args.camera_b.display()
    );
    match report.decision.target {
        Some(camera) if report.decision.pad => println!(
            "{} camera {camera} by {:.3}s",
            "Pad:".bold().yellow(),
            report.decision.amount
        ),
        _ => println!(
            "{} within {:.1}s tolerance",
            "No padding:".bold().green(),
            args.tolerance
        ),
    }
    Ok(())
}
