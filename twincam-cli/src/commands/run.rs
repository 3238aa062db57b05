//! Implementation of the 'run' subcommand.
//!
//! Validates the request, starts one job on the core's `JobManager` and
//! follows it until it reaches a terminal state.

use crate::cli::RunArgs;
use crate::config::build_pipeline_config;
use crate::error::{CliErrorContext, CliResult};

use twincam_core::notifications::NtfyNotificationSender;
use twincam_core::{
    CoreError, JobDetails, JobId, JobManager, JobStatus, StreamOrder, check_dependency,
    format_bytes, format_duration,
};

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use owo_colors::OwoColorize;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Every listed input must be an existing regular file.
pub fn check_input_files(streams: &StreamOrder) -> CliResult<()> {
    let all = streams
        .camera_a
        .iter()
        .map(|p| ("A", p))
        .chain(streams.camera_b.iter().map(|p| ("B", p)));
    for (camera, path) in all {
        if !path.is_file() {
            return Err(CoreError::InputValidation(format!(
                "Camera {camera} input '{}' does not exist or is not a file",
                path.display()
            )));
        }
    }
    Ok(())
}

/// Runs one job from the parsed arguments.
pub fn run_job(args: RunArgs) -> CliResult<()> {
    let started = Instant::now();

    // Everything that can be checked without ffmpeg is checked first
    let config = build_pipeline_config(&args)?;
    let streams = StreamOrder::new(args.camera_a.clone(), args.camera_b.clone());
    streams.validate(config.mode)?;
    check_input_files(&streams)?;
    let notifier = args
        .ntfy
        .as_deref()
        .map(NtfyNotificationSender::new)
        .transpose()?;

    fs::create_dir_all(&config.output_dir).cli_with_context(|| {
        format!(
            "Failed to create output directory '{}'",
            config.output_dir.display()
        )
    })?;

    check_dependency("ffmpeg")?;
    check_dependency("ffprobe")?;
    debug!("External dependency check passed");

    let mut manager = JobManager::new();
    if let Some(sender) = notifier {
        info!("Sending notifications to {}", sender.topic_url());
        manager = manager.with_notifier(Arc::new(sender));
    }

    info!(
        "Starting {} job: {} camera A file(s), {} camera B file(s)",
        config.mode,
        streams.camera_a.len(),
        streams.camera_b.len()
    );
    let id = manager.create_job(config, streams)?;
    info!("Job id: {id}");

    if args.no_progress {
        manager.wait(&id)?;
    } else {
        follow_progress(&manager, &id)?;
    }

    let details = manager.get_details(&id)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&details)?);
    } else {
        print_summary(&details, started.elapsed());
    }

    match details.status {
        JobStatus::Done => Ok(()),
        _ => Err(CoreError::OperationFailed(format!(
            "Job {id} failed: {}",
            details.error_message.as_deref().unwrap_or("unknown error")
        ))),
    }
}

/// Polls the job and mirrors its progress in a progress bar until it ends.
fn follow_progress(manager: &JobManager, id: &JobId) -> CliResult<()> {
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos}% ({elapsed})")
        .map_err(|e| CoreError::OperationFailed(format!("Invalid progress template: {e}")))?
        .progress_chars("█▓▒░ ");
    let pb = ProgressBar::new(100);
    pb.set_style(style);
    pb.enable_steady_tick(Duration::from_millis(100));

    loop {
        let details = manager.get_details(id)?;
        pb.set_position(u64::from(details.progress));
        if let Some(stage) = &details.stage {
            pb.set_message(format!(
                "{stage} ({}/{})",
                details.completed_steps.min(details.total_steps),
                details.total_steps
            ));
        }
        if details.status.is_terminal() {
            break;
        }
        thread::sleep(POLL_INTERVAL);
    }

    // Join the worker so a late panic is still recorded
    let snapshot = manager.wait(id)?;
    if snapshot.status == JobStatus::Done {
        pb.finish_with_message("Done");
    } else {
        pb.abandon_with_message("Failed");
    }
    Ok(())
}

fn print_summary(details: &JobDetails, elapsed: Duration) {
    println!();
    match (&details.status, &details.output_path) {
        (JobStatus::Done, Some(path)) => {
            println!("{} {}", "Output:".bold(), path.display().green());
            if let Some(size) = output_size(path) {
                println!("{} {}", "Size:".bold(), format_bytes(size));
            }
        }
        _ => {
            let message = details.error_message.as_deref().unwrap_or("unknown error");
            println!("{} {}", "Failed:".bold(), message.bright_red());
        }
    }
    println!(
        "{} {} ({} mode, {} steps)",
        "Elapsed:".bold(),
        format_duration(elapsed.as_secs_f64()),
        details.mode,
        details.total_steps
    );
}

fn output_size(path: &Path) -> Option<u64> {
    fs::metadata(path).ok().map(|m| m.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_check_input_files() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.mp4");
        let b = dir.path().join("b.mp4");
        fs::write(&a, b"a").unwrap();
        fs::write(&b, b"b").unwrap();

        assert!(check_input_files(&StreamOrder::new(vec![a.clone()], vec![b.clone()])).is_ok());

        let missing = dir.path().join("missing.mp4");
        let err = check_input_files(&StreamOrder::new(vec![a], vec![b, missing])).unwrap_err();
        assert!(matches!(err, CoreError::InputValidation(_)));
        assert!(err.to_string().contains("Camera B input"));
    }

    #[test]
    fn test_directory_is_not_an_input_file() {
        let dir = tempdir().unwrap();
        let err = check_input_files(&StreamOrder::new(
            vec![dir.path().to_path_buf()],
            vec![dir.path().to_path_buf()],
        ))
        .unwrap_err();
        assert!(err.to_string().contains("Camera A input"));
    }
}
