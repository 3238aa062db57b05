//! Utility functions for formatting and path handling.
//!
//! General-purpose helpers used across the stages: parsing ffmpeg's
//! `HH:MM:SS.ms` timestamps, formatting durations and sizes for logs, and
//! extracting file names safely.

use crate::error::{CoreError, CoreResult};
use std::path::Path;

/// Formats seconds as HH:MM:SS (e.g., 3725.0 -> "01:02:05"). Returns "??:??:??" for invalid inputs.
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    if seconds < 0.0 || !seconds.is_finite() {
        return "??:??:??".to_string();
    }

    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Formats bytes with appropriate binary units (B, KiB, MiB, GiB).
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    const GIB: f64 = MIB * 1024.0;

    let bytes_f64 = bytes as f64;
    if bytes_f64 >= GIB {
        format!("{:.2} GiB", bytes_f64 / GIB)
    } else if bytes_f64 >= MIB {
        format!("{:.2} MiB", bytes_f64 / MIB)
    } else if bytes_f64 >= KIB {
        format!("{:.2} KiB", bytes_f64 / KIB)
    } else {
        format!("{bytes} B")
    }
}

/// Parses FFmpeg time string (HH:MM:SS.MS) to seconds. Returns None if invalid.
///
/// ffmpeg prints a negative time (`-00:00:00.03`) before the first frame is
/// written; those clamp to zero.
#[must_use]
pub fn parse_ffmpeg_time(time: &str) -> Option<f64> {
    let (negative, time) = match time.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, time),
    };
    let parts: Vec<&str> = time.split(':').collect();
    if parts.len() != 3 {
        return None;
    }
    let hours = parts[0].parse::<f64>().ok()?;
    let minutes = parts[1].parse::<f64>().ok()?;
    let seconds = parts[2].parse::<f64>().ok()?;
    if negative {
        return Some(0.0);
    }
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Safely extracts filename from a path.
/// Returns the filename as a String, or an error if the path has no filename component.
pub fn get_filename_safe(path: &Path) -> CoreResult<String> {
    Ok(path
        .file_name()
        .ok_or_else(|| {
            CoreError::InputValidation(format!("Failed to get filename for {}", path.display()))
        })?
        .to_string_lossy()
        .to_string())
}

/// Returns the file name for logs, falling back to the full path.
#[must_use]
pub fn display_name(path: &Path) -> String {
    get_filename_safe(path).unwrap_or_else(|_| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_ffmpeg_time() {
        assert_eq!(parse_ffmpeg_time("00:00:10.50"), Some(10.5));
        assert_eq!(parse_ffmpeg_time("01:02:05.00"), Some(3725.0));
        assert_eq!(parse_ffmpeg_time("-00:00:00.03"), Some(0.0));
        assert_eq!(parse_ffmpeg_time("N/A"), None);
        assert_eq!(parse_ffmpeg_time("10.5"), None);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "00:00:00");
        assert_eq!(format_duration(3725.9), "01:02:05");
        assert_eq!(format_duration(-1.0), "??:??:??");
        assert_eq!(format_duration(f64::NAN), "??:??:??");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1536), "1.50 KiB");
        assert_eq!(format_bytes(1024 * 1024), "1.00 MiB");
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name(&PathBuf::from("/a/b/cam1.mp4")), "cam1.mp4");
        assert_eq!(display_name(&PathBuf::from("/")), "/");
    }
}
