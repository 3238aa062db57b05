//! Work-area and temporary file management.
//!
//! Each job writes its intermediates into `<output_dir>/<job_id>/`. Those
//! files are kept after the job ends. The only artifact that is always
//! removed is the concat list, which lives in a `tempfile::NamedTempFile` and
//! is deleted when dropped, whether the stage succeeded or not.

use crate::error::CoreResult;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{Builder as TempFileBuilder, NamedTempFile};

/// Creates (if needed) and returns the work directory for a job.
pub fn create_job_dir(output_root: &Path, job_id: &str) -> CoreResult<PathBuf> {
    let dir = output_root.join(job_id);
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Writes `contents` into a new temporary file inside `dir`. Auto-deleted when dropped.
pub fn create_temp_file_with(
    dir: &Path,
    prefix: &str,
    extension: &str,
    contents: &str,
) -> CoreResult<NamedTempFile> {
    fs::create_dir_all(dir)?;
    let mut temp_file = TempFileBuilder::new()
        .prefix(&format!("{prefix}_"))
        .suffix(&format!(".{extension}"))
        .tempfile_in(dir)?;
    temp_file.write_all(contents.as_bytes())?;
    temp_file.flush()?;
    Ok(temp_file)
}

/// Random lowercase alphanumeric token, used for file names and job ids.
pub fn random_token(len: usize) -> String {
    use rand::distributions::Alphanumeric;
    use rand::{Rng, thread_rng};

    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
