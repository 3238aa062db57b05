//! FFmpeg command builder utilities
//!
//! Typed builders for everything the stages hand to ffmpeg: the base command,
//! simple `-vf` chains, labelled `-filter_complex` graphs and the manifest
//! read by the concat demuxer. Graphs and manifests are validated before
//! rendering so malformed input fails early instead of inside the tool.

use crate::error::{CoreError, CoreResult};
use ffmpeg_sidecar::command::FfmpegCommand;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Builds the base `FFmpeg` command every stage runs: no banner, overwrite
/// outputs (`-y`), then the stage arguments with the output path last.
#[derive(Debug, Default)]
pub struct FfmpegCommandBuilder;

impl FfmpegCommandBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Builds the command with the stage arguments appended
    #[must_use]
    pub fn build<I, S>(self, args: I) -> FfmpegCommand
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let mut cmd = FfmpegCommand::new();
        cmd.hide_banner();
        cmd.overwrite();
        cmd.args(args);
        cmd
    }
}

/// Builder for constructing simple video filter chains (`-vf`)
#[derive(Default)]
pub struct VideoFilterChain {
    filters: Vec<String>,
}

impl VideoFilterChain {
    /// Creates a new empty filter chain
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits the width to `max_width`, keeping aspect ratio and an even height.
    /// Narrower sources are left untouched.
    #[must_use]
    pub fn add_max_width(mut self, max_width: Option<u32>) -> Self {
        if let Some(width) = max_width {
            self.filters.push(scale_to_max_width(width));
        }
        self
    }

    /// Adds a custom filter to the chain
    #[must_use]
    pub fn add_filter(mut self, filter: impl Into<String>) -> Self {
        let filter = filter.into();
        if !filter.is_empty() {
            self.filters.push(filter);
        }
        self
    }

    /// Builds the filter chain into a single filter string
    #[must_use]
    pub fn build(self) -> Option<String> {
        if self.filters.is_empty() {
            None
        } else {
            Some(self.filters.join(","))
        }
    }
}

/// `scale` expression that only ever shrinks. The width is rounded down to
/// an even number, which yuv420p requires.
#[must_use]
pub fn scale_to_max_width(width: u32) -> String {
    format!("scale='trunc(min({width},iw)/2)*2':-2")
}

/// One `[in]...filter,filter...[out]` segment of a filter graph.
#[derive(Debug, Clone)]
struct GraphChain {
    inputs: Vec<String>,
    filters: Vec<String>,
    outputs: Vec<String>,
}

/// Typed builder for `-filter_complex` graphs.
///
/// Inputs are either stream specifiers (`0:v`, `1:a`) or labels produced by an
/// earlier chain. `build` rejects empty chains, malformed labels, labels
/// defined twice and references to labels nobody produced.
#[derive(Debug, Clone, Default)]
pub struct FilterGraph {
    chains: Vec<GraphChain>,
}

impl FilterGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chain consuming `inputs`, applying `filters` in order and
    /// producing `outputs`.
    #[must_use]
    pub fn chain<S: Into<String>>(
        mut self,
        inputs: &[&str],
        filters: impl IntoIterator<Item = S>,
        outputs: &[&str],
    ) -> Self {
        self.chains.push(GraphChain {
            inputs: inputs.iter().map(|s| (*s).to_string()).collect(),
            filters: filters.into_iter().map(Into::into).collect(),
            outputs: outputs.iter().map(|s| (*s).to_string()).collect(),
        });
        self
    }

    /// Validates and renders the graph.
    pub fn build(self) -> CoreResult<String> {
        if self.chains.is_empty() {
            return Err(CoreError::InvalidConfig("filter graph has no chains".to_string()));
        }

        let mut defined: HashSet<&str> = HashSet::new();
        let mut rendered = Vec::with_capacity(self.chains.len());

        for chain in &self.chains {
            if chain.filters.is_empty() || chain.filters.iter().any(|f| f.trim().is_empty()) {
                return Err(CoreError::InvalidConfig(
                    "filter graph chain has an empty filter".to_string(),
                ));
            }
            for input in &chain.inputs {
                check_label(input)?;
                if !is_stream_specifier(input) && !defined.contains(input.as_str()) {
                    return Err(CoreError::InvalidConfig(format!(
                        "filter graph references undefined label [{input}]"
                    )));
                }
            }
            for output in &chain.outputs {
                check_label(output)?;
                if is_stream_specifier(output) || !defined.insert(output.as_str()) {
                    return Err(CoreError::InvalidConfig(format!(
                        "filter graph label [{output}] cannot be used as an output"
                    )));
                }
            }

            let inputs: String = chain.inputs.iter().map(|l| format!("[{l}]")).collect();
            let outputs: String = chain.outputs.iter().map(|l| format!("[{l}]")).collect();
            rendered.push(format!("{inputs}{}{outputs}", chain.filters.join(",")));
        }

        Ok(rendered.join(";"))
    }
}

fn check_label(label: &str) -> CoreResult<()> {
    let valid = !label.is_empty()
        && label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':');
    if valid {
        Ok(())
    } else {
        Err(CoreError::InvalidConfig(format!(
            "invalid filter graph label [{label}]"
        )))
    }
}

/// `0:v`, `1:a:0` and similar input stream references.
fn is_stream_specifier(label: &str) -> bool {
    label.split(':').next().is_some_and(|first| {
        !first.is_empty() && first.bytes().all(|b| b.is_ascii_digit())
    }) && label.contains(':')
}

/// Manifest for ffmpeg's concat demuxer (`-f concat -safe 0 -i list.txt`).
///
/// Paths are made absolute because the demuxer resolves relative entries
/// against the manifest's own directory. Entries are single-quoted; an
/// embedded `'` is written as `'\''`. The demuxer reads one directive per
/// line, so paths containing line breaks cannot be listed and are rejected,
/// as are paths that are not valid UTF-8.
#[derive(Debug, Clone, Default)]
pub struct ConcatList {
    entries: Vec<PathBuf>,
}

impl ConcatList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a list from `paths`, validating every entry.
    pub fn from_paths<P: AsRef<Path>>(paths: &[P]) -> CoreResult<Self> {
        let mut list = Self::new();
        for path in paths {
            list.push(path.as_ref())?;
        }
        Ok(list)
    }

    /// Appends one entry.
    pub fn push(&mut self, path: &Path) -> CoreResult<()> {
        let text = path.to_str().ok_or_else(|| {
            CoreError::ConcatList(format!("{} is not valid UTF-8", path.display()))
        })?;
        if text.is_empty() {
            return Err(CoreError::ConcatList("empty path".to_string()));
        }
        if text.contains(['\n', '\r', '\0']) {
            return Err(CoreError::ConcatList(format!(
                "{} contains a line break or NUL",
                text.escape_debug()
            )));
        }
        self.entries.push(std::path::absolute(path)?);
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders the manifest text.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::from("ffconcat version 1.0\n");
        for entry in &self.entries {
            // Validated as UTF-8 in push()
            let text = entry.to_string_lossy();
            out.push_str("file '");
            out.push_str(&text.replace('\'', r"'\''"));
            out.push_str("'\n");
        }
        out
    }
}
