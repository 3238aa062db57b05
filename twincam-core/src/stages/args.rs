//! ffmpeg argument construction for each stage operation.
//!
//! Builders return plain argument vectors (output path always last) so they
//! can be inspected in tests without spawning anything. The command prefix
//! (`-hide_banner -y`) is added by `FfmpegCommandBuilder`.

use crate::config::{IntermediateEncoding, PipelineConfig};
use crate::error::CoreResult;
use crate::external::ffmpeg_builder::{FilterGraph, VideoFilterChain, scale_to_max_width};
use std::path::Path;

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Encoder options shared by every re-encoding intermediate. Producing all
/// intermediates from this one function is what keeps pair outputs
/// codec-homogeneous and constant-frame-rate.
pub fn intermediate_codec_args(enc: &IntermediateEncoding) -> Vec<String> {
    vec![
        "-c:v".into(),
        enc.video_codec.clone(),
        "-preset".into(),
        enc.preset.as_str().into(),
        "-crf".into(),
        enc.crf.to_string(),
        "-pix_fmt".into(),
        enc.pixel_format.clone(),
        "-r".into(),
        enc.frame_rate.to_string(),
        "-fps_mode".into(),
        "cfr".into(),
        "-c:a".into(),
        enc.audio_codec.clone(),
        "-b:a".into(),
        enc.audio_bitrate.clone(),
        "-ar".into(),
        enc.audio_sample_rate.to_string(),
        "-ac".into(),
        "2".into(),
    ]
}

/// Side-by-side combination: camera A on the left, camera B on the right,
/// both audio tracks merged and downmixed to stereo.
pub fn combine_args(
    left: &Path,
    right: &Path,
    output: &Path,
    max_width: Option<u32>,
    enc: &IntermediateEncoding,
) -> CoreResult<Vec<String>> {
    let mut stack = vec!["hstack=inputs=2".to_string()];
    if let Some(width) = max_width {
        stack.push(scale_to_max_width(width));
    }

    let graph = FilterGraph::new()
        .chain(&["0:v"], ["setpts=PTS-STARTPTS"], &["left"])
        .chain(&["1:v"], ["setpts=PTS-STARTPTS"], &["right"])
        .chain(&["left", "right"], stack, &["v"])
        .chain(&["0:a", "1:a"], ["amerge=inputs=2"], &["a"])
        .build()?;

    let mut args = vec![
        "-i".into(),
        path_arg(left),
        "-i".into(),
        path_arg(right),
        "-filter_complex".into(),
        graph,
        "-map".into(),
        "[v]".into(),
        "-map".into(),
        "[a]".into(),
    ];
    args.extend(intermediate_codec_args(enc));
    args.push(path_arg(output));
    Ok(args)
}

/// Concat demuxer over `list_file`. Stream copy keeps every packet as is;
/// re-encode normalizes the joined stream to the intermediate frame rate.
pub fn concat_args(
    list_file: &Path,
    output: &Path,
    reencode: bool,
    enc: &IntermediateEncoding,
) -> Vec<String> {
    let mut args = vec![
        "-f".into(),
        "concat".into(),
        "-safe".into(),
        "0".into(),
        "-i".into(),
        path_arg(list_file),
    ];
    if reencode {
        args.extend(["-map".into(), "0:v:0".into(), "-map".into(), "0:a:0?".into()]);
        args.extend(intermediate_codec_args(enc));
    } else {
        args.extend(["-c".into(), "copy".into()]);
    }
    args.push(path_arg(output));
    args
}

/// Final compression with the job's quality settings.
pub fn compress_args(input: &Path, output: &Path, config: &PipelineConfig) -> Vec<String> {
    let mut args = vec!["-i".into(), path_arg(input)];
    if let Some(filters) = VideoFilterChain::new().add_max_width(config.max_width).build() {
        args.extend(["-vf".into(), filters]);
    }
    args.extend([
        "-c:v".into(),
        config.intermediate.video_codec.clone(),
        "-preset".into(),
        config.preset.as_str().into(),
        "-crf".into(),
        config.crf.to_string(),
        "-pix_fmt".into(),
        config.intermediate.pixel_format.clone(),
        "-c:a".into(),
        config.intermediate.audio_codec.clone(),
        "-b:a".into(),
        config.audio_bitrate.clone(),
        "-movflags".into(),
        "+faststart".into(),
    ]);
    args.push(path_arg(output));
    args
}

/// Extends `input` by `seconds`: the last video frame is cloned and silence
/// is appended to the audio for the same duration.
pub fn pad_args(
    input: &Path,
    output: &Path,
    seconds: f64,
    enc: &IntermediateEncoding,
) -> Vec<String> {
    let secs = format!("{seconds:.3}");
    let mut args = vec![
        "-i".into(),
        path_arg(input),
        "-vf".into(),
        format!("tpad=stop_mode=clone:stop_duration={secs}"),
        "-af".into(),
        format!("apad=pad_dur={secs}"),
    ];
    args.extend(intermediate_codec_args(enc));
    args.push(path_arg(output));
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Preset;
    use std::path::PathBuf;

    fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn test_combine_args() {
        let args = combine_args(
            Path::new("/in/a.mp4"),
            Path::new("/in/b.mp4"),
            Path::new("/work/pair_000.mp4"),
            None,
            &IntermediateEncoding::default(),
        )
        .unwrap();

        assert_eq!(&args[0..4], ["-i", "/in/a.mp4", "-i", "/in/b.mp4"]);
        assert_eq!(
            value_after(&args, "-filter_complex"),
            Some(
                "[0:v]setpts=PTS-STARTPTS[left];[1:v]setpts=PTS-STARTPTS[right];\
                 [left][right]hstack=inputs=2[v];[0:a][1:a]amerge=inputs=2[a]"
            )
        );
        assert_eq!(value_after(&args, "-fps_mode"), Some("cfr"));
        assert_eq!(value_after(&args, "-r"), Some("30"));
        assert_eq!(value_after(&args, "-ac"), Some("2"));
        assert_eq!(args.last().unwrap(), "/work/pair_000.mp4");
    }

    #[test]
    fn test_combine_args_with_width_limit() {
        let args = combine_args(
            Path::new("a.mp4"),
            Path::new("b.mp4"),
            Path::new("out.mp4"),
            Some(1920),
            &IntermediateEncoding::default(),
        )
        .unwrap();
        let graph = value_after(&args, "-filter_complex").unwrap();
        assert!(graph.contains("[left][right]hstack=inputs=2,scale='trunc(min(1920,iw)/2)*2':-2[v]"));
    }

    #[test]
    fn test_concat_stream_copy_never_encodes() {
        let args = concat_args(
            Path::new("/work/list.txt"),
            Path::new("/work/joined.mp4"),
            false,
            &IntermediateEncoding::default(),
        );
        assert_eq!(value_after(&args, "-f"), Some("concat"));
        assert_eq!(value_after(&args, "-safe"), Some("0"));
        assert_eq!(value_after(&args, "-c"), Some("copy"));
        assert!(!args.iter().any(|a| a == "-c:v" || a == "-fps_mode"));
    }

    #[test]
    fn test_concat_reencode_normalizes_frame_rate() {
        let args = concat_args(
            Path::new("/work/list.txt"),
            Path::new("/work/concat_a.mp4"),
            true,
            &IntermediateEncoding::default(),
        );
        assert_eq!(value_after(&args, "-c:v"), Some("libx264"));
        assert_eq!(value_after(&args, "-fps_mode"), Some("cfr"));
        assert!(!args.iter().any(|a| a == "copy"));
        assert_eq!(args.last().unwrap(), "/work/concat_a.mp4");
    }

    #[test]
    fn test_compress_args_use_job_settings() {
        let mut config = PipelineConfig::new("/out");
        config.crf = 28;
        config.preset = Preset::Slower;
        config.max_width = Some(1280);
        config.audio_bitrate = "64k".to_string();

        let args = compress_args(Path::new("/work/combined.mp4"), Path::new("/work/output.mp4"), &config);
        assert_eq!(value_after(&args, "-crf"), Some("28"));
        assert_eq!(value_after(&args, "-preset"), Some("slower"));
        assert_eq!(value_after(&args, "-b:a"), Some("64k"));
        assert_eq!(value_after(&args, "-vf"), Some("scale='trunc(min(1280,iw)/2)*2':-2"));
        assert_eq!(value_after(&args, "-movflags"), Some("+faststart"));
    }

    #[test]
    fn test_compress_args_keep_width_when_unset() {
        let config = PipelineConfig::new("/out");
        let args = compress_args(Path::new("in.mp4"), Path::new("out.mp4"), &config);
        assert!(!args.iter().any(|a| a == "-vf"));
    }

    #[test]
    fn test_pad_args() {
        let args = pad_args(
            Path::new("/work/concat_b.mp4"),
            Path::new("/work/padded_b.mp4"),
            10.0,
            &IntermediateEncoding::default(),
        );
        assert_eq!(
            value_after(&args, "-vf"),
            Some("tpad=stop_mode=clone:stop_duration=10.000")
        );
        assert_eq!(value_after(&args, "-af"), Some("apad=pad_dur=10.000"));
        assert_eq!(args.last().map(PathBuf::from), Some(PathBuf::from("/work/padded_b.mp4")));
    }

    #[test]
    fn test_intermediates_share_codec_args() {
        let enc = IntermediateEncoding::default();
        let codec = intermediate_codec_args(&enc);
        let pair = combine_args(Path::new("a"), Path::new("b"), Path::new("o"), None, &enc).unwrap();
        let joined = concat_args(Path::new("l"), Path::new("o"), true, &enc);
        let padded = pad_args(Path::new("i"), Path::new("o"), 1.0, &enc);
        for args in [&pair, &joined, &padded] {
            assert!(args.windows(codec.len()).any(|w| w == codec.as_slice()));
        }
    }
}
