//! Video container probing
//!
//! Reads duration, display dimensions and container tags from a video file by
//! shelling out to `ffprobe` and parsing its JSON report.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;

/// Probe result for a video file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoProbe {
    /// Container duration in seconds
    pub duration_secs: Option<f64>,
    /// First video track size after applying its display rotation
    pub display_size: Option<(u32, u32)>,
    /// Video codec name (e.g., "h264", "hevc")
    pub codec: Option<String>,
    /// Container-level metadata tags, keys as reported by the demuxer
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
    #[serde(default)]
    tags: BTreeMap<String, String>,
    #[serde(default)]
    side_data_list: Vec<SideData>,
    disposition: Option<Disposition>,
}

#[derive(Debug, Deserialize)]
struct SideData {
    side_data_type: Option<String>,
    rotation: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Disposition {
    #[serde(default)]
    attached_pic: u8,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
    #[serde(default)]
    tags: BTreeMap<String, String>,
}

/// Check whether `ffprobe` can be found on PATH
pub fn ffprobe_available() -> bool {
    which::which("ffprobe").is_ok()
}

/// Probe a video file
pub fn probe_video(path: impl AsRef<Path>) -> Result<VideoProbe> {
    let path = path.as_ref();

    let probe_output = Command::new("ffprobe")
        .args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
        .arg(path)
        .output()
        .context("Failed to execute ffprobe - ensure ffmpeg is installed")?;

    if !probe_output.status.success() {
        let stderr = String::from_utf8_lossy(&probe_output.stderr);
        anyhow::bail!("ffprobe failed for {}: {}", path.display(), stderr.trim());
    }

    parse_probe_json(&String::from_utf8_lossy(&probe_output.stdout))
        .with_context(|| format!("Failed to parse ffprobe output for {}", path.display()))
}

/// Parse the JSON document printed by `ffprobe -print_format json`
pub fn parse_probe_json(json: &str) -> Result<VideoProbe> {
    let output: ProbeOutput = serde_json::from_str(json)?;

    let video = output.streams.iter().find(|s| {
        s.codec_type.as_deref() == Some("video")
            && s.disposition.as_ref().map_or(true, |d| d.attached_pic == 0)
    });

    let format_duration = output
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(parse_seconds);
    let stream_duration = video.and_then(|s| s.duration.as_deref()).and_then(parse_seconds);

    let display_size = video.and_then(|s| match (s.width, s.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => {
            Some(apply_display_rotation(w, h, stream_rotation(s)))
        }
        _ => None,
    });

    Ok(VideoProbe {
        duration_secs: format_duration.or(stream_duration),
        display_size,
        codec: video.and_then(|s| s.codec_name.clone()),
        tags: output.format.map(|f| f.tags).unwrap_or_default(),
    })
}

fn parse_seconds(val: &str) -> Option<f64> {
    val.trim().parse::<f64>().ok().filter(|d| d.is_finite() && *d >= 0.0)
}

/// Rotation in degrees from the display matrix side data, or the legacy `rotate` tag
fn stream_rotation(stream: &ProbeStream) -> f64 {
    stream
        .side_data_list
        .iter()
        .find(|sd| sd.side_data_type.as_deref() == Some("Display Matrix"))
        .and_then(|sd| sd.rotation)
        .or_else(|| stream.tags.get("rotate").and_then(|r| r.trim().parse::<f64>().ok()))
        .unwrap_or(0.0)
}

/// Transform a natural size by a rotation and take the absolute value of both axes
pub fn apply_display_rotation(width: u32, height: u32, degrees: f64) -> (u32, u32) {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let (w, h) = (width as f64, height as f64);
    let out_w = (w * cos - h * sin).abs().round();
    let out_h = (w * sin + h * cos).abs().round();
    (out_w as u32, out_h as u32)
}
