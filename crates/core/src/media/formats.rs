//! Format option lists offered to the user.

use tracing::warn;

use super::config::{FormatListMode, FormatsConfig};
use super::types::{ExtractorFormat, FormatOption};

const AUDIO_SELECTOR: &str = "bestaudio[ext=m4a]/bestaudio/best";

/// The four hand-curated options.
pub fn fixed_formats() -> Vec<FormatOption> {
    vec![
        FormatOption::video(
            "bestvideo[ext=mp4]+bestaudio[ext=m4a]/bestvideo+bestaudio/best",
            "Best Quality",
        ),
        FormatOption::video(
            "bestvideo[height<=1080][ext=mp4]+bestaudio[ext=m4a]/best[height<=1080]/best",
            "1080p HD",
        ),
        FormatOption::video(
            "bestvideo[height<=720][ext=mp4]+bestaudio[ext=m4a]/best[height<=720]/best",
            "720p",
        ),
        FormatOption::audio(AUDIO_SELECTOR, "Audio Only"),
    ]
}

/// Options for each target height the source actually offers, followed by
/// an audio-only option when the source has an audio-only stream.
///
/// Targets without a matching stream are skipped, so the result can be
/// empty.
pub fn derive_formats(formats: &[ExtractorFormat], target_heights: &[u32]) -> Vec<FormatOption> {
    let mut options: Vec<FormatOption> = target_heights
        .iter()
        .filter_map(|&height| {
            let largest = formats
                .iter()
                .filter(|f| f.has_video() && f.height == Some(height))
                .max_by(|a, b| {
                    let a = a.size_bytes().unwrap_or(0.0);
                    let b = b.size_bytes().unwrap_or(0.0);
                    a.total_cmp(&b)
                })?;

            Some(
                FormatOption::video(height_selector(height), height_label(height))
                    .with_note(largest.size_bytes().map(approx_size)),
            )
        })
        .collect();

    let best_audio = formats
        .iter()
        .filter(|f| f.is_audio_only())
        .max_by(|a, b| {
            let a = a.size_bytes().unwrap_or(0.0);
            let b = b.size_bytes().unwrap_or(0.0);
            a.total_cmp(&b)
        });

    if let Some(audio) = best_audio {
        options.push(
            FormatOption::audio(AUDIO_SELECTOR, "Audio Only")
                .with_note(audio.size_bytes().map(approx_size)),
        );
    }

    options
}

/// Builds the list for the configured mode.
///
/// A derived list that comes out empty is replaced by the fixed list, so
/// clients always get something to choose from.
pub fn build_format_list(config: &FormatsConfig, formats: &[ExtractorFormat]) -> Vec<FormatOption> {
    match config.mode {
        FormatListMode::Fixed => fixed_formats(),
        FormatListMode::Derived => {
            let derived = derive_formats(formats, &config.target_heights);
            if derived.is_empty() {
                warn!(
                    "No stream matched target heights {:?} ({} formats reported), using fixed list",
                    config.target_heights,
                    formats.len()
                );
                fixed_formats()
            } else {
                derived
            }
        }
    }
}

fn height_selector(height: u32) -> String {
    format!(
        "bestvideo[height<={h}][ext=mp4]+bestaudio[ext=m4a]/bestvideo[height<={h}]+bestaudio/best[height<={h}]/best",
        h = height
    )
}

fn height_label(height: u32) -> String {
    match height {
        4320 => "8K (4320p)".to_string(),
        2160 => "4K (2160p)".to_string(),
        1440 => "1440p QHD".to_string(),
        1080 => "1080p HD".to_string(),
        other => format!("{}p", other),
    }
}

fn approx_size(bytes: f64) -> String {
    let mb = bytes / 1_048_576.0;
    if mb >= 1024.0 {
        format!("~{:.2} GB", mb / 1024.0)
    } else {
        format!("~{:.1} MB", mb)
    }
}
