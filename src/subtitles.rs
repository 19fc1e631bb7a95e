use std::path::Path;

use anyhow::{Context, Result};
use tokio::fs;
use tracing::info;

fn format_timestamp(secs: f64) -> String {
    let total_ms = (secs.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_s = total_ms / 1000;
    let s = total_s % 60;
    let m = (total_s / 60) % 60;
    let h = total_s / 3600;
    format!("{h:02}:{m:02}:{s:02},{ms:03}")
}

fn split_sentences(script: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();

    for ch in script.chars() {
        current.push(ch);
        if matches!(ch, '.' | '!' | '?') {
            let trimmed = current.trim();
            if !trimmed.is_empty() {
                sentences.push(trimmed.to_string());
            }
            current.clear();
        }
    }
    let tail = current.trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }

    sentences
}

/// Builds SRT text for `script` with sentences spread evenly across
/// `duration_secs`. Timing is naive: every sentence gets an equal slot.
pub fn compose_srt(script: &str, duration_secs: f64) -> String {
    let sentences = split_sentences(script);
    if sentences.is_empty() || duration_secs <= 0.0 {
        return String::new();
    }

    let slot = duration_secs / sentences.len() as f64;
    let mut srt = String::new();
    for (idx, sentence) in sentences.iter().enumerate() {
        let start = slot * idx as f64;
        let end = slot * (idx + 1) as f64;
        srt.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            idx + 1,
            format_timestamp(start),
            format_timestamp(end),
            sentence
        ));
    }

    srt
}

pub async fn write_srt(script: &str, duration_secs: f64, out_srt: &Path) -> Result<()> {
    let srt = compose_srt(script, duration_secs);
    if srt.is_empty() {
        anyhow::bail!("No sentences to subtitle");
    }

    fs::write(out_srt, srt)
        .await
        .with_context(|| format!("Failed to write {}", out_srt.display()))?;
    info!("Subtitles saved: {}", out_srt.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_format_as_srt() {
        assert_eq!(format_timestamp(0.0), "00:00:00,000");
        assert_eq!(format_timestamp(61.5), "00:01:01,500");
        assert_eq!(format_timestamp(3661.042), "01:01:01,042");
    }

    #[test]
    fn sentences_split_on_terminal_punctuation() {
        assert_eq!(
            split_sentences("One. Two! Three? trailing bit"),
            vec!["One.", "Two!", "Three?", "trailing bit"]
        );
    }

    #[test]
    fn srt_slots_are_even() {
        let srt = compose_srt("First. Second.", 10.0);
        assert!(srt.contains("1\n00:00:00,000 --> 00:00:05,000\nFirst.\n"));
        assert!(srt.contains("2\n00:00:05,000 --> 00:00:10,000\nSecond.\n"));
    }

    #[test]
    fn empty_script_yields_empty_srt() {
        assert_eq!(compose_srt("   ", 10.0), "");
        assert_eq!(compose_srt("Hello.", 0.0), "");
    }
}
