use std::path::Path;

use anyhow::{Context, Result};
use reqwest::Client;
use tokio::fs;
use tracing::info;

use crate::artifacts::AudioTrack;
use crate::ffmpeg;

const TRANSLATE_TTS_URL: &str = "https://translate.google.com/translate_tts";

// The endpoint rejects long q parameters, so narration is synthesized in
// word-boundary chunks and the MP3 frames are concatenated.
const MAX_CHUNK_CHARS: usize = 200;

fn chunk_text(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > MAX_CHUNK_CHARS {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Synthesizes narration audio for `text` into an MP3 at `out_mp3_path` and
/// probes its real duration.
pub async fn synthesize(client: &Client, text: &str, out_mp3_path: &Path) -> Result<AudioTrack> {
    let chunks = chunk_text(text);
    if chunks.is_empty() {
        anyhow::bail!("Nothing to narrate");
    }

    let total = chunks.len().to_string();
    let mut mp3_bytes: Vec<u8> = Vec::new();

    for (idx, chunk) in chunks.iter().enumerate() {
        let resp = client
            .get(TRANSLATE_TTS_URL)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", "en"),
                ("q", chunk.as_str()),
                ("total", &total),
                ("idx", &idx.to_string()),
                ("textlen", &chunk.len().to_string()),
            ])
            .timeout(std::time::Duration::from_secs(60))
            .send()
            .await
            .context("TTS request failed")?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("TTS HTTP {}", status.as_u16());
        }

        let bytes = resp.bytes().await.context("TTS response read failed")?;
        mp3_bytes.extend_from_slice(&bytes);
    }

    if let Some(parent) = out_mp3_path.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create dir {}", parent.display()))?;
    }
    fs::write(out_mp3_path, &mp3_bytes)
        .await
        .with_context(|| format!("Failed to write {}", out_mp3_path.display()))?;

    let duration_secs = ffmpeg::ffprobe_duration_seconds(out_mp3_path).await?;
    info!(
        "Narration saved: {} ({:.2}s, {} chunks)",
        out_mp3_path.display(),
        duration_secs,
        chunks.len()
    );

    Ok(AudioTrack {
        path: out_mp3_path.to_path_buf(),
        duration_secs,
    })
}
