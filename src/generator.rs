use std::path::PathBuf;

use anyhow::{Context, Result};
use reqwest::Client;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::artifacts::{AssembledVideo, AudioTrack, ScriptPackage, SubtitledVideo, TopicSelection};
use crate::config::Config;
use crate::ffmpeg;
use crate::footage;
use crate::retry::CallOutcome;
use crate::seo;
use crate::subtitles;
use crate::thumbnail;
use crate::tts;
use crate::upload;

const OUTPUT_DIR: &str = "output";

fn slugify(title: &str) -> String {
    let mut out = String::new();
    let mut last_dash = true;
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    if out.is_empty() {
        out.push_str("short");
    }
    out
}

async fn build_reel(
    client: &Client,
    cfg: &Config,
    selection: &TopicSelection,
    narration: &AudioTrack,
    work_dir: &std::path::Path,
) -> Result<AssembledVideo> {
    let clips = footage::download_footage(
        client,
        cfg,
        &selection.topic,
        cfg.max_results,
        &work_dir.join("footage"),
    )
    .await?;

    let concat_list = work_dir.join("concat_list.txt");
    let mut listf = fs::File::create(&concat_list).await?;
    let mut made = 0usize;

    for (idx, clip) in clips.iter().enumerate() {
        let segment = work_dir.join(format!("segment_{idx}.mp4"));
        match ffmpeg::ffmpeg_make_segment(clip, &segment).await {
            Ok(true) => {
                listf
                    .write_all(format!("file '{}'\n", segment.display()).as_bytes())
                    .await?;
                made += 1;
            }
            Ok(false) | Err(_) => {
                warn!("Segment cut failed for clip {}", idx);
            }
        }
    }
    listf.flush().await?;

    if made == 0 {
        anyhow::bail!("No usable footage segments for '{}'", selection.topic);
    }
    info!("Segments ready: {}", made);

    let reel = work_dir.join("reel.mp4");
    if !ffmpeg::ffmpeg_concat_videos(&concat_list, &reel).await? {
        anyhow::bail!("Footage concat failed");
    }

    let narrated = work_dir.join("narrated.mp4");
    if !ffmpeg::ffmpeg_loop_with_narration(&reel, &narration.path, narration.duration_secs, &narrated)
        .await?
    {
        anyhow::bail!("Narration mux failed");
    }

    Ok(AssembledVideo {
        path: narrated,
        duration_secs: narration.duration_secs,
    })
}

/// Runs the render pipeline for one selected title: narration, footage reel,
/// subtitles, final burn-in, plus a vertical variant. Stages fail fast; a
/// failed stage aborts the run.
pub async fn produce_short(
    cfg: &Config,
    client: &Client,
    selection: &TopicSelection,
    package: &ScriptPackage,
) -> Result<SubtitledVideo> {
    fs::create_dir_all(OUTPUT_DIR).await?;
    let work = tempfile::tempdir().context("Failed to create work directory")?;
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let slug = format!("{}-{}", slugify(&package.title), stamp);

    info!("Synthesizing narration for '{}'", package.title);
    let narration = tts::synthesize(client, &package.script, &work.path().join("narration.mp3"))
        .await
        .context("Narration stage failed")?;

    info!("Building footage reel ({:.2}s target)", narration.duration_secs);
    let assembled = build_reel(client, cfg, selection, &narration, work.path())
        .await
        .context("Footage stage failed")?;

    let srt_path = PathBuf::from(format!("{OUTPUT_DIR}/{slug}.srt"));
    subtitles::write_srt(&package.script, assembled.duration_secs, &srt_path)
        .await
        .context("Subtitle stage failed")?;

    let final_path = PathBuf::from(format!("{OUTPUT_DIR}/{slug}.mp4"));
    if !ffmpeg::ffmpeg_burn_subtitles(&assembled.path, &srt_path, &final_path).await? {
        anyhow::bail!("Subtitle burn-in failed");
    }
    info!("Final render: {}", final_path.display());

    let vertical = PathBuf::from(format!("{OUTPUT_DIR}/{slug}_vertical.mp4"));
    if ffmpeg::ffmpeg_make_vertical(&final_path, &vertical).await? {
        info!("Vertical render: {}", vertical.display());
    } else {
        warn!("Vertical render skipped");
    }

    Ok(SubtitledVideo {
        path: final_path,
        srt_path,
    })
}

/// Optimizes metadata, renders a thumbnail, and uploads the finished video.
/// Returns the platform video id.
pub async fn publish(
    cfg: &Config,
    client: &Client,
    package: &ScriptPackage,
    video: &SubtitledVideo,
) -> Result<String> {
    let seo_pkg = match seo::optimize(client, cfg, &package.title, &package.script).await {
        CallOutcome::Success(pkg) => pkg,
        CallOutcome::ExhaustedRetries(pkg) => {
            warn!("Metadata optimizer unavailable, using fallback metadata");
            pkg
        }
        CallOutcome::FatalError(reason) => {
            anyhow::bail!("Metadata optimization failed: {reason}");
        }
    };
    info!("Upload title: {}", seo_pkg.title);

    let thumb_path = video.path.with_extension("png");
    let thumb = thumbnail::generate(client, cfg, &seo_pkg.title, &thumb_path).await;

    let video_id = upload::upload_video(client, cfg, &video.path, &seo_pkg, thumb.as_deref())
        .await
        .context("Upload stage failed")?;

    Ok(video_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_are_filename_safe() {
        assert_eq!(slugify("The Quiet Rise of Rust!"), "the-quiet-rise-of-rust");
        assert_eq!(slugify("100% Pure *Chaos*"), "100-pure-chaos");
        assert_eq!(slugify("???"), "short");
    }

    #[test]
    fn slugs_collapse_runs_of_symbols() {
        assert_eq!(slugify("a  --  b"), "a-b");
    }
}
