use anyhow::{Context, Result};
use std::path::Path;
use tokio::process::Command;
use tracing::warn;

pub const FRAME_WIDTH: i32 = 1920;
pub const FRAME_HEIGHT: i32 = 1080;
pub const SEGMENT_SECONDS: f64 = 3.0;
const FRAME_RATE: i32 = 30;

async fn run_cmd(args: &[String]) -> Result<()> {
    if args.is_empty() {
        return Ok(());
    }

    let mut cmd = Command::new(&args[0]);
    if args.len() > 1 {
        cmd.args(&args[1..]);
    }

    let status = cmd.status().await.context("Command execution failed")?;
    if !status.success() {
        return Err(anyhow::anyhow!("Command failed: {:?}", args));
    }

    Ok(())
}

pub async fn ffprobe_video_dimensions(path: &Path) -> Result<(i32, i32)> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height",
            "-of",
            "csv=s=x:p=0",
        ])
        .arg(path)
        .output()
        .await
        .context("ffprobe execution failed")?;

    if !output.status.success() {
        return Err(anyhow::anyhow!("ffprobe failed"));
    }

    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let mut parts = text.split('x');
    let w = parts
        .next()
        .and_then(|v| v.parse::<i32>().ok())
        .unwrap_or(0);
    let h = parts
        .next()
        .and_then(|v| v.parse::<i32>().ok())
        .unwrap_or(0);

    if w <= 0 || h <= 0 {
        return Err(anyhow::anyhow!("Invalid dimensions"));
    }

    Ok((w, h))
}

pub async fn ffprobe_duration_seconds(path: &Path) -> Result<f64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .await
        .context("ffprobe duration failed")?;

    if !output.status.success() {
        return Err(anyhow::anyhow!("ffprobe failed"));
    }

    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let duration = text.parse::<f64>().unwrap_or(-1.0);
    if duration <= 0.1 {
        return Err(anyhow::anyhow!("Invalid duration"));
    }
    Ok(duration)
}

/// Cuts the opening seconds of a stock clip and normalizes it for concat:
/// scaled and padded to the frame size, constant frame rate, audio dropped.
pub async fn ffmpeg_make_segment(input_mp4: &Path, out_mp4: &Path) -> Result<bool> {
    let filter = format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:black,fps={fps},format=yuv420p",
        w = FRAME_WIDTH,
        h = FRAME_HEIGHT,
        fps = FRAME_RATE
    );

    let args = vec![
        "ffmpeg".to_string(),
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-i".to_string(),
        input_mp4.display().to_string(),
        "-t".to_string(),
        format!("{:.3}", SEGMENT_SECONDS),
        "-vf".to_string(),
        filter,
        "-an".to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        "veryfast".to_string(),
        "-crf".to_string(),
        "22".to_string(),
        out_mp4.display().to_string(),
    ];

    run_cmd(&args).await?;
    Ok(out_mp4.exists())
}

pub async fn ffmpeg_concat_videos(list_txt: &Path, out_mp4: &Path) -> Result<bool> {
    let args = vec![
        "ffmpeg".to_string(),
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-f".to_string(),
        "concat".to_string(),
        "-safe".to_string(),
        "0".to_string(),
        "-i".to_string(),
        list_txt.display().to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-preset".to_string(),
        "veryfast".to_string(),
        "-crf".to_string(),
        "22".to_string(),
        "-an".to_string(),
        out_mp4.display().to_string(),
    ];
    run_cmd(&args).await?;
    Ok(out_mp4.exists())
}

/// Loops the silent footage reel until it covers the narration, then muxes the
/// narration in as the only audio stream.
pub async fn ffmpeg_loop_with_narration(
    video_in: &Path,
    narration_mp3: &Path,
    narration_dur: f64,
    out_mp4: &Path,
) -> Result<bool> {
    if narration_dur <= 0.1 {
        return Ok(false);
    }

    let args = vec![
        "ffmpeg".to_string(),
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-stream_loop".to_string(),
        "-1".to_string(),
        "-i".to_string(),
        video_in.display().to_string(),
        "-i".to_string(),
        narration_mp3.display().to_string(),
        "-t".to_string(),
        format!("{:.3}", narration_dur),
        "-map".to_string(),
        "0:v".to_string(),
        "-map".to_string(),
        "1:a".to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-preset".to_string(),
        "veryfast".to_string(),
        "-crf".to_string(),
        "22".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-b:a".to_string(),
        "192k".to_string(),
        "-shortest".to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
        out_mp4.display().to_string(),
    ];
    run_cmd(&args).await?;
    Ok(out_mp4.exists())
}

pub async fn ffmpeg_burn_subtitles(video_in: &Path, srt: &Path, out_mp4: &Path) -> Result<bool> {
    // libass renders FontSize against a 288-line canvas, so 23 lands at
    // roughly 8% of the frame height at any resolution.
    let font_size = (288.0 * 0.08_f64).round() as i32;
    // The subtitles filter parses its argument itself, so the path needs its
    // own quoting.
    let filter = format!(
        "subtitles='{}':force_style='FontSize={}'",
        srt.display().to_string().replace('\'', r"\'"),
        font_size
    );

    let args = vec![
        "ffmpeg".to_string(),
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-i".to_string(),
        video_in.display().to_string(),
        "-vf".to_string(),
        filter,
        "-c:v".to_string(),
        "libx264".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-preset".to_string(),
        "veryfast".to_string(),
        "-crf".to_string(),
        "22".to_string(),
        "-c:a".to_string(),
        "copy".to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
        out_mp4.display().to_string(),
    ];
    run_cmd(&args).await?;
    Ok(out_mp4.exists())
}

/// Re-frames a landscape render as 9:16 for Shorts, center-cropped with
/// black padding where needed.
pub async fn ffmpeg_make_vertical(in_mp4: &Path, out_mp4: &Path) -> Result<bool> {
    let (_w, h) = match ffprobe_video_dimensions(in_mp4).await {
        Ok(v) => v,
        Err(_) => return Ok(false),
    };
    let dur = match ffprobe_duration_seconds(in_mp4).await {
        Ok(v) => v,
        Err(_) => return Ok(false),
    };

    let mut out_w = ((h as f64) * 9.0 / 16.0 + 0.5) as i32;
    let mut out_h = h;
    out_w &= !1;
    out_h &= !1;

    let filter = format!(
        "[0:v]crop=iw*0.6:ih:iw*0.2:0,scale={}:{},force_original_aspect_ratio=decrease,pad={}:{}:(ow-iw)/2:(oh-ih)/2:black[v]",
        out_w, out_h, out_w, out_h
    );

    let args = vec![
        "ffmpeg".to_string(),
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-i".to_string(),
        in_mp4.display().to_string(),
        "-t".to_string(),
        format!("{:.3}", dur),
        "-filter_complex".to_string(),
        filter,
        "-map".to_string(),
        "[v]".to_string(),
        "-map".to_string(),
        "0:a?".to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-preset".to_string(),
        "veryfast".to_string(),
        "-crf".to_string(),
        "22".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-b:a".to_string(),
        "192k".to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
        out_mp4.display().to_string(),
    ];

    if let Err(err) = run_cmd(&args).await {
        warn!("Vertical render failed: {}", err);
        return Ok(false);
    }

    Ok(out_mp4.exists())
}
