use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client;
use serde_json::json;
use tokio::fs;
use tracing::{info, warn};

use crate::config::Config;
use crate::retry::{execute, CallOutcome, CallPolicy};

const HF_INFERENCE_URL: &str =
    "https://api-inference.huggingface.co/models/stabilityai/stable-diffusion-2";

fn thumbnail_policy() -> CallPolicy {
    // 503 is the model-still-loading reply, worth waiting out.
    CallPolicy::new(
        3,
        Duration::from_secs(10),
        2.0,
        Duration::from_secs(60),
        vec![429, 503],
    )
}

fn parse_image_bytes(bytes: &[u8]) -> anyhow::Result<Vec<u8>> {
    if bytes.is_empty() {
        anyhow::bail!("empty image body");
    }
    // A JSON body on 200 means the service answered with a status blob
    // instead of an image.
    if bytes.starts_with(b"{") || bytes.starts_with(b"[") {
        anyhow::bail!("image endpoint returned JSON instead of image data");
    }
    Ok(bytes.to_vec())
}

/// Renders a thumbnail for `title` via the image-generation endpoint. The
/// thumbnail is decorative: every failure path yields `None` and the run
/// continues without one.
pub async fn generate(
    client: &Client,
    cfg: &Config,
    title: &str,
    out_png_path: &Path,
) -> Option<PathBuf> {
    if fs::metadata(out_png_path).await.is_ok() {
        if let Err(err) = fs::remove_file(out_png_path).await {
            warn!("Could not remove stale thumbnail: {}", err);
            return None;
        }
    }

    let prompt = format!(
        "YouTube thumbnail, bold vibrant colors, high contrast, cinematic lighting: {title}"
    );
    let body = json!({ "inputs": prompt });

    let policy = thumbnail_policy();
    let outcome: CallOutcome<Option<Vec<u8>>> = execute(
        "thumbnail",
        || {
            client
                .post(HF_INFERENCE_URL)
                .bearer_auth(&cfg.huggingface_key)
                .json(&body)
                .timeout(Duration::from_secs(120))
        },
        &policy,
        |bytes| parse_image_bytes(bytes).map(Some),
        || None,
    )
    .await;

    let bytes = match outcome {
        CallOutcome::Success(Some(bytes)) => bytes,
        CallOutcome::Success(None) | CallOutcome::ExhaustedRetries(_) => {
            warn!("Thumbnail generation exhausted retries, continuing without one");
            return None;
        }
        CallOutcome::FatalError(reason) => {
            warn!("Thumbnail generation failed: {}", reason);
            return None;
        }
    };

    if let Err(err) = fs::write(out_png_path, &bytes).await {
        warn!("Could not write thumbnail: {}", err);
        return None;
    }

    info!("Thumbnail saved: {}", out_png_path.display());
    Some(out_png_path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_bytes_pass_through() {
        let png = [0x89u8, 0x50, 0x4E, 0x47, 0x0D, 0x0A];
        assert_eq!(parse_image_bytes(&png).unwrap(), png.to_vec());
    }

    #[test]
    fn empty_and_json_bodies_are_rejected() {
        assert!(parse_image_bytes(b"").is_err());
        assert!(parse_image_bytes(b"{\"estimated_time\":20.0}").is_err());
        assert!(parse_image_bytes(b"[\"queued\"]").is_err());
    }

    #[test]
    fn policy_treats_loading_as_transient() {
        let policy = thumbnail_policy();
        assert!(policy.is_retryable(503));
        assert!(!policy.is_retryable(400));
    }
}
