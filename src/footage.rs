use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use reqwest::Client;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::api::pexels;
use crate::config::Config;

/// Searches stock footage for `query` and downloads up to `count` clips into
/// `dir`. Clips come back shuffled so repeated runs on the same topic do not
/// produce identical videos. Individual download failures are skipped.
pub async fn download_footage(
    client: &Client,
    cfg: &Config,
    query: &str,
    count: usize,
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    let mut urls = pexels::search_videos(client, cfg, query, count).await?;
    if urls.is_empty() {
        anyhow::bail!("No stock footage found for '{}'", query);
    }
    urls.shuffle(&mut rand::thread_rng());

    fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create dir {}", dir.display()))?;

    let mut paths = Vec::new();
    for (idx, url) in urls.iter().enumerate() {
        let out = dir.join(format!("footage_{idx}.mp4"));
        match download_one(client, url, &out).await {
            Ok(()) => {
                info!("Downloaded clip {}: {}", idx, out.display());
                paths.push(out);
            }
            Err(err) => {
                warn!("Clip download failed ({}): {}", url, err);
            }
        }
    }

    if paths.is_empty() {
        anyhow::bail!("All footage downloads failed for '{}'", query);
    }
    Ok(paths)
}

async fn download_one(client: &Client, url: &str, out: &Path) -> Result<()> {
    let mut resp = client
        .get(url)
        .timeout(std::time::Duration::from_secs(300))
        .send()
        .await
        .context("footage request failed")?;

    let status = resp.status();
    if !status.is_success() {
        anyhow::bail!("footage HTTP {}", status.as_u16());
    }

    let mut file = fs::File::create(out)
        .await
        .with_context(|| format!("Failed to create {}", out.display()))?;
    while let Some(chunk) = resp.chunk().await.context("footage stream read failed")? {
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    Ok(())
}
