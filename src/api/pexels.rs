use crate::config::Config;
use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

const PEXELS_SEARCH_URL: &str = "https://api.pexels.com/videos/search";

#[derive(Debug, Deserialize)]
struct SearchReply {
    #[serde(default)]
    videos: Vec<VideoEntry>,
}

#[derive(Debug, Deserialize)]
struct VideoEntry {
    #[serde(default)]
    video_files: Vec<VideoFile>,
}

#[derive(Debug, Deserialize)]
struct VideoFile {
    link: String,
}

/// Searches stock videos for `query` and returns direct media URLs,
/// first file per hit. An unhappy status yields an empty list, not an error.
pub async fn search_videos(
    client: &Client,
    cfg: &Config,
    query: &str,
    count: usize,
) -> Result<Vec<String>> {
    let resp = client
        .get(PEXELS_SEARCH_URL)
        .header("Authorization", &cfg.pexels_key)
        .query(&[("query", query), ("per_page", &count.to_string())])
        .timeout(std::time::Duration::from_secs(30))
        .send()
        .await
        .context("Pexels request failed")?;

    let status = resp.status();
    if !status.is_success() {
        warn!("Pexels HTTP {}", status.as_u16());
        return Ok(Vec::new());
    }

    let reply: SearchReply = resp.json().await.context("Pexels response parse failed")?;
    let urls = reply
        .videos
        .into_iter()
        .filter_map(|video| video.video_files.into_iter().next().map(|f| f.link))
        .collect();

    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_maps_to_first_file_links() {
        let raw = r#"{
            "videos": [
                {"video_files": [{"link": "https://cdn.example/a.mp4"}, {"link": "https://cdn.example/a_hd.mp4"}]},
                {"video_files": []},
                {"video_files": [{"link": "https://cdn.example/b.mp4"}]}
            ]
        }"#;
        let reply: SearchReply = serde_json::from_str(raw).unwrap();
        let urls: Vec<String> = reply
            .videos
            .into_iter()
            .filter_map(|video| video.video_files.into_iter().next().map(|f| f.link))
            .collect();
        assert_eq!(urls, vec!["https://cdn.example/a.mp4", "https://cdn.example/b.mp4"]);
    }
}
