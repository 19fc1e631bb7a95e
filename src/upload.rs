use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

use crate::config::Config;
use crate::seo::SeoPackage;

const OAUTH_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const UPLOAD_URL: &str = "https://www.googleapis.com/upload/youtube/v3/videos";
const THUMBNAIL_URL: &str = "https://www.googleapis.com/upload/youtube/v3/thumbnails/set";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("video file missing: {0}")]
    MissingVideo(PathBuf),
    #[error("token refresh failed: {0}")]
    Auth(String),
    #[error("upload rejected: HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("upload transport failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upload io failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Deserialize)]
struct TokenReply {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UploadReply {
    id: String,
}

async fn refresh_access_token(client: &Client, cfg: &Config) -> Result<String, UploadError> {
    let resp = client
        .post(OAUTH_TOKEN_URL)
        .form(&[
            ("client_id", cfg.upload_client_id.as_str()),
            ("client_secret", cfg.upload_client_secret.as_str()),
            ("refresh_token", cfg.upload_refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ])
        .timeout(Duration::from_secs(30))
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(UploadError::Auth(format!("HTTP {}: {}", status.as_u16(), body)));
    }

    let reply: TokenReply = resp
        .json()
        .await
        .map_err(|err| UploadError::Auth(err.to_string()))?;
    Ok(reply.access_token)
}

fn upload_metadata(cfg: &Config, seo: &SeoPackage) -> serde_json::Value {
    let mut description = seo.description.clone();
    if !seo.hashtags.is_empty() {
        description.push_str("\n\n");
        description.push_str(&seo.hashtags.join(" "));
    }

    json!({
        "snippet": {
            "title": seo.title,
            "description": description,
            "tags": seo.tags,
            "categoryId": cfg.upload_category_id,
        },
        "status": {
            "privacyStatus": cfg.upload_privacy_status,
        },
    })
}

/// Uploads the finished video with its metadata and returns the new video id.
/// A missing or rejected video is fatal, a failed thumbnail set is not.
pub async fn upload_video(
    client: &Client,
    cfg: &Config,
    video_path: &Path,
    seo: &SeoPackage,
    thumbnail: Option<&Path>,
) -> Result<String, UploadError> {
    let video_bytes = match fs::read(video_path).await {
        Ok(bytes) => bytes,
        Err(_) => return Err(UploadError::MissingVideo(video_path.to_path_buf())),
    };

    let token = refresh_access_token(client, cfg).await?;
    let metadata = upload_metadata(cfg, seo);

    let form = Form::new()
        .part(
            "metadata",
            Part::text(metadata.to_string()).mime_str("application/json")?,
        )
        .part(
            "video",
            Part::bytes(video_bytes)
                .file_name("video.mp4")
                .mime_str("video/mp4")?,
        );

    let resp = client
        .post(UPLOAD_URL)
        .query(&[("uploadType", "multipart"), ("part", "snippet,status")])
        .bearer_auth(&token)
        .multipart(form)
        .timeout(Duration::from_secs(600))
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(UploadError::Rejected {
            status: status.as_u16(),
            body: body.chars().take(300).collect(),
        });
    }

    let reply: UploadReply = resp.json().await?;
    info!("Upload complete: video id {}", reply.id);

    if let Some(thumb) = thumbnail {
        if let Err(err) = set_thumbnail(client, &token, &reply.id, thumb).await {
            warn!("Thumbnail set failed, video stays up without it: {}", err);
        }
    }

    Ok(reply.id)
}

async fn set_thumbnail(
    client: &Client,
    token: &str,
    video_id: &str,
    thumb_path: &Path,
) -> Result<(), UploadError> {
    let bytes = fs::read(thumb_path).await?;

    let resp = client
        .post(THUMBNAIL_URL)
        .query(&[("videoId", video_id)])
        .bearer_auth(token)
        .header("Content-Type", "image/png")
        .body(bytes)
        .timeout(Duration::from_secs(60))
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        return Err(UploadError::Rejected {
            status: status.as_u16(),
            body: resp.text().await.unwrap_or_default().chars().take(300).collect(),
        });
    }

    info!("Thumbnail set for video {}", video_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_seo() -> SeoPackage {
        SeoPackage {
            title: "Rust in 30 Seconds".to_string(),
            description: "A lightning tour.".to_string(),
            tags: vec!["rust".to_string()],
            hashtags: vec!["#rust".to_string(), "#shorts".to_string()],
        }
    }

    fn sample_config() -> Config {
        serde_json::from_str(
            r#"{
                "groq_api_key": "g",
                "youtube_api_key": "y",
                "pexels_api_key": "p",
                "huggingface_api_key": "h"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn metadata_appends_hashtags_to_description() {
        let meta = upload_metadata(&sample_config(), &sample_seo());
        assert_eq!(meta["snippet"]["title"], "Rust in 30 Seconds");
        assert_eq!(
            meta["snippet"]["description"],
            "A lightning tour.\n\n#rust #shorts"
        );
        assert_eq!(meta["status"]["privacyStatus"], "private");
        assert_eq!(meta["snippet"]["categoryId"], "22");
    }

    #[test]
    fn metadata_without_hashtags_keeps_description_plain() {
        let mut seo = sample_seo();
        seo.hashtags.clear();
        let meta = upload_metadata(&sample_config(), &seo);
        assert_eq!(meta["snippet"]["description"], "A lightning tour.");
    }
}
