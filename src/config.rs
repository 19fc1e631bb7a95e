use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "groq_api_key")]
    pub groq_key: String,
    #[serde(rename = "youtube_api_key")]
    pub youtube_key: String,
    #[serde(rename = "pexels_api_key")]
    pub pexels_key: String,
    #[serde(rename = "huggingface_api_key")]
    pub huggingface_key: String,
    #[serde(rename = "youtube_client_id")]
    #[serde(default)]
    pub upload_client_id: String,
    #[serde(rename = "youtube_client_secret")]
    #[serde(default)]
    pub upload_client_secret: String,
    #[serde(rename = "youtube_refresh_token")]
    #[serde(default)]
    pub upload_refresh_token: String,
    #[serde(rename = "default_region")]
    #[serde(default = "default_region")]
    pub default_region: String,
    #[serde(rename = "max_results")]
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(rename = "groq_model")]
    #[serde(default = "default_groq_model")]
    pub groq_model: String,
    #[serde(rename = "upload_category_id")]
    #[serde(default = "default_category_id")]
    pub upload_category_id: String,
    #[serde(rename = "upload_privacy_status")]
    #[serde(default = "default_privacy_status")]
    pub upload_privacy_status: String,
}

fn default_region() -> String {
    "US".to_string()
}

fn default_max_results() -> usize {
    5
}

fn default_groq_model() -> String {
    "mixtral-8x7b-32768".to_string()
}

fn default_category_id() -> String {
    // "People & Blogs"
    "22".to_string()
}

fn default_privacy_status() -> String {
    "private".to_string()
}

impl Config {
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
        let config: Config = serde_json::from_str(&content)?;

        if config.groq_key.is_empty() {
            anyhow::bail!("config.json: groq_api_key missing");
        }
        if config.youtube_key.is_empty() {
            anyhow::bail!("config.json: youtube_api_key missing");
        }
        if config.pexels_key.is_empty() {
            anyhow::bail!("config.json: pexels_api_key missing");
        }
        if config.huggingface_key.is_empty() {
            anyhow::bail!("config.json: huggingface_api_key missing");
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_optional_fields() {
        let raw = r#"{
            "groq_api_key": "g",
            "youtube_api_key": "y",
            "pexels_api_key": "p",
            "huggingface_api_key": "h"
        }"#;
        let cfg: Config = serde_json::from_str(raw).unwrap();
        assert_eq!(cfg.default_region, "US");
        assert_eq!(cfg.max_results, 5);
        assert_eq!(cfg.groq_model, "mixtral-8x7b-32768");
        assert_eq!(cfg.upload_category_id, "22");
        assert_eq!(cfg.upload_privacy_status, "private");
        assert!(cfg.upload_refresh_token.is_empty());
    }
}
