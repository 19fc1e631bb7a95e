use std::time::Duration;

use anyhow::{Context, Result};
use moka::future::Cache;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

static NON_ALNUM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9\s]").unwrap());
static HASHTAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[#@]\S*").unwrap());
static SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

#[derive(Debug, Deserialize)]
struct TrendingReply {
    #[serde(default)]
    items: Vec<TrendingItem>,
}

#[derive(Debug, Deserialize)]
struct TrendingItem {
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: String,
}

/// Normalizes a raw video title into a usable topic string: hashtags and
/// mentions dropped, punctuation stripped, whitespace collapsed, Title Case.
pub fn clean_video_title(title: &str) -> String {
    let no_tags = HASHTAG_RE.replace_all(title, "");
    let plain = NON_ALNUM_RE.replace_all(&no_tags, "");
    let collapsed = SPACE_RE.replace_all(plain.trim(), " ");

    collapsed
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>()
                    + &chars.as_str().to_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Trending-topic lookup over the platform data API, with a bounded TTL cache
/// so repeated prompts inside one session don't re-hit the quota.
pub struct TrendSource {
    client: Client,
    api_key: String,
    base_url: String,
    cache: Cache<String, Vec<String>>,
}

impl TrendSource {
    pub fn new(client: Client, api_key: String, cache_capacity: u64, cache_ttl: Duration) -> Self {
        Self::with_base_url(client, api_key, YOUTUBE_API_BASE.to_string(), cache_capacity, cache_ttl)
    }

    pub fn with_base_url(
        client: Client,
        api_key: String,
        base_url: String,
        cache_capacity: u64,
        cache_ttl: Duration,
    ) -> Self {
        let cache = Cache::builder()
            .max_capacity(cache_capacity)
            .time_to_live(cache_ttl)
            .build();
        Self {
            client,
            api_key,
            base_url,
            cache,
        }
    }

    /// Fetches cleaned trending titles for the region (optionally narrowed to
    /// a topic). Failures come back as a single sentinel entry, never an Err.
    pub async fn fetch(&self, region: &str, topic: Option<&str>, max_results: usize) -> Vec<String> {
        let cache_key = format!("{}-{}-{}", region, topic.unwrap_or(""), max_results);
        if let Some(cached) = self.cache.get(&cache_key).await {
            info!("Trend cache hit: {}", cache_key);
            return cached;
        }

        match self.fetch_raw(region, topic, max_results).await {
            Ok(raw_titles) => {
                let cleaned: Vec<String> = raw_titles
                    .iter()
                    .filter(|title| title.len() > 5)
                    .map(|title| clean_video_title(title))
                    .filter(|title| !title.is_empty())
                    .collect();
                self.cache.insert(cache_key, cleaned.clone()).await;
                cleaned
            }
            Err(err) => {
                warn!("Trend lookup failed: {}", err);
                vec![format!("Error fetching trends: {err}")]
            }
        }
    }

    async fn fetch_raw(
        &self,
        region: &str,
        topic: Option<&str>,
        max_results: usize,
    ) -> Result<Vec<String>> {
        let max = max_results.to_string();
        let request = match topic {
            Some(topic) => self
                .client
                .get(format!("{}/search", self.base_url))
                .query(&[
                    ("part", "snippet"),
                    ("q", topic),
                    ("type", "video"),
                    ("regionCode", region),
                    ("maxResults", &max),
                    ("order", "viewCount"),
                    ("relevanceLanguage", "en"),
                    ("safeSearch", "moderate"),
                    ("key", &self.api_key),
                ]),
            None => self
                .client
                .get(format!("{}/videos", self.base_url))
                .query(&[
                    ("part", "snippet"),
                    ("chart", "mostPopular"),
                    ("regionCode", region),
                    ("maxResults", &max),
                    ("key", &self.api_key),
                ]),
        };

        let resp = request
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .context("trending request failed")?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("trending HTTP {}", status.as_u16());
        }

        let reply: TrendingReply = resp.json().await.context("trending response parse failed")?;
        Ok(reply
            .items
            .into_iter()
            .map(|item| item.snippet.title)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_cleanup_strips_tags_and_punctuation() {
        assert_eq!(
            clean_video_title("AI takes over!! #shorts @creator"),
            "Ai Takes Over"
        );
        assert_eq!(clean_video_title("  spaced   out  title "), "Spaced Out Title");
        assert_eq!(clean_video_title("100% Pure *Chaos*"), "100 Pure Chaos");
    }

    #[test]
    fn title_cleanup_title_cases_words() {
        assert_eq!(clean_video_title("the quiet rise of rust"), "The Quiet Rise Of Rust");
    }

    #[test]
    fn all_symbol_title_cleans_to_empty() {
        assert_eq!(clean_video_title("#### @@@"), "");
    }
}
