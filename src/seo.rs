use std::time::Duration;

use reqwest::Client;
use serde_json::json;

use crate::api::groq::{self, GROQ_CHAT_URL};
use crate::config::Config;
use crate::retry::{execute, CallOutcome, CallPolicy};

/// Upload-ready metadata for one video.
#[derive(Debug, Clone)]
pub struct SeoPackage {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub hashtags: Vec<String>,
}

fn seo_policy() -> CallPolicy {
    CallPolicy::new(
        3,
        Duration::from_secs(5),
        2.0,
        Duration::from_secs(60),
        vec![429, 503],
    )
}

fn strip_decor(line: &str) -> &str {
    line.trim_matches(|c: char| c == '*' || c == '#' || c == '-' || c.is_whitespace())
}

/// Case-insensitive `label` prefix match that never splits a UTF-8 boundary.
fn label_rest<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let head = line.get(..label.len())?;
    if head.eq_ignore_ascii_case(label) {
        Some(&line[label.len()..])
    } else {
        None
    }
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|tag| {
            tag.trim_matches(|c: char| c == '*' || c.is_whitespace())
                .trim_start_matches('#')
                .to_string()
        })
        .filter(|tag| !tag.is_empty())
        .collect()
}

fn split_hashtags(raw: &str) -> Vec<String> {
    raw.split([',', ' '])
        .map(|tag| tag.trim_matches(|c: char| c == '*' || c.is_whitespace()))
        .filter(|tag| !tag.trim_start_matches('#').is_empty())
        .map(|tag| {
            if tag.starts_with('#') {
                tag.to_string()
            } else {
                format!("#{tag}")
            }
        })
        .collect()
}

/// Parses the model's labeled plain-text reply. The title is required;
/// everything else degrades to empty.
fn parse_seo_text(reply: &str) -> anyhow::Result<SeoPackage> {
    let mut title = String::new();
    let mut description: Vec<String> = Vec::new();
    let mut tags = Vec::new();
    let mut hashtags = Vec::new();
    let mut in_description = false;

    for line in reply.lines() {
        let line = strip_decor(line);

        if let Some(rest) =
            label_rest(line, "optimized title:").or_else(|| label_rest(line, "title:"))
        {
            title = strip_decor(rest).to_string();
            in_description = false;
        } else if let Some(rest) = label_rest(line, "description:") {
            let rest = strip_decor(rest);
            if !rest.is_empty() {
                description.push(rest.to_string());
            }
            in_description = true;
        } else if let Some(rest) = label_rest(line, "hashtags:") {
            hashtags = split_hashtags(rest);
            in_description = false;
        } else if let Some(rest) = label_rest(line, "tags:") {
            tags = split_tags(rest);
            in_description = false;
        } else if in_description && !line.is_empty() {
            description.push(line.to_string());
        }
    }

    if title.is_empty() {
        anyhow::bail!("reply missing an optimized title");
    }

    Ok(SeoPackage {
        title,
        description: description.join(" "),
        tags,
        hashtags,
    })
}

/// Deterministic metadata derived from the video title alone. Used when the
/// optimizer never produces a usable reply.
fn fallback_package(video_title: &str) -> SeoPackage {
    let tags: Vec<String> = video_title
        .split_whitespace()
        .map(|word| {
            word.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|word| word.len() > 2)
        .take(10)
        .collect();

    SeoPackage {
        title: video_title.to_string(),
        description: format!("{video_title}. Watch till the end!"),
        tags,
        hashtags: vec![
            "#shorts".to_string(),
            "#viral".to_string(),
            "#trending".to_string(),
        ],
    }
}

/// Asks the model for optimized upload metadata, retrying transient failures
/// and falling back to title-derived metadata once retries run out.
pub async fn optimize(
    client: &Client,
    cfg: &Config,
    video_title: &str,
    script: &str,
) -> CallOutcome<SeoPackage> {
    let messages = json!([
        {"role": "system", "content": "You are a YouTube SEO expert."},
        {
            "role": "user",
            "content": format!(
                "Optimize the metadata for a YouTube Short.\nTitle: {video_title}\nScript: {script}\n\nReply in exactly this format:\nOptimized Title: <title under 100 characters>\nDescription: <2-3 sentence description>\nTags: <comma-separated tags>\nHashtags: <space-separated hashtags>"
            )
        },
    ]);
    let body = groq::chat_body(&cfg.groq_model, messages, 400);

    let policy = seo_policy();
    execute(
        "seo",
        || {
            client
                .post(GROQ_CHAT_URL)
                .bearer_auth(&cfg.groq_key)
                .json(&body)
                .timeout(Duration::from_secs(120))
        },
        &policy,
        |bytes| {
            let raw = std::str::from_utf8(bytes)?;
            let content = groq::extract_message_content(raw)
                .ok_or_else(|| anyhow::anyhow!("no message content in reply"))?;
            parse_seo_text(&content)
        },
        || fallback_package(video_title),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labeled_reply_parses_fully() {
        let reply = "Optimized Title: Rust in 30 Seconds\nDescription: A lightning tour.\nIt covers the borrow checker.\nTags: rust, programming, #systems\nHashtags: #rust shorts";
        let pkg = parse_seo_text(reply).unwrap();
        assert_eq!(pkg.title, "Rust in 30 Seconds");
        assert_eq!(pkg.description, "A lightning tour. It covers the borrow checker.");
        assert_eq!(pkg.tags, vec!["rust", "programming", "systems"]);
        assert_eq!(pkg.hashtags, vec!["#rust", "#shorts"]);
    }

    #[test]
    fn markdown_decorations_are_tolerated() {
        let reply = "**Optimized Title:** Five AI Tricks\n**Description:** Quick rundown.\n**Tags:** ai, tricks\n**Hashtags:** #ai";
        let pkg = parse_seo_text(reply).unwrap();
        assert_eq!(pkg.title, "Five AI Tricks");
        assert_eq!(pkg.description, "Quick rundown.");
    }

    #[test]
    fn missing_title_is_an_error() {
        assert!(parse_seo_text("Description: no title here\nTags: a, b").is_err());
    }

    #[test]
    fn fallback_is_deterministic_and_titled() {
        let pkg = fallback_package("The Quiet Rise of Rust");
        assert_eq!(pkg.title, "The Quiet Rise of Rust");
        assert!(!pkg.description.is_empty());
        assert_eq!(pkg.tags, vec!["the", "quiet", "rise", "rust"]);
        assert_eq!(pkg.hashtags.len(), 3);
        let again = fallback_package("The Quiet Rise of Rust");
        assert_eq!(again.title, pkg.title);
        assert_eq!(again.tags, pkg.tags);
    }

    #[test]
    fn seo_policy_matches_transient_statuses() {
        let policy = seo_policy();
        assert!(policy.is_retryable(429));
        assert!(policy.is_retryable(503));
        assert!(!policy.is_retryable(401));
        assert!(!policy.is_retryable(404));
    }
}
