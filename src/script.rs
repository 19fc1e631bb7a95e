use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde_json::json;

use crate::api::groq;
use crate::config::Config;

const MAX_NARRATION_WORDS: usize = 75;

static BRACKETED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[.*?\]").unwrap());
static SPEAKER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\bNarrator\b\s*[:"]*"#).unwrap());
static CURLY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[{}]").unwrap());
static EDGE_QUOTE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^\s*"|"\s*$"#).unwrap());
static NON_SPOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s.,'!?]").unwrap());
static SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static WORD_COUNT_NOTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Total word count.*").unwrap());
static LIST_MARKER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(?:\d+[.)]|[-*])\s*").unwrap());

/// Strips everything a narrator should not read aloud: stage directions in
/// brackets, speaker labels, markup braces, wrapping quotes, non-spoken
/// symbols, and trailing word-count notes. Long scripts are cut to roughly
/// thirty seconds of speech.
pub fn clean_script_for_voice(script: &str) -> String {
    let script = BRACKETED_RE.replace_all(script, "");
    let script = SPEAKER_RE.replace_all(&script, "");
    let script = CURLY_RE.replace_all(&script, "");
    let script = EDGE_QUOTE_RE.replace_all(&script, "");
    let script = NON_SPOKEN_RE.replace_all(&script, "");
    let script = SPACE_RE.replace_all(&script, " ");
    let script = WORD_COUNT_NOTE_RE.replace_all(script.trim(), "");
    let script = script.trim();

    let words: Vec<&str> = script.split_whitespace().collect();
    if words.len() > MAX_NARRATION_WORDS {
        let mut out = words[..MAX_NARRATION_WORDS].join(" ");
        out.push_str("...");
        return out;
    }

    script.to_string()
}

fn strip_list_marker(line: &str) -> String {
    LIST_MARKER_RE.replace(line, "").trim().to_string()
}

/// Asks the language model for five candidate video titles about `topic`,
/// one per line.
pub async fn generate_titles(client: &Client, cfg: &Config, topic: &str) -> Result<Vec<String>> {
    let messages = json!([
        {"role": "system", "content": "You are an expert YouTube content strategist."},
        {
            "role": "user",
            "content": format!(
                "Generate exactly 5 unique, trending, and engaging YouTube video titles about {}. Return each title as a separate line.",
                topic
            )
        },
    ]);

    let reply = groq::chat_completion(client, cfg, messages, 200)
        .await
        .context("title generation failed")?;

    let titles: Vec<String> = reply
        .lines()
        .map(strip_list_marker)
        .filter(|line| !line.is_empty())
        .collect();

    Ok(titles)
}

/// Generates a short narration script for the chosen title and cleans it for
/// speech synthesis.
pub async fn generate_script(client: &Client, cfg: &Config, title: &str) -> Result<String> {
    let messages = json!([
        {
            "role": "user",
            "content": format!(
                "Write a complete and engaging 30-second YouTube script for the title: '{}'.\nMake sure it covers all key details in a short and impactful way, like a viral YouTube Short.\nUse concise sentences, avoid unnecessary repetition, and provide a clear summary of the topic in 70-80 words.",
                title
            )
        },
    ]);

    let raw = groq::chat_completion(client, cfg, messages, 300)
        .await
        .context("script generation failed")?;

    Ok(clean_script_for_voice(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleanup_removes_stage_directions_and_labels() {
        let raw = r#"Narrator: "Welcome back! [dramatic music] Today we cover {AI}.""#;
        assert_eq!(clean_script_for_voice(raw), "Welcome back! Today we cover AI.");
    }

    #[test]
    fn cleanup_drops_word_count_note() {
        let raw = "Short and punchy. Total word count: 42 words.";
        assert_eq!(clean_script_for_voice(raw), "Short and punchy.");
    }

    #[test]
    fn cleanup_truncates_long_scripts() {
        let raw = (0..120).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ");
        let cleaned = clean_script_for_voice(&raw);
        assert_eq!(cleaned.split_whitespace().count(), MAX_NARRATION_WORDS);
        assert!(cleaned.ends_with("..."));
    }

    #[test]
    fn cleanup_normalizes_whitespace() {
        assert_eq!(clean_script_for_voice("one\n\ntwo\tthree "), "one two three");
    }

    #[test]
    fn list_markers_are_stripped_from_titles() {
        assert_eq!(strip_list_marker("1. Five AI Tricks"), "Five AI Tricks");
        assert_eq!(strip_list_marker("2) Hidden Gems"), "Hidden Gems");
        assert_eq!(strip_list_marker("- Bullet Title"), "Bullet Title");
        assert_eq!(strip_list_marker("Plain Title"), "Plain Title");
    }
}
