use crate::config::Config;
use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::json;
use tracing::warn;

pub const GROQ_CHAT_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Pulls `choices[0].message.content` out of a chat-completions reply.
pub fn extract_message_content(resp_json: &str) -> Option<String> {
    let root: serde_json::Value = serde_json::from_str(resp_json).ok()?;

    if let Some(err) = root.get("error") {
        if let Some(msg) = err.get("message").and_then(|v| v.as_str()) {
            warn!("Groq error message: {}", msg);
        }
        if let Some(typ) = err.get("type").and_then(|v| v.as_str()) {
            warn!("Groq error type: {}", typ);
        }
        return None;
    }

    root.get("choices")?
        .as_array()?
        .first()?
        .get("message")?
        .get("content")?
        .as_str()
        .map(|s| s.trim().to_string())
}

pub fn chat_body(model: &str, messages: serde_json::Value, max_tokens: u32) -> serde_json::Value {
    json!({
        "model": model,
        "messages": messages,
        "max_tokens": max_tokens,
    })
}

pub async fn chat_completion(
    client: &Client,
    cfg: &Config,
    messages: serde_json::Value,
    max_tokens: u32,
) -> Result<String> {
    let body = chat_body(&cfg.groq_model, messages, max_tokens);

    let resp = client
        .post(GROQ_CHAT_URL)
        .bearer_auth(&cfg.groq_key)
        .json(&body)
        .timeout(std::time::Duration::from_secs(120))
        .send()
        .await
        .context("Groq request failed")?;

    let status = resp.status();
    let raw = resp.text().await.unwrap_or_default();

    if !status.is_success() {
        warn!("Groq HTTP {}", status.as_u16());
        if !raw.is_empty() {
            let snippet = raw.chars().take(800).collect::<String>();
            warn!("Groq raw body: {}", snippet);
        }
        anyhow::bail!("Groq HTTP {}", status.as_u16());
    }

    extract_message_content(&raw).context("Groq response parse failed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_choice_content() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"  hello there  "}}]}"#;
        assert_eq!(extract_message_content(raw).unwrap(), "hello there");
    }

    #[test]
    fn error_payload_yields_none() {
        let raw = r#"{"error":{"message":"bad key","type":"auth"}}"#;
        assert!(extract_message_content(raw).is_none());
    }

    #[test]
    fn missing_choices_yields_none() {
        assert!(extract_message_content(r#"{"object":"chat.completion"}"#).is_none());
        assert!(extract_message_content("not json").is_none());
    }
}
