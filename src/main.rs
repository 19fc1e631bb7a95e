use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{info, warn};

use shortform_factory::artifacts::{ScriptPackage, TopicSelection};
use shortform_factory::config::Config;
use shortform_factory::generator;
use shortform_factory::init;
use shortform_factory::script;
use shortform_factory::trends::TrendSource;

const TREND_CACHE_CAPACITY: u64 = 10;
const TREND_CACHE_TTL: Duration = Duration::from_secs(600);

async fn prompt(lines: &mut Lines<BufReader<Stdin>>, question: &str) -> Result<String> {
    println!("{question}");
    let line = lines.next_line().await?.unwrap_or_default();
    Ok(line.trim().to_string())
}

fn pick_index(input: &str, len: usize) -> usize {
    input
        .parse::<usize>()
        .ok()
        .filter(|n| (1..=len).contains(n))
        .map(|n| n - 1)
        .unwrap_or(0)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    init::ensure_directories().await?;
    if !init::check_ffmpeg().await {
        warn!("FFmpeg not found in PATH. Please install FFmpeg.");
    }

    let cfg = Config::load("config.json").await?;
    let client = reqwest::Client::builder()
        .build()
        .context("Failed to build HTTP client")?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let asked = prompt(
        &mut lines,
        &format!("Region code (default {}):", cfg.default_region),
    )
    .await?;
    let region = if asked.is_empty() {
        cfg.default_region.clone()
    } else {
        asked.to_uppercase()
    };

    let typed = prompt(&mut lines, "Enter a topic (leave blank to use trending):").await?;
    let topic = if typed.is_empty() {
        let source = TrendSource::new(
            client.clone(),
            cfg.youtube_key.clone(),
            TREND_CACHE_CAPACITY,
            TREND_CACHE_TTL,
        );
        let trends = source.fetch(&region, None, cfg.max_results).await;
        if trends.is_empty() {
            anyhow::bail!("No trending topics available");
        }
        println!("\nTrending now:");
        for (idx, trend) in trends.iter().enumerate() {
            println!("  {}. {}", idx + 1, trend);
        }
        let choice = prompt(&mut lines, "Pick a topic number (default 1):").await?;
        trends[pick_index(&choice, trends.len())].clone()
    } else {
        typed
    };

    let selection = TopicSelection { topic, region };
    info!("Topic: {}", selection.topic);

    let titles = script::generate_titles(&client, &cfg, &selection.topic).await?;
    if titles.is_empty() {
        anyhow::bail!("Title generation returned nothing");
    }
    println!("\nSuggested titles:");
    for (idx, title) in titles.iter().enumerate() {
        println!("  {}. {}", idx + 1, title);
    }
    let choice = prompt(&mut lines, "Pick a title number (default 1):").await?;
    let title = titles[pick_index(&choice, titles.len())].clone();

    let script_text = script::generate_script(&client, &cfg, &title).await?;
    if script_text.is_empty() {
        anyhow::bail!("Script generation returned nothing");
    }
    println!("\nScript:\n{script_text}\n");

    let package = ScriptPackage {
        title,
        script: script_text,
    };
    let video = generator::produce_short(&cfg, &client, &selection, &package).await?;
    println!("Video ready: {}", video.path.display());

    if cfg.upload_refresh_token.is_empty() {
        info!("Upload credentials not configured, skipping publish");
        return Ok(());
    }

    let answer = prompt(&mut lines, "Upload to YouTube now? [y/N]:").await?;
    if answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes") {
        let video_id = generator::publish(&cfg, &client, &package, &video).await?;
        println!("Uploaded: https://youtu.be/{video_id}");
    } else {
        info!("Upload skipped");
    }

    Ok(())
}
