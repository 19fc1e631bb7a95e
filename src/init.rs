use anyhow::Result;
use std::path::Path;
use tokio::fs;
use tracing::info;

const REQUIRED_DIRS: &[&str] = &["output"];

pub async fn ensure_directories() -> Result<()> {
    for dir in REQUIRED_DIRS {
        if !Path::new(dir).exists() {
            fs::create_dir_all(dir).await?;
            info!("Created directory: {}", dir);
        }
    }
    Ok(())
}

pub async fn check_ffmpeg() -> bool {
    match tokio::process::Command::new("ffmpeg")
        .arg("-version")
        .output()
        .await
    {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}
