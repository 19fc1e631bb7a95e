use std::path::PathBuf;

/// Topic picked for this run, either hand-entered or taken from trends.
#[derive(Debug, Clone)]
pub struct TopicSelection {
    pub topic: String,
    pub region: String,
}

/// Title plus cleaned narration text ready for speech synthesis.
#[derive(Debug, Clone)]
pub struct ScriptPackage {
    pub title: String,
    pub script: String,
}

/// Synthesized narration on disk.
#[derive(Debug, Clone)]
pub struct AudioTrack {
    pub path: PathBuf,
    pub duration_secs: f64,
}

/// Stitched background footage with narration audio applied.
#[derive(Debug, Clone)]
pub struct AssembledVideo {
    pub path: PathBuf,
    pub duration_secs: f64,
}

/// Final render with captions burned in, ready for upload.
#[derive(Debug, Clone)]
pub struct SubtitledVideo {
    pub path: PathBuf,
    pub srt_path: PathBuf,
}
