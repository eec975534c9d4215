//! Frame extraction collaborator boundary.
//!
//! Production extraction shells out to ffmpeg the same way the transcoding
//! path would: one process per video, writing zero-padded sequentially
//! numbered JPEGs into a per-video directory. The zero padding matters:
//! lexicographic order of the file names is the temporal order the indexing
//! phase relies on.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{CoreError, Result};

pub const FRAME_FILE_PREFIX: &str = "frame_";
pub const FRAME_FILE_SUFFIX: &str = ".jpg";

/// Parameters a single extraction run is invoked with.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionSpec {
    pub frame_rate: f64,
    pub frame_size: (u32, u32),
}

/// Seam between the job pipeline and the actual extraction engine.
/// Implementations must be safe to re-invoke for the same video: frame
/// files are overwritten, never appended.
#[async_trait]
pub trait FrameExtractor: Send + Sync {
    async fn extract(
        &self,
        input: &Path,
        frames_dir: &Path,
        spec: &ExtractionSpec,
    ) -> Result<()>;
}

/// Extraction via the ffmpeg CLI.
#[derive(Debug, Clone)]
pub struct FfmpegExtractor {
    ffmpeg_path: String,
}

impl FfmpegExtractor {
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        FfmpegExtractor {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }
}

impl Default for FfmpegExtractor {
    fn default() -> Self {
        FfmpegExtractor::new("ffmpeg")
    }
}

#[async_trait]
impl FrameExtractor for FfmpegExtractor {
    async fn extract(
        &self,
        input: &Path,
        frames_dir: &Path,
        spec: &ExtractionSpec,
    ) -> Result<()> {
        tokio::fs::create_dir_all(frames_dir).await?;

        let filter = format!(
            "fps={},scale={}:{}",
            spec.frame_rate, spec.frame_size.0, spec.frame_size.1
        );
        let pattern =
            frames_dir.join(format!("{FRAME_FILE_PREFIX}%05d{FRAME_FILE_SUFFIX}"));

        let output = Command::new(&self.ffmpeg_path)
            .arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-i")
            .arg(input)
            .arg("-vf")
            .arg(filter)
            .arg("-qscale:v")
            .arg("1")
            .arg("-y")
            .arg(&pattern)
            .output()
            .await
            .map_err(|err| {
                CoreError::Extraction(format!(
                    "spawn {}: {err}",
                    self.ffmpeg_path
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CoreError::Extraction(format!(
                "{} exited with {}: {}",
                self.ffmpeg_path,
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// Per-video frames directory, derived from the source filename with its
/// extension stripped.
pub fn frames_dir_for(frames_root: &Path, video_path: &str) -> PathBuf {
    let stem = Path::new(video_path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    frames_root.join(stem)
}

/// Frame files currently present in a directory, lexicographically sorted.
/// A directory that does not exist yet reads as empty, not as an error.
pub async fn list_frame_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err),
    };

    let mut frames = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            continue;
        }
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(FRAME_FILE_PREFIX) && name.ends_with(FRAME_FILE_SUFFIX)
        {
            frames.push(entry.path());
        }
    }
    frames.sort();
    Ok(frames)
}
