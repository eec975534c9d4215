//! Folder discovery: walk a directory, register every video file exactly
//! once, and kick off the pipeline for each newly discovered one.
//!
//! Scans are fire-and-forget; the caller gets the folder record back in
//! `scanning` state and polls for completion. A failed enumeration marks the
//! folder `error` but keeps whatever was already registered.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};
use walkdir::WalkDir;

use framix_model::{Folder, FolderId, FolderStatus};

use crate::error::Result;
use crate::jobs::JobManager;
use crate::registry::Registry;
use crate::settings::Settings;

/// Discovers video files under registered folders.
#[derive(Clone)]
pub struct FolderScanner {
    registry: Arc<Registry>,
    jobs: JobManager,
    settings: Arc<RwLock<Settings>>,
}

impl fmt::Debug for FolderScanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FolderScanner")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl FolderScanner {
    pub fn new(
        registry: Arc<Registry>,
        jobs: JobManager,
        settings: Arc<RwLock<Settings>>,
    ) -> Self {
        FolderScanner {
            registry,
            jobs,
            settings,
        }
    }

    /// Register a folder and, if it is new, start scanning it in the
    /// background. Returns the folder snapshot plus whether it already
    /// existed (an existing folder is not re-scanned).
    pub async fn register_and_scan(
        &self,
        path: &str,
        recursive: bool,
    ) -> Result<(Folder, bool)> {
        let (folder, existed) =
            self.registry.register_folder(path, recursive).await?;
        if existed {
            return Ok((folder, true));
        }

        let folder = self
            .registry
            .set_folder_status(&folder.id, FolderStatus::Scanning)
            .await
            .unwrap_or(folder);

        let scanner = self.clone();
        let folder_id = folder.id.clone();
        let root = PathBuf::from(path);
        tokio::spawn(async move {
            scanner.scan(folder_id, root, recursive).await;
        });
        Ok((folder, false))
    }

    async fn scan(&self, folder_id: FolderId, root: PathBuf, recursive: bool) {
        let extensions = self.settings.read().await.video_extensions.clone();
        let walk_root = root.clone();
        let listed = tokio::task::spawn_blocking(move || {
            collect_video_paths(&walk_root, recursive, &extensions)
        })
        .await;

        let paths = match listed {
            Ok(Ok(paths)) => paths,
            Ok(Err(err)) => {
                warn!(folder = %folder_id, root = %root.display(), error = %err, "folder scan failed");
                self.registry
                    .set_folder_status(&folder_id, FolderStatus::Error)
                    .await;
                return;
            }
            Err(err) => {
                warn!(folder = %folder_id, error = %err, "folder scan task aborted");
                self.registry
                    .set_folder_status(&folder_id, FolderStatus::Error)
                    .await;
                return;
            }
        };

        let mut discovered = 0usize;
        for path in paths {
            let path_str = path.to_string_lossy().into_owned();
            match self.registry.register_video(&path_str, None).await {
                Ok((video_id, already_existed)) => {
                    if already_existed {
                        continue;
                    }
                    discovered += 1;
                    if let Err(err) =
                        self.jobs.start_job(&video_id, false).await
                    {
                        warn!(video = %video_id, error = %err, "failed to start job for discovered video");
                    }
                }
                Err(err) => {
                    warn!(path = %path_str, error = %err, "failed to register discovered video");
                }
            }
        }

        self.registry
            .set_folder_status(&folder_id, FolderStatus::Scanned)
            .await;
        info!(folder = %folder_id, root = %root.display(), discovered, "folder scan complete");
    }
}

/// Enumerate video files under `root`: immediate children only unless
/// `recursive`, filtered by the extension allow-list, sorted for stable
/// registration order.
fn collect_video_paths(
    root: &Path,
    recursive: bool,
    extensions: &[String],
) -> std::io::Result<Vec<PathBuf>> {
    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut paths = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .follow_links(false)
    {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        if is_video_file(entry.path(), extensions) {
            paths.push(entry.into_path());
        }
    }
    paths.sort();
    Ok(paths)
}

/// Extension check against the allow-list, case-insensitive.
fn is_video_file(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            extensions.iter().any(|allowed| *allowed == ext)
        })
        .unwrap_or(false)
}
