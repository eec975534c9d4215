#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum_test::TestServer;
use tempfile::TempDir;
use tokio::sync::{Notify, RwLock};

use framix_core::{
    CoreError, ExtractionSpec, FolderScanner, FrameExtractor, FrameIndexer,
    JobManager, Registry, Settings, UploadFrame, VideoSearchResult,
};
use framix_model::{IndexStatus, Job, Video, VideoId};
use framix_server::{routes, AppState};

/// Extraction stub: writes a fixed number of frame files, optionally
/// holding until the test releases it, optionally failing afterwards.
pub struct StubExtractor {
    pub frames: usize,
    pub hold: Option<Arc<Notify>>,
    pub fail: bool,
}

impl StubExtractor {
    pub fn writing(frames: usize) -> Self {
        StubExtractor {
            frames,
            hold: None,
            fail: false,
        }
    }
}

#[async_trait]
impl FrameExtractor for StubExtractor {
    async fn extract(
        &self,
        _input: &Path,
        frames_dir: &Path,
        _spec: &ExtractionSpec,
    ) -> framix_core::Result<()> {
        tokio::fs::create_dir_all(frames_dir).await?;
        for n in 1..=self.frames {
            let name = format!("frame_{n:05}.jpg");
            tokio::fs::write(frames_dir.join(name), b"jpeg").await?;
        }
        if let Some(hold) = &self.hold {
            hold.notified().await;
        }
        if self.fail {
            return Err(CoreError::Extraction(
                "stub extractor failed".to_string(),
            ));
        }
        Ok(())
    }
}

/// Indexing stub: accepts uploads until a scripted failure point and
/// answers searches with canned results.
pub struct StubIndexer {
    pub uploads: AtomicU64,
    pub fail_on_frame: Option<u64>,
    pub results: Vec<VideoSearchResult>,
}

impl StubIndexer {
    pub fn accepting() -> Self {
        StubIndexer {
            uploads: AtomicU64::new(0),
            fail_on_frame: None,
            results: Vec::new(),
        }
    }

    pub fn failing_on(frame: u64) -> Self {
        StubIndexer {
            uploads: AtomicU64::new(0),
            fail_on_frame: Some(frame),
            results: Vec::new(),
        }
    }

    pub fn with_results(results: Vec<VideoSearchResult>) -> Self {
        StubIndexer {
            uploads: AtomicU64::new(0),
            fail_on_frame: None,
            results,
        }
    }
}

#[async_trait]
impl FrameIndexer for StubIndexer {
    async fn upload_frame(
        &self,
        frame: &UploadFrame,
    ) -> framix_core::Result<String> {
        if self.fail_on_frame == Some(frame.frame_number) {
            return Err(CoreError::Indexing(
                "stub indexer rejected the frame".to_string(),
            ));
        }
        self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(format!("img_{}", frame.frame_number))
    }

    async fn search(
        &self,
        _query: &str,
        _top_k: usize,
        _cluster_threshold: f64,
    ) -> framix_core::Result<Vec<VideoSearchResult>> {
        Ok(self.results.clone())
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    _tempdir: TempDir,
}

/// Wire the full router against stub collaborators and a throwaway frames
/// root.
pub fn build_test_app(
    extractor: StubExtractor,
    indexer: Arc<StubIndexer>,
) -> TestApp {
    let tempdir =
        tempfile::tempdir().expect("failed to create temporary directory");
    let settings = Settings {
        frames_root: tempdir.path().join("frames"),
        ..Settings::default()
    };

    let registry = Arc::new(Registry::new(settings.cloud_user_id.clone()));
    let indexer: Arc<dyn FrameIndexer> = indexer;
    let settings = Arc::new(RwLock::new(settings));
    let jobs = JobManager::new(
        Arc::clone(&registry),
        Arc::new(extractor),
        Arc::clone(&indexer),
        Arc::clone(&settings),
    );
    let scanner = FolderScanner::new(
        Arc::clone(&registry),
        jobs.clone(),
        Arc::clone(&settings),
    );
    let state = AppState {
        registry,
        jobs,
        scanner,
        indexer,
        settings,
    };

    let router = routes::create_api_router().with_state(state.clone());
    let server = TestServer::new(router).expect("failed to build test server");
    TestApp {
        server,
        state,
        _tempdir: tempdir,
    }
}

pub async fn wait_for_terminal_job(state: &AppState, video_id: &VideoId) -> Job {
    for _ in 0..400 {
        let jobs = state.registry.jobs().await;
        if let Some(job) = jobs
            .iter()
            .find(|job| job.video_id == *video_id && job.status.is_terminal())
        {
            return job.clone();
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("no job for video {video_id} reached a terminal state");
}

pub async fn wait_for_video_status(
    state: &AppState,
    video_id: &VideoId,
    status: IndexStatus,
) -> Video {
    for _ in 0..400 {
        if let Some(video) = state.registry.video(video_id).await {
            if video.index_status == status {
                return video;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("video {video_id} never reached {status:?}");
}
