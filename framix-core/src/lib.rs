//! Core library for the Framix video indexing daemon.
//!
//! The pieces fit together like this: the [`registry::Registry`] is the
//! single concurrency-safe owner of every video, job, and folder record;
//! the [`jobs::JobManager`] drives the extract-then-index pipeline as one
//! background task per job; the [`scan::FolderScanner`] discovers video
//! files and feeds them into the pipeline. Frame extraction and the vector
//! search service are collaborators behind the [`extract::FrameExtractor`]
//! and [`search::FrameIndexer`] seams.
//!
//! Everything is process-lifetime state; nothing here persists across a
//! restart.

pub mod api_types;
pub mod error;
pub mod extract;
pub mod jobs;
pub mod registry;
pub mod scan;
pub mod search;
pub mod settings;

pub use error::{CoreError, Result};
pub use extract::{ExtractionSpec, FfmpegExtractor, FrameExtractor};
pub use jobs::JobManager;
pub use registry::{Registry, CANCELLED_ERROR};
pub use scan::FolderScanner;
pub use search::{
    FrameIndexer, SearchHit, UploadFrame, VectorServiceClient,
    VideoSearchResult,
};
pub use settings::{Settings, DEFAULT_VIDEO_FILE_EXTENSIONS};
