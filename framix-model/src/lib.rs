//! Core data model definitions shared across Framix crates.
#![allow(missing_docs)]

pub mod cloud;
pub mod folder;
pub mod ids;
pub mod job;
pub mod video;

// Intentionally curated re-exports for downstream consumers.
pub use cloud::CloudStatus;
pub use folder::{Folder, FolderStatus};
pub use ids::{FolderId, JobId, VideoId};
pub use job::{Job, JobKind, JobStatus};
pub use video::{IndexStatus, Video};
