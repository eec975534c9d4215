use std::fmt;
use std::sync::Arc;

use tokio::sync::RwLock;

use framix_core::{
    FolderScanner, FrameIndexer, JobManager, Registry, Settings,
};

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub jobs: JobManager,
    pub scanner: FolderScanner,
    pub indexer: Arc<dyn FrameIndexer>,
    pub settings: Arc<RwLock<Settings>>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
