use chrono::{DateTime, Utc};

/// Process-lifetime cloud link bookkeeping surfaced to callers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct CloudStatus {
    pub user_id: String,
    pub connected: bool,
    pub last_successful_upload: Option<DateTime<Utc>>,
    pub pending_batches: u32,
}
