use crate::ids::FolderId;

/// Folder scan lifecycle. A folder is registered once and only the scanner
/// advances its status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FolderStatus {
    Scheduled,
    Scanning,
    Scanned,
    Error,
}

/// A directory tracked for video discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Folder {
    #[serde(rename = "folder_id")]
    pub id: FolderId,
    pub path: String,
    pub recursive: bool,
    pub status: FolderStatus,
}

impl Folder {
    pub fn new(path: impl Into<String>, recursive: bool) -> Self {
        Folder {
            id: FolderId::new(),
            path: path.into(),
            recursive,
            status: FolderStatus::Scheduled,
        }
    }
}
