use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use framix_core::api_types::RegisterFolderResponse;
use framix_model::{Folder, FolderStatus, Video};

mod common;
use common::{build_test_app, StubExtractor, StubIndexer, TestApp};

async fn wait_for_folder_status(
    app: &TestApp,
    folder_id: &str,
    status: FolderStatus,
) -> Folder {
    for _ in 0..400 {
        let folders: Vec<Folder> =
            app.server.get("/api/v1/folders").await.json();
        if let Some(folder) = folders
            .iter()
            .find(|f| f.id.as_str() == folder_id && f.status == status)
        {
            return folder.clone();
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("folder {folder_id} never reached {status:?}");
}

#[tokio::test]
async fn scan_registers_exactly_the_video_files() {
    let media = tempfile::tempdir().unwrap();
    for name in ["a.mp4", "b.MOV", "c.mkv"] {
        std::fs::write(media.path().join(name), b"fake video").unwrap();
    }
    for name in ["notes.txt", "cover.jpg"] {
        std::fs::write(media.path().join(name), b"not a video").unwrap();
    }
    // Nested videos are out of scope for a non-recursive scan.
    std::fs::create_dir(media.path().join("extras")).unwrap();
    std::fs::write(media.path().join("extras/d.mp4"), b"fake video").unwrap();

    let app = build_test_app(
        StubExtractor::writing(2),
        Arc::new(StubIndexer::accepting()),
    );

    let response = app
        .server
        .post("/api/v1/folders")
        .json(&json!({"path": media.path(), "recursive": false}))
        .await;
    response.assert_status_ok();
    let created: RegisterFolderResponse = response.json();
    assert_eq!(created.status, "scanning");

    wait_for_folder_status(&app, created.folder_id.as_str(), FolderStatus::Scanned)
        .await;

    let videos: Vec<Video> = app.server.get("/api/v1/videos").await.json();
    assert_eq!(videos.len(), 3);
    let ids: HashSet<_> =
        videos.iter().map(|video| video.id.clone()).collect();
    assert_eq!(ids.len(), 3);
}

#[tokio::test]
async fn recursive_scan_descends_into_subdirectories() {
    let media = tempfile::tempdir().unwrap();
    std::fs::write(media.path().join("a.mp4"), b"fake video").unwrap();
    std::fs::create_dir(media.path().join("extras")).unwrap();
    std::fs::write(media.path().join("extras/b.webm"), b"fake video").unwrap();

    let app = build_test_app(
        StubExtractor::writing(1),
        Arc::new(StubIndexer::accepting()),
    );

    let created: RegisterFolderResponse = app
        .server
        .post("/api/v1/folders")
        .json(&json!({"path": media.path(), "recursive": true}))
        .await
        .json();
    wait_for_folder_status(&app, created.folder_id.as_str(), FolderStatus::Scanned)
        .await;

    let videos: Vec<Video> = app.server.get("/api/v1/videos").await.json();
    assert_eq!(videos.len(), 2);
}

#[tokio::test]
async fn scan_of_a_missing_directory_marks_the_folder_errored() {
    let app = build_test_app(
        StubExtractor::writing(0),
        Arc::new(StubIndexer::accepting()),
    );

    let created: RegisterFolderResponse = app
        .server
        .post("/api/v1/folders")
        .json(&json!({"path": "/no/such/directory", "recursive": false}))
        .await
        .json();
    wait_for_folder_status(&app, created.folder_id.as_str(), FolderStatus::Error)
        .await;

    let videos: Vec<Video> = app.server.get("/api/v1/videos").await.json();
    assert!(videos.is_empty());
}

#[tokio::test]
async fn duplicate_folder_registration_is_reported() {
    let media = tempfile::tempdir().unwrap();
    let app = build_test_app(
        StubExtractor::writing(0),
        Arc::new(StubIndexer::accepting()),
    );

    let first: RegisterFolderResponse = app
        .server
        .post("/api/v1/folders")
        .json(&json!({"path": media.path()}))
        .await
        .json();
    let second: RegisterFolderResponse = app
        .server
        .post("/api/v1/folders")
        .json(&json!({"path": media.path()}))
        .await
        .json();

    assert_eq!(first.folder_id, second.folder_id);
    assert_eq!(second.status, "already_exists");
}

#[tokio::test]
async fn empty_folder_path_is_rejected() {
    let app = build_test_app(
        StubExtractor::writing(0),
        Arc::new(StubIndexer::accepting()),
    );
    let response = app
        .server
        .post("/api/v1/folders")
        .json(&json!({"path": ""}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}
