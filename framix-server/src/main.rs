//! # Framix Server
//!
//! Daemon that tracks media assets and drives the extract-then-index
//! pipeline against a vector search service.
//!
//! ## Overview
//!
//! - **Video tracking**: register videos directly or discover them by
//!   scanning folders
//! - **Background jobs**: one extract-and-upload job per video, with live
//!   progress and cooperative cancellation
//! - **Search proxy**: text queries forwarded to the vector search service
//!
//! All state is process-lifetime; restart with an empty registry.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, Method};
use clap::Parser;
use tokio::sync::RwLock;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use framix_core::{
    FfmpegExtractor, FolderScanner, FrameExtractor, FrameIndexer, JobManager,
    Registry, Settings, VectorServiceClient,
};
use framix_server::{routes, AppState};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "framix-server")]
#[command(about = "Video indexing daemon with background extraction jobs and semantic search")]
struct Cli {
    /// Server port
    #[arg(short, long, env = "SERVER_PORT", default_value_t = 8080)]
    port: u16,

    /// Server host
    #[arg(long, env = "SERVER_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Root directory extracted frames are written under
    #[arg(long, env = "FRAMIX_FRAMES_ROOT")]
    frames_root: Option<PathBuf>,

    /// Base URL of the vector search service
    #[arg(long, env = "VECTOR_SERVICE_URL")]
    vector_service_url: Option<String>,

    /// ffmpeg binary used for frame extraction
    #[arg(long, env = "FFMPEG_PATH", default_value = "ffmpeg")]
    ffmpeg_path: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_loaded = dotenvy::dotenv().is_ok();
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if env_loaded {
        info!("loaded .env file");
    }

    let mut settings = Settings::default();
    if let Some(frames_root) = cli.frames_root {
        settings.frames_root = frames_root;
    }
    if let Some(vector_service_url) = cli.vector_service_url {
        settings.vector_service_url = vector_service_url;
    }

    let registry = Arc::new(Registry::new(settings.cloud_user_id.clone()));
    let extractor: Arc<dyn FrameExtractor> =
        Arc::new(FfmpegExtractor::new(cli.ffmpeg_path));
    let indexer: Arc<dyn FrameIndexer> = Arc::new(VectorServiceClient::new(
        settings.vector_service_url.clone(),
    )?);
    let settings = Arc::new(RwLock::new(settings));

    let jobs = JobManager::new(
        Arc::clone(&registry),
        extractor,
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

    // CORS to allow local clients
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(|origin, _| {
            origin.as_bytes().starts_with(b"http://localhost")
                || origin.as_bytes().starts_with(b"http://127.0.0.1")
        }))
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::ACCEPT,
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
        ]))
        .allow_credentials(true)
        .max_age(Duration::from_secs(300));

    let app = routes::create_api_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let listener =
        tokio::net::TcpListener::bind((cli.host.as_str(), cli.port)).await?;
    info!("Starting Framix Server on {}:{}", cli.host, cli.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutdown signal received");
}
