//! Wallpaper gallery server binary.
//!
//! Serves a fixed catalog of wallpapers alongside user uploads kept in a
//! local directory, and proxies downloads from Unsplash. The main entry point
//! prepares the directories, builds the Axum router and runs the HTTP
//! listener until a shutdown signal arrives.

mod app;
mod atomic;
mod catalog;
mod config;
mod error;
mod gallery;
mod http;
mod logging;
mod photos;
mod storage;
mod unsplash;

use axum_server::Handle;
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::{fs, signal};
use tracing::{info, warn};

use crate::app::{AppContext, build_router};
use crate::config::{Args, SHUTDOWN_GRACE_SECS, UNSPLASH_TIMEOUT_SECS};
use crate::storage::UploadStore;
use crate::unsplash::UnsplashClient;

/// Starts the gallery server and blocks until shutdown.
#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    logging::init_logging();

    let args = Args::parse();
    let store = Arc::new(UploadStore::new(PathBuf::from(&args.uploads_dir)));
    store.ensure_root().await?;
    let wallpapers_dir = PathBuf::from(&args.wallpapers_dir);
    fs::create_dir_all(&wallpapers_dir).await?;

    if args.unsplash_access_key.is_none() {
        warn!("UNSPLASH_ACCESS_KEY is not set, unsplash downloads will fail");
    }
    let unsplash = UnsplashClient::new(
        &args.unsplash_api_url,
        args.unsplash_access_key.clone(),
        Duration::from_secs(UNSPLASH_TIMEOUT_SECS),
    )
    .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidInput, err.to_string()))?;

    let app = build_router(AppContext {
        store,
        unsplash: Arc::new(unsplash),
        wallpapers_dir,
        upload_max_size: args.upload_max_size,
        cors_origins: args.cors_origins.clone(),
    });

    let host = args
        .host
        .parse::<IpAddr>()
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidInput, err.to_string()))?;
    let addr = SocketAddr::new(host, args.port);
    let handle = Handle::new();

    info!(
        uploads_dir = args.uploads_dir,
        wallpapers_dir = args.wallpapers_dir,
        "🚀 Starting HTTP server at http://{}",
        addr
    );

    tokio::spawn(shutdown_signal(handle.clone()));
    axum_server::bind(addr)
        .handle(handle)
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .await
}

async fn shutdown_signal(handle: Handle) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Received termination signal, shutting down");
    handle.graceful_shutdown(Some(Duration::from_secs(SHUTDOWN_GRACE_SECS)));
}
