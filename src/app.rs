//! Router assembly: API routes, static mounts and shared layers.

use axum::Router;
use axum::extract::{DefaultBodyLimit, Extension, connect_info::ConnectInfo};
use axum::http::Request;
use axum::routing::{delete, get, post};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, info_span};

use crate::gallery::UPLOADS_PREFIX;
use crate::http::{build_cors_layer, resolve_client_ip};
use crate::photos;
use crate::storage::UploadStore;
use crate::unsplash::{self, UnsplashClient};

pub const WALLPAPERS_PREFIX: &str = "/wallpapers";

/// Everything the router needs, built once at startup.
pub struct AppContext {
    pub store: Arc<UploadStore>,
    pub unsplash: Arc<UnsplashClient>,
    pub wallpapers_dir: PathBuf,
    pub upload_max_size: usize,
    pub cors_origins: String,
}

/// Builds the full router: API routes, static mounts, tracing and CORS.
pub fn build_router(ctx: AppContext) -> Router {
    let uploads_dir = ctx.store.root_path().to_path_buf();

    let mut app = Router::new()
        .route("/", get(photos::health))
        .route("/all-wallpapers", get(photos::list_wallpapers))
        .route(
            "/upload",
            post(photos::upload_photo).layer(DefaultBodyLimit::max(ctx.upload_max_size)),
        )
        .route("/delete/{filename}", delete(photos::delete_photo))
        .route("/download/unsplash/{id}", get(unsplash::download_unsplash))
        .route("/download/{filename}", get(photos::download_photo))
        .nest_service(UPLOADS_PREFIX, ServeDir::new(uploads_dir))
        .nest_service(WALLPAPERS_PREFIX, ServeDir::new(&ctx.wallpapers_dir))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let connect_ip = request
                        .extensions()
                        .get::<ConnectInfo<SocketAddr>>()
                        .map(|ConnectInfo(addr)| addr.ip());
                    let client_ip = resolve_client_ip(request.headers(), connect_ip)
                        .map(|ip| ip.to_string())
                        .unwrap_or_else(|| "unknown".to_string());

                    info_span!(
                        env!("CARGO_CRATE_NAME"),
                        client_ip,
                        method = ?request.method(),
                        path = ?request.uri().path(),
                    )
                })
                .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(Extension(ctx.store))
        .layer(Extension(ctx.unsplash));

    if let Some(cors_layer) = build_cors_layer(&ctx.cors_origins) {
        app = app.layer(cors_layer);
    }

    app
}
