//! Unsplash passthrough: resolve a photo id to its largest rendition and
//! stream the bytes back as a JPEG attachment.

use axum::body::Body as AxumBody;
use axum::extract::{Extension, Path};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use futures_util::TryStreamExt;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::error::ApiError;
use crate::http::attachment_disposition;

const DOWNLOAD_FAILED: &str = "Failed to download image";
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Error type for Unsplash API calls.
#[derive(Debug, thiserror::Error)]
pub enum UnsplashError {
    #[error("Unsplash access key is not configured")]
    MissingAccessKey,
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("photo metadata has no image url")]
    NoImageUrl,
}

#[derive(Debug, Deserialize)]
struct PhotoMetadata {
    urls: PhotoUrls,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    raw: Option<String>,
    full: Option<String>,
    regular: Option<String>,
}

impl PhotoUrls {
    /// Largest rendition first.
    fn largest(self) -> Option<String> {
        self.raw.or(self.full).or(self.regular)
    }
}

/// Client for the Unsplash photos API.
#[derive(Clone, Debug)]
pub struct UnsplashClient {
    client: Client,
    api_base: Url,
    access_key: Option<String>,
}

impl UnsplashClient {
    /// `timeout` bounds each outbound request end to end, body included.
    pub fn new(
        api_base: &str,
        access_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, UnsplashError> {
        let api_base =
            Url::parse(api_base).map_err(|err| UnsplashError::InvalidUrl(err.to_string()))?;
        if api_base.cannot_be_a_base() {
            return Err(UnsplashError::InvalidUrl(api_base.to_string()));
        }
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_base,
            access_key: access_key.filter(|key| !key.is_empty()),
        })
    }

    fn photo_url(&self, photo_id: &str) -> Result<Url, UnsplashError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| UnsplashError::InvalidUrl(self.api_base.to_string()))?
            .pop_if_empty()
            .push("photos")
            .push(photo_id);
        Ok(url)
    }

    /// Looks up the photo and returns its highest-resolution image URL.
    pub async fn image_url(&self, photo_id: &str) -> Result<String, UnsplashError> {
        let access_key = self
            .access_key
            .as_deref()
            .ok_or(UnsplashError::MissingAccessKey)?;
        let url = self.photo_url(photo_id)?;
        debug!(%url, "fetch unsplash metadata");

        let metadata: PhotoMetadata = self
            .client
            .get(url)
            .header(header::AUTHORIZATION, format!("Client-ID {access_key}"))
            .header("Accept-Version", "v1")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        metadata.urls.largest().ok_or(UnsplashError::NoImageUrl)
    }

    /// Starts the image transfer; the body is read lazily by the caller.
    pub async fn fetch_image(&self, photo_id: &str) -> Result<reqwest::Response, UnsplashError> {
        let image_url = self.image_url(photo_id).await?;
        let response = self
            .client
            .get(&image_url)
            .send()
            .await?
            .error_for_status()?;
        Ok(response)
    }
}

/// Proxies an Unsplash photo as `<id>.jpg`.
pub async fn download_unsplash(
    Path(photo_id): Path<String>,
    Extension(unsplash): Extension<Arc<UnsplashClient>>,
) -> Result<Response, ApiError> {
    let upstream = unsplash.fetch_image(&photo_id).await.map_err(|err| {
        error!(photo_id, error = %err, "unsplash download failed");
        ApiError::Internal(DOWNLOAD_FAILED.into())
    })?;

    let mut response_headers = HeaderMap::new();
    response_headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("image/jpeg"));
    response_headers.insert(
        header::CONTENT_DISPOSITION,
        attachment_disposition(&format!("{photo_id}.jpg")),
    );
    if let Some(length) = upstream.content_length() {
        response_headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }

    info!(photo_id, size = upstream.content_length(), "download unsplash photo");
    let stream_id = photo_id.clone();
    let stream = upstream.bytes_stream().inspect_err(move |err| {
        warn!(photo_id = %stream_id, error = %err, "unsplash stream aborted");
    });
    Ok((
        StatusCode::OK,
        response_headers,
        AxumBody::from_stream(stream),
    )
        .into_response())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::Router;
    use axum::routing::get;
    use serde_json::json;
    use tokio::net::TcpListener;

    pub(crate) const TEST_KEY: &str = "test-key";
    pub(crate) const FAKE_IMAGE: &[u8] = b"\x89PNG fake image bytes";

    /// Serves `/photos/abc123` and its image; anything else is 404 and a
    /// wrong key is 401, like the real API.
    pub(crate) async fn spawn_fake_unsplash() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let base = format!("http://{}", listener.local_addr().expect("addr"));
        let image_url = format!("{base}/images/abc123");

        let app = Router::new()
            .route(
                "/photos/{id}",
                get(move |Path(id): Path<String>, headers: HeaderMap| {
                    let image_url = image_url.clone();
                    async move {
                        let authorized = headers
                            .get(header::AUTHORIZATION)
                            .is_some_and(|value| value == "Client-ID test-key");
                        if !authorized {
                            return StatusCode::UNAUTHORIZED.into_response();
                        }
                        if id != "abc123" {
                            return StatusCode::NOT_FOUND.into_response();
                        }
                        axum::Json(json!({
                            "id": id,
                            "urls": {
                                "raw": image_url,
                                "full": "http://127.0.0.1:1/unused",
                                "regular": "http://127.0.0.1:1/unused",
                            }
                        }))
                        .into_response()
                    }
                }),
            )
            .route(
                "/images/{id}",
                get(|| async { ([(header::CONTENT_TYPE, "image/png")], FAKE_IMAGE) }),
            );

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        base
    }

    fn client(base: &str, key: Option<&str>) -> UnsplashClient {
        UnsplashClient::new(base, key.map(str::to_string), Duration::from_secs(5))
            .expect("client")
    }

    #[test]
    fn largest_prefers_raw_then_full() {
        let urls = PhotoUrls {
            raw: None,
            full: Some("full".into()),
            regular: Some("regular".into()),
        };
        assert_eq!(urls.largest().as_deref(), Some("full"));
    }

    #[test]
    fn photo_url_escapes_id() {
        let unsplash = client("https://api.unsplash.com/", Some(TEST_KEY));
        let url = unsplash.photo_url("a/b?c").expect("url");
        assert_eq!(url.as_str(), "https://api.unsplash.com/photos/a%2Fb%3Fc");
    }

    #[test]
    fn rejects_non_base_url() {
        let result = UnsplashClient::new("mailto:x@example.com", None, Duration::from_secs(1));
        assert!(matches!(result, Err(UnsplashError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn image_url_resolves_raw_rendition() {
        let base = spawn_fake_unsplash().await;
        let url = client(&base, Some(TEST_KEY))
            .image_url("abc123")
            .await
            .expect("image url");
        assert_eq!(url, format!("{base}/images/abc123"));
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let unsplash = client("http://127.0.0.1:1", None);
        let result = unsplash.image_url("abc123").await;
        assert!(matches!(result, Err(UnsplashError::MissingAccessKey)));
    }

    #[tokio::test]
    async fn upstream_status_errors_surface() {
        let base = spawn_fake_unsplash().await;
        let bad_key = client(&base, Some("wrong")).image_url("abc123").await;
        assert!(matches!(bad_key, Err(UnsplashError::Http(_))));
        let bad_id = client(&base, Some(TEST_KEY)).image_url("nope").await;
        assert!(matches!(bad_id, Err(UnsplashError::Http(_))));
    }
}
