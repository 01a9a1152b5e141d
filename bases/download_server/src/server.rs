// bases/download_server/src/server.rs
use crate::config::Config;
use crate::error::AppError;
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap},
    response::Response,
    routing::{get, post},
    Router,
};
use media_downloader::{DownloadRequest, MediaDownloader, Stage};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    downloader: Arc<MediaDownloader>,
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(downloader: MediaDownloader, shutdown: CancellationToken) -> Self {
        Self {
            downloader: Arc::new(downloader),
            shutdown,
        }
    }
}

/// Download request body
///
/// Fields are read loosely: a non-string `url` counts as missing, a
/// non-string `quality` falls back to the default tier, and anything but
/// `true` for `audioOnly` means video.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct DownloadBody {
    url: Option<Value>,
    quality: Option<Value>,
    audio_only: Option<Value>,
}

impl DownloadBody {
    /// Parse a request body. A blank body, or one not declared as JSON,
    /// reads as an empty request.
    fn parse(headers: &HeaderMap, bytes: &[u8]) -> Result<Self, serde_json::Error> {
        if !is_json(headers) || bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(bytes)
    }

    fn url(&self) -> Option<&str> {
        self.url.as_ref().and_then(Value::as_str)
    }

    fn quality(&self) -> Option<&str> {
        self.quality.as_ref().and_then(Value::as_str)
    }

    fn audio_only(&self) -> bool {
        matches!(self.audio_only, Some(Value::Bool(true)))
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/download", post(download).fallback(method_not_allowed))
        .route("/api/download", post(download).fallback(method_not_allowed))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Run the HTTP server until `shutdown` is cancelled
pub async fn run(config: Config, downloader: MediaDownloader, shutdown: CancellationToken) -> color_eyre::Result<()> {
    let app = router(AppState::new(downloader, shutdown.clone()));

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!("🚀 Server listening on http://{}", listener.local_addr()?);
    info!("   Temp directory: {}", config.downloader.temp_root.display());

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn health() -> &'static str {
    "YouTube Downloader API is running!"
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// Handler for download requests
///
/// The request is validated before any external program runs. The pipeline
/// observes a token that is cancelled if the client goes away (this future is
/// dropped) or the server shuts down.
async fn download(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Bytes,
) -> Result<Response, AppError> {
    tracing::debug!("📍 Stage: {}", Stage::Validating);
    let body = DownloadBody::parse(&headers, &payload)?;
    let request = DownloadRequest::parse(body.url(), body.quality(), body.audio_only())?;
    info!(
        "Received download request: {} ({}, audio only: {})",
        request.url, request.quality, request.audio_only
    );

    let cancel = state.shutdown.child_token();
    let _abort_on_disconnect = cancel.clone().drop_guard();

    let delivery = state.downloader.download(&request, &cancel).await?;

    let content_type = delivery.content_type();
    let content_length = delivery.size_bytes();
    let disposition = delivery.content_disposition();

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, content_length)
        .header(header::CONTENT_DISPOSITION, disposition)
        .body(Body::from_stream(delivery.into_stream()))
        .map_err(|e| AppError::Internal(format!("building response: {}", e)))
}
