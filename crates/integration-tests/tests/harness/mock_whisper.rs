//! Mock Whisper backend for integration tests
//!
//! Parses the multipart upload like the real service, records every field
//! and answers in the requested response format

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicU32, Ordering};

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use tokio_util::sync::CancellationToken;

/// One multipart field as received by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedField {
    pub name: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl ReceivedField {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

/// A recorded upload
#[derive(Debug, Clone)]
pub struct ReceivedUpload {
    pub operation: &'static str,
    pub fields: Vec<ReceivedField>,
}

impl ReceivedUpload {
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn field(&self, name: &str) -> Option<&ReceivedField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Mock Whisper backend that echoes a fixed text
pub struct MockWhisper {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockWhisperState>,
}

struct MockWhisperState {
    request_count: AtomicU32,
    uploads: Mutex<Vec<ReceivedUpload>>,
    /// Text returned for every request
    text: String,
    /// Status returned instead of a transcription (if set)
    fail_status: Option<StatusCode>,
}

impl MockWhisper {
    /// Start a mock answering with `text`
    pub async fn start(text: &str) -> anyhow::Result<Self> {
        Self::start_inner(text, None).await
    }

    /// Start a mock that rejects every upload with `status`
    pub async fn start_failing(status: StatusCode) -> anyhow::Result<Self> {
        Self::start_inner("", Some(status)).await
    }

    async fn start_inner(text: &str, fail_status: Option<StatusCode>) -> anyhow::Result<Self> {
        let state = Arc::new(MockWhisperState {
            request_count: AtomicU32::new(0),
            uploads: Mutex::new(Vec::new()),
            text: text.to_owned(),
            fail_status,
        });

        let app = Router::new()
            .route("/v1/audio/transcriptions", routing::post(handle_transcriptions))
            .route("/v1/audio/translations", routing::post(handle_translations))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL including `/v1`, as a client would be configured
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// Number of requests received
    pub fn request_count(&self) -> u32 {
        self.state.request_count.load(Ordering::Relaxed)
    }

    /// Uploads received so far, oldest first
    pub fn uploads(&self) -> Vec<ReceivedUpload> {
        self.state.uploads.lock().unwrap().clone()
    }
}

impl Drop for MockWhisper {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_transcriptions(State(state): State<Arc<MockWhisperState>>, multipart: Multipart) -> Response {
    handle(state, "transcriptions", multipart).await
}

async fn handle_translations(State(state): State<Arc<MockWhisperState>>, multipart: Multipart) -> Response {
    handle(state, "translations", multipart).await
}

async fn handle(state: Arc<MockWhisperState>, operation: &'static str, mut multipart: Multipart) -> Response {
    state.request_count.fetch_add(1, Ordering::Relaxed);

    let mut fields = Vec::new();

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let name = field.name().unwrap_or_default().to_owned();
                let filename = field.file_name().map(str::to_owned);
                let content_type = field.content_type().map(str::to_owned);

                let data = match field.bytes().await {
                    Ok(data) => data.to_vec(),
                    Err(e) => return (StatusCode::BAD_REQUEST, format!("Failed to read field: {e}")).into_response(),
                };

                fields.push(ReceivedField {
                    name,
                    filename,
                    content_type,
                    data,
                });
            }
            Ok(None) => break,
            Err(e) => return (StatusCode::BAD_REQUEST, format!("Failed to parse multipart form: {e}")).into_response(),
        }
    }

    let format = fields
        .iter()
        .find(|f| f.name == "response_format")
        .map(ReceivedField::text);

    state.uploads.lock().unwrap().push(ReceivedUpload { operation, fields });

    if let Some(status) = state.fail_status {
        let body = serde_json::json!({
            "error": {
                "type": "invalid_request_error",
                "message": "mock rejected the upload"
            }
        });
        return (status, Json(body)).into_response();
    }

    match format.as_deref() {
        None | Some("json") => Json(serde_json::json!({ "text": state.text })).into_response(),
        Some("verbose_json") => Json(serde_json::json!({
            "task": operation.trim_end_matches('s'),
            "language": "english",
            "duration": 1.0,
            "text": state.text,
            "segments": []
        }))
        .into_response(),
        Some(_) => state.text.clone().into_response(),
    }
}
