use std::{fmt, sync::Arc, time::Duration};

use http::{HeaderMap, HeaderName, HeaderValue, header::CONTENT_TYPE};
use scribe_config::ClientConfig;
use secrecy::{ExposeSecret, SecretString};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::{
    assemble::assemble,
    error::{AudioError, Result},
    form::{FormError, MultipartEncoder},
    transport::{Transport, http_client},
    types::{AudioRequest, Operation, Transcription},
};

/// Per-call deadline and cancellation
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Deadline for the outbound request, overriding the client default
    pub timeout: Option<Duration>,
    /// Aborts the call when cancelled
    pub cancellation: Option<CancellationToken>,
}

/// Client for the `/audio/transcriptions` and `/audio/translations` endpoints
#[derive(Clone)]
pub struct AudioClient {
    base_url: Url,
    http: reqwest::Client,
    transport: Arc<dyn Transport>,
    api_key: Option<SecretString>,
    timeout: Option<Duration>,
}

impl fmt::Debug for AudioClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl AudioClient {
    /// Create a new client pointing at the given base URL, e.g. `https://api.openai.com/v1`
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or cannot carry a path
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| AudioError::Config(format!("invalid base URL: {e}")))?;

        Self::with_headers(base_url, HeaderMap::new())
    }

    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL or a configured header is invalid
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();

        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| AudioError::Config(format!("invalid header name `{name}`: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| AudioError::Config(format!("invalid value for header `{name}`: {e}")))?;

            headers.insert(name, value);
        }

        let mut client = Self::with_headers(config.base_url.clone(), headers)?;
        client.api_key.clone_from(&config.api_key);
        client.timeout = config.timeout;

        Ok(client)
    }

    fn with_headers(base_url: Url, headers: HeaderMap) -> Result<Self> {
        if base_url.cannot_be_a_base() {
            return Err(AudioError::Config(format!("base URL `{base_url}` cannot carry a path")));
        }

        let http = http_client(headers).map_err(|e| AudioError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url,
            transport: Arc::new(http.clone()),
            http,
            api_key: None,
            timeout: None,
        })
    }

    /// Set the API key sent as a bearer token
    #[must_use]
    pub fn with_api_key(mut self, api_key: SecretString) -> Self {
        self.api_key = Some(api_key);
        self
    }

    /// Set the default deadline applied to every call
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Replace the transport used to send requests
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Get the base URL
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Transcribe audio in its spoken language
    ///
    /// # Errors
    ///
    /// Returns an error if the request is invalid, the audio cannot be read,
    /// or the call fails
    pub async fn transcribe(&self, request: &AudioRequest) -> Result<Transcription> {
        self.send(request, Operation::Transcriptions, &CallOptions::default())
            .await
    }

    /// Translate audio into English
    ///
    /// # Errors
    ///
    /// Returns an error if the request is invalid, the audio cannot be read,
    /// or the call fails
    pub async fn translate(&self, request: &AudioRequest) -> Result<Transcription> {
        self.send(request, Operation::Translations, &CallOptions::default())
            .await
    }

    /// Run one audio operation
    ///
    /// The form is fully assembled before anything is sent, so local failures
    /// never reach the network. Exactly one request is made; nothing is retried.
    ///
    /// # Errors
    ///
    /// Returns an error describing the stage that failed, see [`AudioError::kind`]
    pub async fn send(&self, request: &AudioRequest, operation: Operation, options: &CallOptions) -> Result<Transcription> {
        let encoded = assemble(request, MultipartEncoder::new()).await?;
        let url = self.endpoint_url(operation);

        tracing::debug!(
            %url,
            model = %request.model,
            format = ?request.response_format,
            "sending audio request"
        );

        let content_type = HeaderValue::from_str(&encoded.content_type)
            .map_err(|e| AudioError::encoding("content-type", FormError::ContentType(e.to_string())))?;

        let mut builder = self.http.post(url).multipart(encoded.body);

        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        if let Some(timeout) = options.timeout.or(self.timeout) {
            builder = builder.timeout(timeout);
        }

        let mut http_request = builder.build()?;
        http_request.headers_mut().insert(CONTENT_TYPE, content_type);

        let response = match &options.cancellation {
            Some(token) => tokio::select! {
                biased;
                () = token.cancelled() => {
                    tracing::debug!("audio request cancelled");
                    return Err(AudioError::Cancelled);
                }
                response = self.transport.execute(http_request) => response,
            },
            None => self.transport.execute(http_request).await,
        }
        .map_err(|e| {
            tracing::error!("audio request failed: {e}");
            AudioError::Transport(e)
        })?;

        let response = handle_error(response).await?;

        decode_response(response, request.has_json_response()).await
    }

    /// `{base}/audio/{operation}`, keeping any path already on the base
    fn endpoint_url(&self, operation: Operation) -> Url {
        let mut url = self.base_url.clone();

        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["audio", operation.as_ref()]);
        }

        url
    }
}

/// Turn a successful response into a [`Transcription`]
///
/// JSON formats are parsed for their `text` field; every other format is
/// taken verbatim, even when it happens to look like JSON.
async fn decode_response(response: reqwest::Response, json: bool) -> Result<Transcription> {
    if json {
        let body = response.bytes().await?;

        serde_json::from_slice(&body).map_err(|e| {
            tracing::error!("failed to parse audio response: {e}");
            AudioError::Decoding(e)
        })
    } else {
        let text = response.text().await?;

        Ok(Transcription { text })
    }
}

/// Check an HTTP response for errors
async fn handle_error(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let (error_type, message) = parse_error_body(&body);

    tracing::error!("audio API error ({status}): {message}");

    Err(AudioError::Api {
        status: status.as_u16(),
        error_type,
        message,
    })
}

/// Parse an `{"error": {"type": ..., "message": ...}}` body into (type, message)
fn parse_error_body(body: &str) -> (String, String) {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        let error = &json["error"];
        let error_type = error["type"].as_str().unwrap_or("unknown").to_owned();
        let message = error["message"].as_str().unwrap_or(body).to_owned();
        (error_type, message)
    } else {
        ("unknown".to_owned(), body.to_owned())
    }
}
