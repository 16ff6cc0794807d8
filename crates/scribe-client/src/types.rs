use std::path::PathBuf;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{AudioError, Result};

/// `OpenAI` Whisper model identifier
pub const WHISPER_1: &str = "whisper-1";

/// Remote audio operation, selecting the `/audio/{operation}` endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::AsRefStr, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
    /// Same-language transcription
    Transcriptions,
    /// Translation into English
    Translations,
}

/// Output format requested from the service
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::AsRefStr, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResponseFormat {
    /// JSON object with a `text` field
    Json,
    /// Plain text
    Text,
    /// SubRip subtitles
    Srt,
    /// JSON with segments, language and duration alongside `text`
    VerboseJson,
    /// WebVTT subtitles
    Vtt,
}

impl ResponseFormat {
    /// Whether the service answers this format with a JSON body
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json | Self::VerboseJson)
    }
}

/// Audio source for a request
#[derive(Debug, Clone)]
pub enum AudioInput {
    /// File on disk, uploaded under its base filename
    Path(PathBuf),
    /// In-memory audio; the filename extension tells the service the format
    Bytes {
        /// Upload filename, e.g. `clip.wav`
        filename: String,
        /// Raw audio data
        data: Bytes,
    },
}

impl AudioInput {
    /// Audio read from a file on disk
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// Audio held in memory
    pub fn bytes(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self::Bytes {
            filename: filename.into(),
            data: data.into(),
        }
    }

    /// Build an input from independently optional sources
    ///
    /// Exactly one of `path` or `bytes` must be given.
    pub fn from_parts(path: Option<PathBuf>, bytes: Option<(String, Bytes)>) -> Result<Self> {
        match (path, bytes) {
            (Some(path), None) => Ok(Self::Path(path)),
            (None, Some((filename, data))) => Ok(Self::Bytes { filename, data }),
            (Some(_), Some(_)) => Err(AudioError::Validation(
                "only one of path or bytes may be specified".to_owned(),
            )),
            (None, None) => Err(AudioError::Validation(
                "either path or bytes should be specified".to_owned(),
            )),
        }
    }
}

/// A single transcription or translation request
#[derive(Debug, Clone)]
pub struct AudioRequest {
    /// Model identifier (e.g. "whisper-1")
    pub model: String,
    /// Audio to process
    pub input: AudioInput,
    /// Text to guide the model's style; for translations it should be in English
    pub prompt: Option<String>,
    /// Sampling temperature; zero is treated as unset
    pub temperature: Option<f32>,
    /// Input language hint (ISO 639-1)
    pub language: Option<String>,
    /// Output format, JSON when unset
    pub response_format: Option<ResponseFormat>,
}

impl AudioRequest {
    /// Create a request with only the required fields set
    pub fn new(model: impl Into<String>, input: AudioInput) -> Self {
        Self {
            model: model.into(),
            input,
            prompt: None,
            temperature: None,
            language: None,
            response_format: None,
        }
    }

    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    #[must_use]
    pub const fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }

    /// Whether the response body will be a JSON object
    pub fn has_json_response(&self) -> bool {
        self.response_format.is_none_or(ResponseFormat::is_json)
    }
}

/// Transcribed or translated text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcription {
    /// Resulting text, taken verbatim for subtitle and text formats
    pub text: String,
}
