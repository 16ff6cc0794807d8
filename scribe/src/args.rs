use std::{path::PathBuf, time::Duration};

use bytes::Bytes;
use clap::{Parser, Subcommand};
use scribe_client::{AudioInput, AudioRequest, Operation, ResponseFormat};
use scribe_config::DefaultsConfig;
use tokio::io::AsyncReadExt;

/// Transcribe or translate audio through a Whisper-compatible API
#[derive(Debug, Parser)]
#[command(name = "scribe", about = "Transcribe or translate audio through a Whisper-compatible API")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "SCRIBE_CONFIG")]
    pub config: Option<PathBuf>,

    /// API key, overriding the configured one
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Log filter, overriding the configured one
    #[arg(long, env = "SCRIBE_LOG")]
    pub log: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Transcribe audio in its spoken language
    Transcribe(AudioArgs),
    /// Translate audio into English
    Translate(AudioArgs),
}

impl Command {
    pub fn into_parts(self) -> (Operation, AudioArgs) {
        match self {
            Self::Transcribe(args) => (Operation::Transcriptions, args),
            Self::Translate(args) => (Operation::Translations, args),
        }
    }
}

#[derive(Debug, clap::Args)]
pub struct AudioArgs {
    /// Audio file to upload
    #[arg(short, long, conflicts_with = "stdin")]
    pub file: Option<PathBuf>,

    /// Read audio from standard input
    #[arg(long, requires = "filename")]
    pub stdin: bool,

    /// Upload filename for audio read from stdin; its extension names the format
    #[arg(long)]
    pub filename: Option<String>,

    /// Model identifier
    #[arg(short, long)]
    pub model: Option<String>,

    /// Prompt guiding the model's style
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Input language hint (ISO 639-1)
    #[arg(short, long)]
    pub language: Option<String>,

    /// Sampling temperature between 0 and 1
    #[arg(short, long)]
    pub temperature: Option<f32>,

    /// Response format: json, text, srt, verbose_json or vtt
    #[arg(long)]
    pub format: Option<ResponseFormat>,

    /// Request deadline, e.g. "30s"
    #[arg(long, value_parser = parse_duration)]
    pub timeout: Option<Duration>,
}

impl AudioArgs {
    /// Build the request, filling unset parameters from `defaults`
    ///
    /// Reads standard input to the end when `--stdin` is given.
    pub async fn into_request(self, defaults: &DefaultsConfig) -> anyhow::Result<AudioRequest> {
        let bytes = if self.stdin {
            let mut data = Vec::new();
            tokio::io::stdin().read_to_end(&mut data).await?;
            Some((self.filename.clone().unwrap_or_default(), Bytes::from(data)))
        } else {
            None
        };

        self.build_request(bytes, defaults)
    }

    fn build_request(self, bytes: Option<(String, Bytes)>, defaults: &DefaultsConfig) -> anyhow::Result<AudioRequest> {
        let input = AudioInput::from_parts(self.file, bytes)?;

        let response_format = match (self.format, defaults.response_format.as_deref()) {
            (Some(format), _) => Some(format),
            (None, Some(raw)) => Some(
                raw.parse::<ResponseFormat>()
                    .map_err(|_| anyhow::anyhow!("unknown response format in defaults: `{raw}`"))?,
            ),
            (None, None) => None,
        };

        Ok(AudioRequest {
            model: self.model.unwrap_or_else(|| defaults.model.clone()),
            input,
            prompt: self.prompt.or_else(|| defaults.prompt.clone()),
            temperature: self.temperature.or(defaults.temperature),
            language: self.language.or_else(|| defaults.language.clone()),
            response_format,
        })
    }
}

fn parse_duration(raw: &str) -> Result<Duration, String> {
    duration_str::parse(raw).map_err(|e| format!("invalid duration '{raw}': {e}"))
}
