use serde::Deserialize;

/// Request parameters applied when the caller leaves them unset
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultsConfig {
    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,
    /// Input language hint (ISO 639-1)
    #[serde(default)]
    pub language: Option<String>,
    /// Prompt guiding the model's style
    #[serde(default)]
    pub prompt: Option<String>,
    /// Sampling temperature between 0 and 1
    #[serde(default)]
    pub temperature: Option<f32>,
    /// Response format (json, text, srt, `verbose_json`, vtt)
    #[serde(default)]
    pub response_format: Option<String>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            language: None,
            prompt: None,
            temperature: None,
            response_format: None,
        }
    }
}

fn default_model() -> String {
    "whisper-1".to_string()
}
