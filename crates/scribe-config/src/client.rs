use std::time::Duration;

use indexmap::IndexMap;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use url::Url;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Connection settings for the audio API
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL the `/audio/...` paths are appended to
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    /// API key, sent as a bearer token
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Deadline for each request, e.g. "30s" or "2m"
    #[serde(default, deserialize_with = "deserialize_duration")]
    pub timeout: Option<Duration>,
    /// Extra headers sent with every request
    #[serde(default)]
    pub headers: IndexMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            timeout: None,
            headers: IndexMap::new(),
        }
    }
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("default base URL must be valid")
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };

    duration_str::parse(&raw)
        .map(Some)
        .map_err(|e| serde::de::Error::custom(format!("invalid duration '{raw}': {e}")))
}
