use std::path::Path;

use secrecy::ExposeSecret;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::parse(&raw)
    }

    /// Parse and validate configuration from a TOML string
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing or validation fails
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        tracing::debug!(base_url = %config.client.base_url, "configuration loaded");

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint, credentials, headers or request
    /// defaults are unusable
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_client_config()?;
        self.validate_defaults()?;
        Ok(())
    }

    fn validate_client_config(&self) -> anyhow::Result<()> {
        let client = &self.client;

        if !matches!(client.base_url.scheme(), "http" | "https") {
            anyhow::bail!("client.base_url must use http or https, got `{}`", client.base_url);
        }

        if let Some(ref api_key) = client.api_key
            && api_key.expose_secret().is_empty()
        {
            anyhow::bail!("client.api_key must not be empty when set");
        }

        if client.timeout.is_some_and(|timeout| timeout.is_zero()) {
            anyhow::bail!("client.timeout must be greater than 0");
        }

        for (name, value) in &client.headers {
            http::HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| anyhow::anyhow!("invalid header name `{name}` in client.headers: {e}"))?;
            http::HeaderValue::from_str(value)
                .map_err(|e| anyhow::anyhow!("invalid value for header `{name}` in client.headers: {e}"))?;
        }

        Ok(())
    }

    fn validate_defaults(&self) -> anyhow::Result<()> {
        let defaults = &self.defaults;

        if defaults.model.is_empty() {
            anyhow::bail!("defaults.model must not be empty");
        }

        if let Some(temperature) = defaults.temperature
            && !(0.0..=1.0).contains(&temperature)
        {
            anyhow::bail!("defaults.temperature must be between 0 and 1, got {temperature}");
        }

        Ok(())
    }
}
