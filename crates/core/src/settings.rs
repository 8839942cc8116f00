use std::time::Duration;

use polyllm_model::{ErrorKind, ProviderKind};

use crate::credential::{self, ConfigSnapshot, Credential, GLOBAL_PROVIDER};
use crate::{Error, LlmProvider, LlmProviderBuilder};

/// The model to use, overriding the provider's default.
pub const MODEL_VAR: &str = "HINDSIGHT_API_LLM_MODEL";

/// An endpoint override, e.g. a proxy or a remote Ollama server.
pub const BASE_URL_VAR: &str = "HINDSIGHT_API_LLM_BASE_URL";

/// The per-request timeout in whole seconds.
pub const TIMEOUT_VAR: &str = "HINDSIGHT_API_LLM_TIMEOUT_SECS";

/// Everything needed to build an [`LlmProvider`], read from configuration.
#[derive(Clone, Debug)]
pub struct LlmSettings {
    /// The provider to talk to.
    pub provider: ProviderKind,
    /// The model identifier.
    pub model: String,
    /// The endpoint override, if any.
    pub base_url: Option<String>,
    /// The resolved credential. `None` only for providers that need none.
    pub credential: Option<Credential>,
    /// The per-request timeout, if configured.
    pub timeout: Option<Duration>,
}

impl LlmSettings {
    /// Reads the settings from `config`.
    ///
    /// # Errors
    ///
    /// Fails if the configured provider is unsupported, the timeout is not a
    /// positive number of seconds, or no credential is configured for a
    /// provider that requires one.
    pub fn from_config(config: &ConfigSnapshot) -> Result<Self, Error> {
        let provider = match config.get_non_empty(GLOBAL_PROVIDER) {
            Some(tag) => tag.parse()?,
            None => ProviderKind::OpenAI,
        };
        let model = config
            .get_non_empty(MODEL_VAR)
            .map(|m| m.trim().to_owned())
            .unwrap_or_else(|| provider.default_model().to_owned());
        let base_url = config
            .get_non_empty(BASE_URL_VAR)
            .map(|url| url.trim().to_owned());
        let timeout = config
            .get_non_empty(TIMEOUT_VAR)
            .map(|secs| parse_timeout(secs).map_err(|e| e.with_provider(provider)))
            .transpose()?;
        let credential = if provider.requires_api_key() {
            Some(credential::require(provider, config)?)
        } else {
            credential::resolve_for(provider, config)
        };

        debug!(
            "loaded settings for {provider}/{model} (base_url: {base_url:?}, \
             timeout: {timeout:?})"
        );
        Ok(Self {
            provider,
            model,
            base_url,
            credential,
            timeout,
        })
    }

    /// Builds the provider described by these settings.
    pub fn into_provider(self) -> LlmProvider {
        let mut builder = LlmProviderBuilder::with_provider(self.provider)
            .with_model(self.model);
        if let Some(credential) = self.credential {
            builder = builder.with_credential(credential);
        }
        if let Some(base_url) = self.base_url {
            builder = builder.with_base_url(base_url);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.with_timeout(timeout);
        }
        builder.build()
    }
}

fn parse_timeout(secs: &str) -> Result<Duration, Error> {
    match secs.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(Error::new(
            ErrorKind::InvalidRequest,
            format!("{TIMEOUT_VAR} must be a positive integer, got {secs:?}"),
        )),
    }
}
