use std::fmt::Debug;
use std::time::Duration;

use polyllm_model::ProviderKind;

use crate::limits;

/// Default time allowed for one request, including reading the body.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// The services that speak the OpenAI Chat Completions protocol.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OpenAIFlavor {
    /// api.openai.com
    #[default]
    OpenAI,
    /// Groq's OpenAI-compatible endpoint.
    Groq,
    /// A local Ollama server.
    Ollama,
}

impl OpenAIFlavor {
    /// Returns the provider tag of this flavor.
    pub fn provider(&self) -> ProviderKind {
        match self {
            OpenAIFlavor::OpenAI => ProviderKind::OpenAI,
            OpenAIFlavor::Groq => ProviderKind::Groq,
            OpenAIFlavor::Ollama => ProviderKind::Ollama,
        }
    }

    fn default_base_url(&self) -> &'static str {
        match self {
            OpenAIFlavor::OpenAI => "https://api.openai.com/v1",
            OpenAIFlavor::Groq => "https://api.groq.com/openai/v1",
            OpenAIFlavor::Ollama => "http://localhost:11434/v1",
        }
    }
}

/// Builder for [`OpenAIConfig`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct OpenAIConfigBuilder {
    api_key: String,
    flavor: OpenAIFlavor,
    model: Option<String>,
    base_url: Option<String>,
    output_token_ceiling: Option<u32>,
    timeout: Option<Duration>,
}

impl OpenAIConfigBuilder {
    /// Creates a builder with the given API key.
    ///
    /// An empty key is accepted here; requests made with it fail with an
    /// authentication error unless the flavor needs no key.
    #[inline]
    pub fn with_api_key<S: Into<String>>(api_key: S) -> Self {
        Self {
            api_key: api_key.into(),
            flavor: OpenAIFlavor::default(),
            model: None,
            base_url: None,
            output_token_ceiling: None,
            timeout: None,
        }
    }

    /// Sets the service to talk to.
    #[inline]
    pub fn with_flavor(mut self, flavor: OpenAIFlavor) -> Self {
        self.flavor = flavor;
        self
    }

    /// Sets the model to use.
    #[inline]
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets a custom base URL. An empty string keeps the flavor's default.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Overrides the output-token ceiling derived from the model name.
    #[inline]
    pub fn with_output_token_ceiling(mut self, ceiling: u32) -> Self {
        self.output_token_ceiling = Some(ceiling);
        self
    }

    /// Sets the per-request timeout.
    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> OpenAIConfig {
        let flavor = self.flavor;
        let model = self
            .model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| flavor.provider().default_model().to_owned());
        let base_url = self
            .base_url
            .map(|url| url.trim().trim_end_matches('/').to_owned())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| flavor.default_base_url().to_owned());
        let output_token_ceiling = self
            .output_token_ceiling
            .or_else(|| limits::output_token_ceiling(flavor, &model));
        OpenAIConfig {
            api_key: self.api_key,
            flavor,
            model,
            base_url,
            output_token_ceiling,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
        }
    }
}

impl Debug for OpenAIConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIConfigBuilder")
            .field("api_key", &"<redacted>")
            .field("flavor", &self.flavor)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("output_token_ceiling", &self.output_token_ceiling)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Configuration for the OpenAI-compatible provider.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct OpenAIConfig {
    pub(crate) api_key: String,
    pub(crate) flavor: OpenAIFlavor,
    pub(crate) model: String,
    pub(crate) base_url: String,
    pub(crate) output_token_ceiling: Option<u32>,
    pub(crate) timeout: Duration,
}

impl OpenAIConfig {
    /// Returns the model identifier.
    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the base URL requests are sent to.
    #[inline]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the service flavor.
    #[inline]
    pub fn flavor(&self) -> OpenAIFlavor {
        self.flavor
    }
}

impl Debug for OpenAIConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("api_key", &"<redacted>")
            .field("flavor", &self.flavor)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("output_token_ceiling", &self.output_token_ceiling)
            .field("timeout", &self.timeout)
            .finish()
    }
}
