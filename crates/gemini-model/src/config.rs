use std::fmt::Debug;
use std::time::Duration;

use polyllm_model::ProviderKind;
use reqwest::Url;

const GEMINI_API_BASE: &str =
    "https://generativelanguage.googleapis.com/v1beta";

/// Default time allowed for one request, including reading the body.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Builder for [`GeminiConfig`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct GeminiConfigBuilder {
    api_key: String,
    model: Option<String>,
    base_url: Option<String>,
    output_token_ceiling: Option<u32>,
    timeout: Option<Duration>,
}

impl GeminiConfigBuilder {
    /// Creates a builder with the given API key.
    #[inline]
    pub fn with_api_key<S: Into<String>>(api_key: S) -> Self {
        Self {
            api_key: api_key.into(),
            model: None,
            base_url: None,
            output_token_ceiling: None,
            timeout: None,
        }
    }

    /// Sets the model to use, e.g. `gemini-2.0-flash`.
    #[inline]
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets a custom base URL. An empty string keeps the public endpoint.
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
    pub fn build(self) -> GeminiConfig {
        let model = self
            .model
            .map(|m| m.trim().trim_start_matches("models/").to_owned())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| ProviderKind::Gemini.default_model().to_owned());
        let base_url = self
            .base_url
            .map(|url| url.trim().trim_end_matches('/').to_owned())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| GEMINI_API_BASE.to_owned());
        let output_token_ceiling = self
            .output_token_ceiling
            .unwrap_or_else(|| output_token_ceiling(&model));
        GeminiConfig {
            api_key: self.api_key,
            model,
            base_url,
            output_token_ceiling,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
        }
    }
}

impl Debug for GeminiConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfigBuilder")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("output_token_ceiling", &self.output_token_ceiling)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Configuration for the Gemini provider.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct GeminiConfig {
    pub(crate) api_key: String,
    pub(crate) model: String,
    pub(crate) base_url: String,
    pub(crate) output_token_ceiling: u32,
    pub(crate) timeout: Duration,
}

impl GeminiConfig {
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

    /// Returns the `generateContent` URL of the model, or `None` if the base
    /// URL can't carry a path. The model id is percent-encoded as a single
    /// path segment.
    pub(crate) fn endpoint(&self) -> Option<Url> {
        let mut url = Url::parse(&self.base_url).ok()?;
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .push("models")
            .push(&format!("{}:generateContent", self.model));
        Some(url)
    }
}

impl Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("output_token_ceiling", &self.output_token_ceiling)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn output_token_ceiling(model: &str) -> u32 {
    if model.starts_with("gemini-2.5") {
        65_536
    } else {
        // 2.0 and 1.5 generations, and anything we don't know yet.
        8_192
    }
}
