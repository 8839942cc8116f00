//! A model provider for OpenAI-compatible APIs.

#[macro_use]
extern crate tracing;

mod config;
mod limits;
mod proto;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use mime::Mime;
use polyllm_model::{
    ErrorKind, ModelProvider, ModelProviderError, ModelRequest, ModelResponse,
};
use reqwest::Client;
use reqwest::header::{self, HeaderValue};

pub use config::{DEFAULT_TIMEOUT, OpenAIConfig, OpenAIConfigBuilder, OpenAIFlavor};
use proto::ChatCompletion;

/// Error type for [`OpenAIProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
    status: Option<u16>,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
            status: None,
        }
    }

    fn from_status(status: u16, body: &str) -> Self {
        Self {
            message: proto::error_detail(body),
            kind: ErrorKind::from_http_status(status),
            status: Some(status),
        }
    }

    fn from_transport(err: reqwest::Error) -> Self {
        let kind = if err.is_builder() {
            ErrorKind::InvalidRequest
        } else if err.is_decode() {
            ErrorKind::EmptyResult
        } else {
            ErrorKind::Transient
        };
        Self {
            message: format!("{err}"),
            kind,
            status: err.status().map(|s| s.as_u16()),
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "HTTP {status}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    fn status(&self) -> Option<u16> {
        self.status
    }
}

/// OpenAI-compatible model provider.
#[derive(Clone, Debug)]
pub struct OpenAIProvider {
    client: Client,
    config: Arc<OpenAIConfig>,
}

impl OpenAIProvider {
    /// Creates a new `OpenAIProvider` with the given configuration.
    #[inline]
    pub fn new(config: OpenAIConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }

    /// Returns the configuration of this provider.
    #[inline]
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }
}

impl ModelProvider for OpenAIProvider {
    type Error = Error;

    #[inline]
    fn output_token_ceiling(&self) -> Option<u32> {
        self.config.output_token_ceiling
    }

    fn accepts_temperature(&self, temperature: f32) -> bool {
        match self.config.flavor {
            OpenAIFlavor::Ollama => temperature >= 0.0,
            OpenAIFlavor::OpenAI | OpenAIFlavor::Groq => {
                (0.0..=2.0).contains(&temperature)
            }
        }
    }

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<ModelResponse, Self::Error>> + Send + 'static
    {
        let config = &self.config;

        // Don't touch the network when the request can't authenticate.
        let resp_fut = authorization(config).map(|authorization| {
            let openai_req = proto::create_request(req, config);
            let mut builder = self
                .client
                .post(format!("{}{}", config.base_url, "/chat/completions"))
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::ACCEPT, "application/json")
                .timeout(config.timeout)
                .json(&openai_req);
            if let Some(authorization) = authorization {
                builder = builder.header(header::AUTHORIZATION, authorization);
            }
            builder.send()
        });

        async move {
            let resp = resp_fut?.await.map_err(Error::from_transport)?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                debug!("backend answered {status}: {body}");
                return Err(Error::from_status(status.as_u16(), &body));
            }

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(ToOwned::to_owned);
            let is_json = content_type
                .as_deref()
                .and_then(|v| v.parse().ok())
                .map(|m: Mime| {
                    m.subtype() == mime::JSON || m.suffix() == Some(mime::JSON)
                })
                // Some compatible servers omit the header.
                .unwrap_or(true);
            if !is_json {
                return Err(Error::new(
                    format!("Unexpected content type: {content_type:?}"),
                    ErrorKind::EmptyResult,
                ));
            }

            let body = resp.text().await.map_err(Error::from_transport)?;
            trace!("got response body: {body}");
            let completion = serde_json::from_str::<ChatCompletion>(&body)
                .map_err(|err| {
                    Error::new(
                        format!("malformed response: {err}"),
                        ErrorKind::EmptyResult,
                    )
                })?;
            proto::extract_response(completion)
        }
    }
}

/// Returns the `Authorization` header for the configured key, or `None` if
/// the flavor works without one.
fn authorization(config: &OpenAIConfig) -> Result<Option<HeaderValue>, Error> {
    if config.api_key.trim().is_empty() {
        if config.flavor.provider().requires_api_key() {
            return Err(Error::new(
                "API key is missing or empty",
                ErrorKind::Authentication,
            ));
        }
        return Ok(None);
    }
    let mut value = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
        .map_err(|_| {
            Error::new(
                "API key contains characters not allowed in a header",
                ErrorKind::Authentication,
            )
        })?;
    value.set_sensitive(true);
    Ok(Some(value))
}
