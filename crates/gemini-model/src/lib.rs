//! A model provider for the Google Gemini API.

#[macro_use]
extern crate tracing;

mod config;
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

pub use config::{DEFAULT_TIMEOUT, GeminiConfig, GeminiConfigBuilder};
use proto::GenerateContentResponse;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Error type for [`GeminiProvider`].
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
        let (kind, message) = proto::classify_error(status, body);
        Self {
            message,
            kind,
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

/// Gemini model provider.
#[derive(Clone, Debug)]
pub struct GeminiProvider {
    client: Client,
    config: Arc<GeminiConfig>,
}

impl GeminiProvider {
    /// Creates a new `GeminiProvider` with the given configuration.
    #[inline]
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }

    /// Returns the configuration of this provider.
    #[inline]
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }
}

impl ModelProvider for GeminiProvider {
    type Error = Error;

    #[inline]
    fn output_token_ceiling(&self) -> Option<u32> {
        Some(self.config.output_token_ceiling)
    }

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<ModelResponse, Self::Error>> + Send + 'static
    {
        let config = &self.config;

        let resp_fut = api_key_header(config).and_then(|api_key| {
            let endpoint = config.endpoint().ok_or_else(|| {
                Error::new(
                    format!("invalid base URL {:?}", config.base_url),
                    ErrorKind::InvalidRequest,
                )
            })?;
            Ok(self
                .client
                .post(endpoint)
                .header(API_KEY_HEADER, api_key)
                .header(header::CONTENT_TYPE, "application/json")
                .timeout(config.timeout)
                .json(&proto::create_request(req))
                .send())
        });

        async move {
            let resp = resp_fut?.await.map_err(Error::from_transport)?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                debug!("backend answered {status}: {body}");
                return Err(Error::from_status(status.as_u16(), &body));
            }

            let is_json = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .map(|m: Mime| m.subtype() == mime::JSON)
                .unwrap_or(true);
            if !is_json {
                return Err(Error::new(
                    "Unexpected content type",
                    ErrorKind::EmptyResult,
                ));
            }

            let body = resp.text().await.map_err(Error::from_transport)?;
            trace!("got response body: {body}");
            let resp = serde_json::from_str::<GenerateContentResponse>(&body)
                .map_err(|err| {
                    Error::new(
                        format!("malformed response: {err}"),
                        ErrorKind::EmptyResult,
                    )
                })?;
            proto::extract_response(resp)
        }
    }
}

fn api_key_header(config: &GeminiConfig) -> Result<HeaderValue, Error> {
    if config.api_key.trim().is_empty() {
        return Err(Error::new(
            "API key is missing or empty",
            ErrorKind::Authentication,
        ));
    }
    let mut value = HeaderValue::from_str(&config.api_key).map_err(|_| {
        Error::new(
            "API key contains characters not allowed in a header",
            ErrorKind::Authentication,
        )
    })?;
    value.set_sensitive(true);
    Ok(value)
}
