use std::error::Error as StdError;
use std::fmt::{self, Display};

use polyllm_model::{
    ErrorKind, ModelProviderError, ProviderIdentity, ProviderKind,
    UnsupportedProvider,
};

/// The uniform failure of every operation in this crate.
///
/// Besides the [`ErrorKind`], an error carries the provider, the model and
/// the backend's HTTP status when they are known, so that callers can log
/// it meaningfully.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Error {
    kind: ErrorKind,
    message: String,
    provider: Option<ProviderKind>,
    model: Option<String>,
    status: Option<u16>,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            provider: None,
            model: None,
            status: None,
        }
    }

    pub(crate) fn from_provider_error<E: ModelProviderError>(
        err: &E,
        identity: &ProviderIdentity,
    ) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
            provider: Some(identity.provider()),
            model: Some(identity.model().to_owned()),
            status: err.status(),
        }
    }

    pub(crate) fn with_provider(mut self, provider: ProviderKind) -> Self {
        self.provider = Some(provider);
        self
    }

    pub(crate) fn with_identity(mut self, identity: &ProviderIdentity) -> Self {
        self.provider = Some(identity.provider());
        self.model = Some(identity.model().to_owned());
        self
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the detail message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the provider involved, if known.
    #[inline]
    pub fn provider(&self) -> Option<ProviderKind> {
        self.provider
    }

    /// Returns the model involved, if known.
    #[inline]
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Returns the HTTP status the backend answered with, if any.
    #[inline]
    pub fn status(&self) -> Option<u16> {
        self.status
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.provider, &self.model) {
            (Some(provider), Some(model)) => write!(f, "{provider}/{model}: ")?,
            (Some(provider), None) => write!(f, "{provider}: ")?,
            _ => {}
        }
        write!(f, "{}", self.kind)?;
        if self.message.is_empty() {
            return Ok(());
        }
        write!(f, ": {}", self.message)
    }
}

impl StdError for Error {}

impl From<UnsupportedProvider> for Error {
    fn from(err: UnsupportedProvider) -> Self {
        Error::new(ErrorKind::UnsupportedProvider, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let identity = ProviderIdentity::new(ProviderKind::OpenAI, "gpt-4o-mini");
        let err = Error::new(ErrorKind::Rejected, "HTTP 429: quota exceeded")
            .with_identity(&identity);
        assert_eq!(
            err.to_string(),
            "openai/gpt-4o-mini: backend rejected request: HTTP 429: quota exceeded"
        );

        let err = Error::new(ErrorKind::NoCredential, "")
            .with_provider(ProviderKind::Groq);
        assert_eq!(err.to_string(), "groq: no credential");
    }

    #[test]
    fn test_from_unsupported_provider() {
        let err: Error = "anthropic".parse::<ProviderKind>().unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::UnsupportedProvider);
        assert!(err.message().contains("anthropic"));
        assert_eq!(err.provider(), None);
    }
}
