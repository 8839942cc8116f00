use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The supported LLM backends.
///
/// This set is closed: every variant has exactly one backend strategy, and
/// adding a backend means adding a variant here.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI Chat Completions.
    OpenAI,
    /// Groq, an OpenAI-compatible service.
    Groq,
    /// Google Gemini.
    Gemini,
    /// A local Ollama server speaking the OpenAI-compatible protocol.
    Ollama,
}

impl ProviderKind {
    /// All supported providers.
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::OpenAI,
        ProviderKind::Groq,
        ProviderKind::Gemini,
        ProviderKind::Ollama,
    ];

    /// Returns the lowercase tag of this provider.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "openai",
            ProviderKind::Groq => "groq",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Ollama => "ollama",
        }
    }

    /// Returns `true` if calls to this provider need an API key.
    #[inline]
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, ProviderKind::Ollama)
    }

    /// The model used when none is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "gpt-4o-mini",
            ProviderKind::Groq => "openai/gpt-oss-120b",
            ProviderKind::Gemini => "gemini-2.0-flash",
            ProviderKind::Ollama => "llama3.2",
        }
    }
}

impl Display for ProviderKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown provider tag.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UnsupportedProvider(pub String);

impl Display for UnsupportedProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported provider: {:?}", self.0)
    }
}

impl Error for UnsupportedProvider {}

impl FromStr for ProviderKind {
    type Err = UnsupportedProvider;

    /// Parses a provider tag, ignoring ASCII case and surrounding spaces.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(tag))
            .ok_or_else(|| UnsupportedProvider(s.to_owned()))
    }
}

/// Identifies the backend strategy and the model variant to use.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderIdentity {
    provider: ProviderKind,
    model: String,
}

impl ProviderIdentity {
    /// Creates a new identity.
    #[inline]
    pub fn new<S: Into<String>>(provider: ProviderKind, model: S) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Returns the provider.
    #[inline]
    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    /// Returns the model identifier.
    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl Display for ProviderIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider, self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags() {
        assert_eq!("openai".parse(), Ok(ProviderKind::OpenAI));
        assert_eq!("GROQ".parse(), Ok(ProviderKind::Groq));
        assert_eq!(" Gemini ".parse(), Ok(ProviderKind::Gemini));
        assert_eq!("ollama".parse(), Ok(ProviderKind::Ollama));
        assert_eq!(
            "anthropic".parse::<ProviderKind>(),
            Err(UnsupportedProvider("anthropic".to_owned()))
        );
        assert!("".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_tags_round_trip_through_display() {
        for kind in ProviderKind::ALL {
            assert_eq!(kind.to_string().parse(), Ok(kind));
        }
    }

    #[test]
    fn test_identity_display() {
        let identity =
            ProviderIdentity::new(ProviderKind::Groq, "openai/gpt-oss-120b");
        assert_eq!(identity.to_string(), "groq/openai/gpt-oss-120b");
        assert_eq!(identity.provider(), ProviderKind::Groq);
        assert_eq!(identity.model(), "openai/gpt-oss-120b");
    }
}
