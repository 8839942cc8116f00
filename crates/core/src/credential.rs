//! Credential resolution.
//!
//! Every provider has an ordered list of configuration sources that may hold
//! its API key, most specific first. The generic
//! [`HINDSIGHT_API_LLM_API_KEY`](GLOBAL_API_KEY) source comes last and only
//! counts when [`HINDSIGHT_API_LLM_PROVIDER`](GLOBAL_PROVIDER) names the same
//! provider, so a key configured for one provider never leaks into another.
//!
//! Resolution reads an explicit [`ConfigSnapshot`] instead of the process
//! environment, so it is a pure function of its inputs.

use std::collections::HashMap;
use std::env;
use std::fmt::{self, Debug, Formatter};

use polyllm_model::{ErrorKind, ProviderKind};

use crate::Error;

/// The API key shared by whichever provider is configured globally.
pub const GLOBAL_API_KEY: &str = "HINDSIGHT_API_LLM_API_KEY";

/// The provider [`GLOBAL_API_KEY`] belongs to.
pub const GLOBAL_PROVIDER: &str = "HINDSIGHT_API_LLM_PROVIDER";

/// A secret that authorizes calls to one provider.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential(String);

impl Credential {
    /// Wraps a secret.
    #[inline]
    pub fn new<S: Into<String>>(secret: S) -> Self {
        Self(secret.into())
    }

    /// Returns the secret.
    #[inline]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Consumes the credential and returns the secret.
    #[inline]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&"<redacted>").finish()
    }
}

/// An immutable set of named configuration values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigSnapshot {
    values: HashMap<String, String>,
}

impl ConfigSnapshot {
    /// Captures the current process environment. Variables whose name or
    /// value is not valid Unicode are skipped.
    pub fn from_env() -> Self {
        env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }

    /// Returns the value of `name`, if set.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Returns the value of `name` if it is set to something other than
    /// blanks.
    #[inline]
    pub fn get_non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|v| !v.trim().is_empty())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ConfigSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Returns the sources probed for `provider`, in priority order.
pub fn candidate_sources(provider: ProviderKind) -> &'static [&'static str] {
    match provider {
        ProviderKind::OpenAI => &["OPENAI_API_KEY", GLOBAL_API_KEY],
        ProviderKind::Groq => &["GROQ_API_KEY", GLOBAL_API_KEY],
        ProviderKind::Gemini => {
            &["GEMINI_API_KEY", "GOOGLE_API_KEY", GLOBAL_API_KEY]
        }
        ProviderKind::Ollama => &["OLLAMA_API_KEY", GLOBAL_API_KEY],
    }
}

/// Resolves the credential for a provider tag.
///
/// Unknown tags resolve to `None`; the tag is matched ignoring case.
pub fn resolve(provider: &str, config: &ConfigSnapshot) -> Option<Credential> {
    let provider = provider.parse().ok()?;
    resolve_for(provider, config)
}

/// Resolves the credential for a provider.
///
/// The secret is returned without surrounding whitespace, so keys read from
/// files with a trailing newline still work.
pub fn resolve_for(
    provider: ProviderKind,
    config: &ConfigSnapshot,
) -> Option<Credential> {
    candidate_sources(provider)
        .iter()
        .filter(|&&source| source != GLOBAL_API_KEY || global_key_applies(provider, config))
        .find_map(|source| config.get_non_empty(source))
        .map(|secret| Credential::new(secret.trim()))
}

/// Like [`resolve_for`], but reports a missing credential as an error of
/// kind [`NoCredential`](ErrorKind::NoCredential).
pub fn require(
    provider: ProviderKind,
    config: &ConfigSnapshot,
) -> Result<Credential, Error> {
    resolve_for(provider, config).ok_or_else(|| {
        let sources = candidate_sources(provider).join(", ");
        Error::new(ErrorKind::NoCredential, format!("none of {sources} is set"))
            .with_provider(provider)
    })
}

fn global_key_applies(provider: ProviderKind, config: &ConfigSnapshot) -> bool {
    config
        .get(GLOBAL_PROVIDER)
        .is_some_and(|configured| {
            configured.trim().eq_ignore_ascii_case(provider.as_str())
        })
}
