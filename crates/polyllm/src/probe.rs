//! Checks which provider and model combinations actually work.

use polyllm_core::credential::{self, ConfigSnapshot};
use polyllm_core::{
    CallOutput, ConnectionCheck, Error, LlmProvider, LlmProviderBuilder,
    ModelMessage, ProviderKind,
};

/// The completion budget of the large-output probe. It is above the ceiling
/// of most models on purpose.
pub const LARGE_OUTPUT_MAX_COMPLETION_TOKENS: u32 = 65_000;

const LARGE_OUTPUT_PROMPT: &str =
    "Write a detailed essay about the history of computing.";

/// The combinations probed when none are named.
pub const DEFAULT_MATRIX: &[(ProviderKind, &str)] = &[
    (ProviderKind::OpenAI, "gpt-4o-mini"),
    (ProviderKind::OpenAI, "gpt-5-mini"),
    (ProviderKind::Groq, "llama-3.3-70b-versatile"),
    (ProviderKind::Groq, "openai/gpt-oss-120b"),
    (ProviderKind::Gemini, "gemini-2.0-flash"),
    (ProviderKind::Gemini, "gemini-2.5-flash-preview-05-20"),
];

/// One provider and model combination.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProbeTarget {
    /// The provider.
    pub provider: ProviderKind,
    /// The model.
    pub model: String,
}

impl ProbeTarget {
    /// Creates a target.
    #[inline]
    pub fn new<S: Into<String>>(provider: ProviderKind, model: S) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }
}

/// Picks the combinations to probe.
///
/// With no providers, the [`DEFAULT_MATRIX`] is used, or OpenAI if a model
/// is given. Each named provider is probed with `model` if given, otherwise
/// with its models from the matrix, or its default model if the matrix has
/// none.
pub fn select_targets(
    providers: &[ProviderKind],
    model: Option<&str>,
) -> Vec<ProbeTarget> {
    match (providers, model) {
        ([], None) => DEFAULT_MATRIX
            .iter()
            .map(|&(provider, model)| ProbeTarget::new(provider, model))
            .collect(),
        ([], Some(model)) => vec![ProbeTarget::new(ProviderKind::OpenAI, model)],
        (providers, Some(model)) => providers
            .iter()
            .map(|&provider| ProbeTarget::new(provider, model))
            .collect(),
        (providers, None) => providers
            .iter()
            .flat_map(|&provider| {
                let mut models: Vec<_> = DEFAULT_MATRIX
                    .iter()
                    .filter(|(p, _)| *p == provider)
                    .map(|&(_, model)| ProbeTarget::new(provider, model))
                    .collect();
                if models.is_empty() {
                    models.push(ProbeTarget::new(
                        provider,
                        provider.default_model(),
                    ));
                }
                models
            })
            .collect(),
    }
}

/// Builds the provider for `target` from the credentials in `config`.
///
/// Returns `None` if the provider needs a credential and none is
/// configured.
pub fn build_provider(
    target: &ProbeTarget,
    config: &ConfigSnapshot,
) -> Option<LlmProvider> {
    let credential = credential::resolve_for(target.provider, config);
    if credential.is_none() && target.provider.requires_api_key() {
        return None;
    }
    let mut builder = LlmProviderBuilder::with_provider(target.provider)
        .with_model(target.model.as_str());
    if let Some(credential) = credential {
        builder = builder.with_credential(credential);
    }
    if target.provider == ProviderKind::Ollama {
        if let Some(base_url) = config.get_non_empty(polyllm_core::BASE_URL_VAR)
        {
            builder = builder.with_base_url(base_url);
        }
    }
    Some(builder.build())
}

/// What to run against each target besides the connection check.
#[derive(Clone, Debug, Default)]
pub struct ProbeOptions {
    /// Also run a call whose budget exceeds most ceilings.
    pub large_output: bool,
    /// Also send this prompt.
    pub prompt: Option<String>,
}

/// The results of probing one target.
#[derive(Debug)]
pub struct ProbeReport {
    /// The connection check.
    pub connection: ConnectionCheck,
    /// The large-output call, if requested.
    pub large_output: Option<Result<CallOutput, Error>>,
    /// The reply to the custom prompt, if requested.
    pub reply: Option<Result<CallOutput, Error>>,
}

impl ProbeReport {
    /// Returns `true` if every check succeeded.
    pub fn passed(&self) -> bool {
        self.connection.is_verified()
            && self.large_output.as_ref().is_none_or(Result::is_ok)
            && self.reply.as_ref().is_none_or(Result::is_ok)
    }
}

/// Runs the checks in `options` against `provider`.
///
/// The extra calls are skipped when the connection check fails.
pub async fn run(provider: &LlmProvider, options: &ProbeOptions) -> ProbeReport {
    let identity = provider.identity();
    let connection = provider.verify_connection().await;
    if let ConnectionCheck::Failed(err) = &connection {
        info!("{identity} failed the connection check: {err}");
        return ProbeReport {
            connection,
            large_output: None,
            reply: None,
        };
    }

    let large_output = if options.large_output {
        let result = provider
            .call(
                [ModelMessage::user(LARGE_OUTPUT_PROMPT)],
                LARGE_OUTPUT_MAX_COMPLETION_TOKENS,
                None,
            )
            .await;
        if let Ok(output) = &result {
            info!(
                "{identity} produced {} chars with max_completion_tokens {}",
                output.content.len(),
                output.max_completion_tokens
            );
        }
        Some(result)
    } else {
        None
    };

    let reply = match &options.prompt {
        Some(prompt) => Some(
            provider
                .call([ModelMessage::user(prompt.as_str())], 1_024, None)
                .await,
        ),
        None => None,
    };

    ProbeReport {
        connection,
        large_output,
        reply,
    }
}

#[cfg(test)]
mod tests {
    use polyllm_core::{ErrorKind, ProviderIdentity};
    use polyllm_test_model::{PresetResponse, TestModelProvider};

    use super::*;

    #[test]
    fn test_select_targets() {
        assert_eq!(select_targets(&[], None).len(), DEFAULT_MATRIX.len());
        assert_eq!(
            select_targets(&[], Some("gpt-4.1")),
            vec![ProbeTarget::new(ProviderKind::OpenAI, "gpt-4.1")]
        );
        assert_eq!(
            select_targets(&[ProviderKind::Groq, ProviderKind::Ollama], None),
            vec![
                ProbeTarget::new(ProviderKind::Groq, "llama-3.3-70b-versatile"),
                ProbeTarget::new(ProviderKind::Groq, "openai/gpt-oss-120b"),
                ProbeTarget::new(ProviderKind::Ollama, "llama3.2"),
            ]
        );
        assert_eq!(
            select_targets(&[ProviderKind::Gemini], Some("gemini-2.5-pro")),
            vec![ProbeTarget::new(ProviderKind::Gemini, "gemini-2.5-pro")]
        );
    }

    #[test]
    fn test_build_provider_skips_missing_credentials() {
        let config: ConfigSnapshot = [("GOOGLE_API_KEY", "g")].into_iter().collect();
        let target = ProbeTarget::new(ProviderKind::OpenAI, "gpt-4o-mini");
        assert!(build_provider(&target, &config).is_none());

        let target = ProbeTarget::new(ProviderKind::Gemini, "gemini-2.0-flash");
        let provider = build_provider(&target, &config).unwrap();
        assert_eq!(provider.identity().to_string(), "gemini/gemini-2.0-flash");

        let target = ProbeTarget::new(ProviderKind::Ollama, "llama3.2");
        assert!(build_provider(&target, &config).is_some());
    }

    fn stub(model_provider: &TestModelProvider) -> LlmProvider {
        LlmProvider::with_model_provider(
            ProviderIdentity::new(ProviderKind::OpenAI, "gpt-4o-mini"),
            model_provider.clone(),
        )
    }

    #[tokio::test]
    async fn test_run_reports_clamped_large_output() {
        let mut model_provider = TestModelProvider::default();
        model_provider.set_output_token_ceiling(16_384);
        let provider = stub(&model_provider);

        let options = ProbeOptions {
            large_output: true,
            prompt: Some("Hi".to_owned()),
        };
        let report = run(&provider, &options).await;
        assert!(report.passed());

        let large_output = report.large_output.unwrap().unwrap();
        assert_eq!(large_output.max_completion_tokens, 16_384);
        assert!(large_output.was_clamped());
        assert_eq!(report.reply.unwrap().unwrap().content, "You said Hi");
    }

    #[tokio::test]
    async fn test_run_stops_after_failed_check() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_response(PresetResponse::http_failure(403));
        let provider = stub(&model_provider);

        let options = ProbeOptions {
            large_output: true,
            prompt: None,
        };
        let report = run(&provider, &options).await;
        assert!(!report.passed());
        assert_eq!(
            report.connection.error().map(Error::kind),
            Some(ErrorKind::Authentication)
        );
        assert!(report.large_output.is_none());
        assert_eq!(model_provider.received_requests().len(), 1);
    }
}
