//! Calls the real providers whose credentials are present in the
//! environment. Combinations without a credential are skipped, so the test
//! passes trivially offline.

use polyllm_core::credential::{self, ConfigSnapshot};
use polyllm_core::{ErrorKind, LlmProviderBuilder, ModelMessage, ProviderKind};

const MODELS: &[(ProviderKind, &str)] = &[
    (ProviderKind::OpenAI, "gpt-4o-mini"),
    (ProviderKind::OpenAI, "gpt-5-mini"),
    (ProviderKind::Groq, "llama-3.3-70b-versatile"),
    (ProviderKind::Groq, "openai/gpt-oss-120b"),
    (ProviderKind::Gemini, "gemini-2.0-flash"),
    (ProviderKind::Gemini, "gemini-2.5-flash-preview-05-20"),
];

#[tokio::test]
async fn test_live_connection_and_large_output() {
    let config = ConfigSnapshot::from_env();

    for &(kind, model) in MODELS {
        let Some(credential) = credential::resolve_for(kind, &config) else {
            eprintln!("skipping {kind}/{model}: no credential");
            continue;
        };
        let provider = LlmProviderBuilder::with_provider(kind)
            .with_credential(credential)
            .with_model(model)
            .build();

        let check = provider.verify_connection().await;
        assert!(check.is_verified(), "{kind}/{model}: {:?}", check.error());

        let output = provider
            .call(
                [ModelMessage::user(
                    "Write a detailed essay about the history of computing.",
                )],
                65_000,
                None,
            )
            .await
            .unwrap_or_else(|err| panic!("{kind}/{model}: {err}"));
        assert!(!output.content.is_empty());
        assert_eq!(output.requested_max_completion_tokens, 65_000);
        assert!(output.max_completion_tokens <= 65_000);
    }
}

#[tokio::test]
async fn test_live_bad_credential() {
    let config = ConfigSnapshot::from_env();
    if credential::resolve_for(ProviderKind::OpenAI, &config).is_none() {
        eprintln!("skipping: OpenAI is not configured");
        return;
    }

    let provider = LlmProviderBuilder::with_provider(ProviderKind::OpenAI)
        .with_api_key("sk-invalid")
        .build();
    let err = provider
        .call([ModelMessage::user("Hi")], 16, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authentication);
}
