use crate::OpenAIFlavor;

/// Returns the largest completion budget the model accepts, or `None` when
/// the service doesn't enforce one.
pub fn output_token_ceiling(flavor: OpenAIFlavor, model: &str) -> Option<u32> {
    match flavor {
        OpenAIFlavor::OpenAI => Some(openai_ceiling(model)),
        OpenAIFlavor::Groq => Some(groq_ceiling(model)),
        // Local servers truncate on their own.
        OpenAIFlavor::Ollama => None,
    }
}

fn openai_ceiling(model: &str) -> u32 {
    if model.starts_with("gpt-5") {
        128_000
    } else if is_o_series(model) {
        100_000
    } else if model.starts_with("gpt-4.1") {
        32_768
    } else if model.starts_with("gpt-4o") {
        16_384
    } else if model.starts_with("gpt-4") || model.starts_with("gpt-3.5") {
        4_096
    } else {
        16_384
    }
}

fn groq_ceiling(model: &str) -> u32 {
    if model.starts_with("openai/gpt-oss-") {
        65_536
    } else if model == "llama-3.3-70b-versatile" {
        32_768
    } else if model == "llama-3.1-8b-instant" {
        131_072
    } else {
        8_192
    }
}

fn is_o_series(model: &str) -> bool {
    ["o1", "o3", "o4"].iter().any(|prefix| {
        model
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('-'))
    })
}

/// Returns `true` for OpenAI reasoning models, which only accept the
/// default sampling temperature.
pub fn is_reasoning_model(flavor: OpenAIFlavor, model: &str) -> bool {
    flavor == OpenAIFlavor::OpenAI
        && (model.starts_with("gpt-5") || is_o_series(model))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_ceilings() {
        let ceiling = |m| output_token_ceiling(OpenAIFlavor::OpenAI, m);
        assert_eq!(ceiling("gpt-5-mini"), Some(128_000));
        assert_eq!(ceiling("o3-mini"), Some(100_000));
        assert_eq!(ceiling("o1"), Some(100_000));
        assert_eq!(ceiling("gpt-4.1-nano"), Some(32_768));
        assert_eq!(ceiling("gpt-4o-mini"), Some(16_384));
        assert_eq!(ceiling("gpt-4-turbo"), Some(4_096));
        assert_eq!(ceiling("ft:custom"), Some(16_384));
    }

    #[test]
    fn test_groq_and_ollama_ceilings() {
        let ceiling = |m| output_token_ceiling(OpenAIFlavor::Groq, m);
        assert_eq!(ceiling("openai/gpt-oss-120b"), Some(65_536));
        assert_eq!(ceiling("llama-3.3-70b-versatile"), Some(32_768));
        assert_eq!(ceiling("mixtral-8x7b-32768"), Some(8_192));
        assert_eq!(output_token_ceiling(OpenAIFlavor::Ollama, "llama3.2"), None);
    }

    #[test]
    fn test_reasoning_models() {
        assert!(is_reasoning_model(OpenAIFlavor::OpenAI, "gpt-5-mini"));
        assert!(is_reasoning_model(OpenAIFlavor::OpenAI, "o4-mini"));
        assert!(!is_reasoning_model(OpenAIFlavor::OpenAI, "gpt-4o-mini"));
        assert!(!is_reasoning_model(OpenAIFlavor::OpenAI, "omni-moderation"));
        assert!(!is_reasoning_model(OpenAIFlavor::Groq, "openai/gpt-oss-120b"));
    }
}
