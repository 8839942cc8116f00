use polyllm_model::{
    ErrorKind, ModelFinishReason, ModelMessage, ModelRequest, ModelResponse,
    Role, TokenUsage,
};
use serde::{Deserialize, Serialize};

use crate::{Error, OpenAIConfig, OpenAIFlavor, limits};

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Choice {
    pub message: Option<ResponseMessage>,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
    pub refusal: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
struct ErrorBody {
    message: String,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System { content: String },
    User { content: String },
    Assistant { content: String },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

// -----------
// Conversions
// -----------

pub fn create_request(
    req: &ModelRequest,
    config: &OpenAIConfig,
) -> ChatCompletionRequest {
    let budget = Some(req.max_completion_tokens);
    // Ollama's compatibility layer only understands the legacy field.
    let (max_completion_tokens, max_tokens) = match config.flavor {
        OpenAIFlavor::Ollama => (None, budget),
        OpenAIFlavor::OpenAI | OpenAIFlavor::Groq => (budget, None),
    };
    let temperature = req
        .temperature
        .filter(|_| !limits::is_reasoning_model(config.flavor, &config.model));

    ChatCompletionRequest {
        model: config.model.clone(),
        messages: req.messages.iter().map(create_message).collect(),
        max_completion_tokens,
        max_tokens,
        temperature,
        stream: false,
    }
}

#[inline]
fn create_message(msg: &ModelMessage) -> Message {
    let content = msg.content.clone();
    match msg.role {
        Role::System => Message::System { content },
        Role::User => Message::User { content },
        Role::Assistant => Message::Assistant { content },
    }
}

pub fn extract_response(completion: ChatCompletion) -> Result<ModelResponse, Error> {
    let usage = completion.usage.map(|u| TokenUsage {
        prompt_tokens: u.prompt_tokens,
        completion_tokens: u.completion_tokens,
    });
    let Some(choice) = completion.choices.into_iter().next() else {
        return Err(Error::new("response has no choices", ErrorKind::EmptyResult));
    };
    let finish_reason = choice.finish_reason.as_deref().map(finish_reason);

    let message = choice.message.unwrap_or(ResponseMessage {
        content: None,
        refusal: None,
    });
    match message.content {
        Some(content) if !content.trim().is_empty() => Ok(ModelResponse {
            content,
            finish_reason,
            usage,
        }),
        _ => {
            let detail = match (message.refusal, finish_reason) {
                (Some(refusal), _) => format!("model refused: {refusal}"),
                (None, Some(ModelFinishReason::Length)) => {
                    "completion budget exhausted before any content".to_owned()
                }
                (None, _) => "response has no content".to_owned(),
            };
            Err(Error::new(detail, ErrorKind::EmptyResult))
        }
    }
}

fn finish_reason(reason: &str) -> ModelFinishReason {
    match reason {
        "stop" => ModelFinishReason::Stop,
        "length" => ModelFinishReason::Length,
        "content_filter" => ModelFinishReason::ContentFilter,
        _ => ModelFinishReason::Other,
    }
}

/// Pulls the human-readable message out of an error body, falling back to
/// the raw body.
pub fn error_detail(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) => body.trim().to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::OpenAIConfigBuilder;

    #[test]
    fn test_create_request() {
        let request = ModelRequest::new(
            [
                ModelMessage::system("You are a helpful assistant."),
                ModelMessage::user("Hello"),
                ModelMessage::assistant("Hi!"),
                ModelMessage::user("Say 'hello' and nothing else."),
            ],
            50,
        )
        .with_temperature(0.5);
        let config = OpenAIConfigBuilder::with_api_key("xxx")
            .with_model("custom")
            .build();
        let expected = json!({
            "model": "custom",
            "messages": [
                { "role": "system", "content": "You are a helpful assistant." },
                { "role": "user", "content": "Hello" },
                { "role": "assistant", "content": "Hi!" },
                { "role": "user", "content": "Say 'hello' and nothing else." },
            ],
            "max_completion_tokens": 50,
            "temperature": 0.5,
            "stream": false,
        });
        let actual =
            serde_json::to_value(create_request(&request, &config)).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_temperature_omitted_when_unset() {
        let request = ModelRequest::new([ModelMessage::user("Hi")], 10);
        let config = OpenAIConfigBuilder::with_api_key("xxx").build();
        let actual =
            serde_json::to_value(create_request(&request, &config)).unwrap();
        assert!(actual.get("temperature").is_none());
    }

    #[test]
    fn test_reasoning_model_drops_temperature() {
        let request =
            ModelRequest::new([ModelMessage::user("Hi")], 10).with_temperature(0.1);
        let config = OpenAIConfigBuilder::with_api_key("xxx")
            .with_model("gpt-5-mini")
            .build();
        let actual =
            serde_json::to_value(create_request(&request, &config)).unwrap();
        assert!(actual.get("temperature").is_none());
        assert_eq!(actual["max_completion_tokens"], 10);
    }

    #[test]
    fn test_ollama_uses_max_tokens() {
        let request = ModelRequest::new([ModelMessage::user("Hi")], 64);
        let config = OpenAIConfigBuilder::with_api_key("")
            .with_flavor(OpenAIFlavor::Ollama)
            .build();
        let actual =
            serde_json::to_value(create_request(&request, &config)).unwrap();
        assert_eq!(actual["max_tokens"], 64);
        assert!(actual.get("max_completion_tokens").is_none());
    }

    #[test]
    fn test_extract_response() {
        let completion: ChatCompletion = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "hello" },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 12, "completion_tokens": 1, "total_tokens": 13 }
        }))
        .unwrap();
        let resp = extract_response(completion).unwrap();
        assert_eq!(resp.content, "hello");
        assert_eq!(resp.finish_reason, Some(ModelFinishReason::Stop));
        assert_eq!(
            resp.usage,
            Some(TokenUsage {
                prompt_tokens: 12,
                completion_tokens: 1
            })
        );
    }

    #[test]
    fn test_extract_empty_response() {
        let completion: ChatCompletion =
            serde_json::from_value(json!({ "choices": [] })).unwrap();
        let err = extract_response(completion).unwrap_err();
        assert_eq!(err.kind, ErrorKind::EmptyResult);

        let completion: ChatCompletion = serde_json::from_value(json!({
            "choices": [{
                "message": { "role": "assistant", "content": "" },
                "finish_reason": "length"
            }]
        }))
        .unwrap();
        let err = extract_response(completion).unwrap_err();
        assert_eq!(err.kind, ErrorKind::EmptyResult);
        assert!(err.message().contains("budget"));

        let completion: ChatCompletion = serde_json::from_value(json!({
            "choices": [{
                "message": { "role": "assistant", "content": null, "refusal": "no" }
            }]
        }))
        .unwrap();
        let err = extract_response(completion).unwrap_err();
        assert!(err.message().contains("refused"));
    }

    #[test]
    fn test_error_detail() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        assert_eq!(error_detail(body), "Incorrect API key provided");
        assert_eq!(error_detail(" upstream timeout \n"), "upstream timeout");
    }
}
