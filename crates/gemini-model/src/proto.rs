use polyllm_model::{
    ErrorKind, ModelFinishReason, ModelRequest, ModelResponse, Role,
    TokenUsage,
};
use serde::{Deserialize, Serialize};

use crate::Error;

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<ResponseContent>,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ResponseContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
    #[serde(default)]
    pub thought: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
struct ErrorDetail {
    reason: Option<String>,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Part {
    text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

// -----------
// Conversions
// -----------

pub fn create_request(req: &ModelRequest) -> GenerateContentRequest {
    // Gemini takes system prompts out of band.
    let system_parts: Vec<Part> = req
        .messages
        .iter()
        .filter(|msg| msg.role == Role::System)
        .map(|msg| Part {
            text: msg.content.clone(),
        })
        .collect();
    let contents = req
        .messages
        .iter()
        .filter_map(|msg| {
            let role = match msg.role {
                Role::System => return None,
                Role::User => "user",
                Role::Assistant => "model",
            };
            Some(Content {
                role: Some(role),
                parts: vec![Part {
                    text: msg.content.clone(),
                }],
            })
        })
        .collect();

    GenerateContentRequest {
        contents,
        system_instruction: (!system_parts.is_empty()).then_some(Content {
            role: None,
            parts: system_parts,
        }),
        generation_config: GenerationConfig {
            max_output_tokens: req.max_completion_tokens,
            temperature: req.temperature,
        },
    }
}

pub fn extract_response(
    resp: GenerateContentResponse,
) -> Result<ModelResponse, Error> {
    let usage = resp.usage_metadata.map(|u| TokenUsage {
        prompt_tokens: u.prompt_token_count,
        completion_tokens: u.candidates_token_count,
    });
    let Some(candidate) = resp.candidates.into_iter().next() else {
        let detail = match resp.prompt_feedback.and_then(|f| f.block_reason) {
            Some(reason) => format!("prompt blocked: {reason}"),
            None => "response has no candidates".to_owned(),
        };
        return Err(Error::new(detail, ErrorKind::EmptyResult));
    };
    let finish_reason = candidate.finish_reason.as_deref().map(finish_reason);

    let content: String = candidate
        .content
        .into_iter()
        .flat_map(|c| c.parts)
        .filter(|part| !part.thought)
        .filter_map(|part| part.text)
        .collect();
    if content.trim().is_empty() {
        let detail = match finish_reason {
            Some(ModelFinishReason::Length) => {
                "completion budget exhausted before any content"
            }
            Some(ModelFinishReason::ContentFilter) => "candidate was filtered",
            _ => "response has no content",
        };
        return Err(Error::new(detail, ErrorKind::EmptyResult));
    }

    Ok(ModelResponse {
        content,
        finish_reason,
        usage,
    })
}

fn finish_reason(reason: &str) -> ModelFinishReason {
    match reason {
        "STOP" => ModelFinishReason::Stop,
        "MAX_TOKENS" => ModelFinishReason::Length,
        "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" => {
            ModelFinishReason::ContentFilter
        }
        _ => ModelFinishReason::Other,
    }
}

/// Classifies an error body. Gemini answers a bad key with 400 instead of
/// 401, so the reason code decides.
pub fn classify_error(status: u16, body: &str) -> (ErrorKind, String) {
    let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) else {
        return (ErrorKind::from_http_status(status), body.trim().to_owned());
    };
    let invalid_key = envelope
        .error
        .details
        .iter()
        .any(|d| d.reason.as_deref() == Some("API_KEY_INVALID"));
    let kind = if invalid_key {
        ErrorKind::Authentication
    } else {
        ErrorKind::from_http_status(status)
    };
    (kind, envelope.error.message)
}
