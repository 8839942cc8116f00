use serde::{Deserialize, Serialize};

/// The reason why a model response has finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelFinishReason {
    /// The model has finished generating text.
    Stop,
    /// The completion budget was exhausted.
    Length,
    /// The backend filtered the output.
    ContentFilter,
    /// Any reason this crate doesn't model.
    Other,
}

/// Token accounting reported by the backend.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub struct TokenUsage {
    /// Tokens consumed by the input messages.
    pub prompt_tokens: u32,
    /// Tokens generated by the model.
    pub completion_tokens: u32,
}

/// A complete, non-empty response from the model provider.
///
/// Providers must report a response without extractable text as an error
/// of kind [`EmptyResult`](crate::ErrorKind::EmptyResult) instead of
/// returning an empty `content`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelResponse {
    /// The generated text.
    pub content: String,
    /// Why the model stopped, if the backend said so.
    pub finish_reason: Option<ModelFinishReason>,
    /// Token usage, if the backend reported it.
    pub usage: Option<TokenUsage>,
}

impl ModelResponse {
    /// Creates a response carrying only text.
    #[inline]
    pub fn with_content<S: Into<String>>(content: S) -> Self {
        Self {
            content: content.into(),
            finish_reason: None,
            usage: None,
        }
    }
}
