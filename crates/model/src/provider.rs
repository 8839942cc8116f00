use std::error::Error;

use crate::error::ErrorKind;
use crate::request::ModelRequest;
use crate::response::ModelResponse;

/// The error type for a model provider.
pub trait ModelProviderError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;

    /// Returns the HTTP status the backend answered with, if any.
    fn status(&self) -> Option<u16> {
        None
    }
}

/// A type that represents a backend strategy for one provider and model.
///
/// Once the provider is created, it should behave like a stateless object.
/// It can still have internal state, but callers should not rely on it,
/// and the provider should be prepared for being dropped anytime.
pub trait ModelProvider: Send + Sync {
    /// The error type that may be returned by the provider.
    type Error: ModelProviderError;

    /// Returns the largest completion budget the configured model accepts,
    /// or `None` if the provider imposes no known ceiling.
    ///
    /// Callers are expected to clamp [`ModelRequest::max_completion_tokens`]
    /// to this value before sending a request.
    fn output_token_ceiling(&self) -> Option<u32>;

    /// Returns `true` if the temperature is within the range the backend
    /// accepts.
    fn accepts_temperature(&self, temperature: f32) -> bool {
        (0.0..=2.0).contains(&temperature)
    }

    /// Sends a request to the model.
    ///
    /// The returned future performs at most one outbound request and must
    /// not borrow `self`, so that it can be moved to another task.
    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<ModelResponse, Self::Error>> + Send + 'static;
}
