//! A local fake model for testing purpose.

pub mod http;
mod preset;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use polyllm_model::{
    ErrorKind, ModelFinishReason, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse, Role,
};
use tokio::time::sleep;

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
    status: Option<u16>,
}

impl Error {
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(self, f)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    fn status(&self) -> Option<u16> {
        self.status
    }
}

#[derive(Default)]
struct SharedState {
    script: VecDeque<PresetResponse>,
    received: Vec<ModelRequest>,
}

/// A local fake model for testing purpose.
///
/// Each request consumes the next scripted response; once the script is
/// exhausted the fallback response answers every request. Clones share the
/// script and the log of received requests, so a test can keep a clone to
/// inspect what the code under test actually sent.
///
/// Like a real backend, a request whose completion budget exceeds the
/// configured ceiling is rejected with HTTP 400.
///
/// # Note
///
/// This type is not optimized for production use, every request is copied
/// into the log. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    state: Arc<Mutex<SharedState>>,
    fallback: PresetResponse,
    output_token_ceiling: Option<u32>,
    delay: Option<Duration>,
}

impl TestModelProvider {
    #[inline]
    pub fn add_response(&mut self, preset: PresetResponse) {
        self.lock().script.push_back(preset);
    }

    #[inline]
    pub fn set_fallback_response(&mut self, preset: PresetResponse) {
        self.fallback = preset;
    }

    #[inline]
    pub fn set_output_token_ceiling(&mut self, ceiling: u32) {
        self.output_token_ceiling = Some(ceiling);
    }

    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns the requests received so far, oldest first.
    pub fn received_requests(&self) -> Vec<ModelRequest> {
        self.lock().received.clone()
    }

    fn lock(&self) -> MutexGuard<'_, SharedState> {
        // A panicking test thread must not hide the log from the others.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn answer(&self, req: &ModelRequest) -> Result<ModelResponse, Error> {
        let preset = {
            let mut state = self.lock();
            state.received.push(req.clone());
            state
                .script
                .pop_front()
                .unwrap_or_else(|| self.fallback.clone())
        };

        let ceiling = self.output_token_ceiling.unwrap_or(u32::MAX);
        if req.max_completion_tokens > ceiling {
            return Err(Error {
                message: format!(
                    "max_completion_tokens {} exceeds {ceiling}",
                    req.max_completion_tokens
                ),
                kind: ErrorKind::Rejected,
                status: Some(400),
            });
        }

        let content = match preset {
            PresetResponse::Text(text) => text,
            PresetResponse::Echo => {
                let input = req
                    .messages
                    .iter()
                    .rev()
                    .find(|msg| msg.role == Role::User)
                    .map(|msg| msg.content.as_str())
                    .unwrap_or_default();
                format!("You said {input}")
            }
            PresetResponse::Empty => {
                return Err(Error {
                    message: "no content".to_owned(),
                    kind: ErrorKind::EmptyResult,
                    status: None,
                });
            }
            PresetResponse::Failure { kind, status } => {
                return Err(Error {
                    message: format!("scripted failure: {kind}"),
                    kind,
                    status,
                });
            }
        };
        Ok(ModelResponse {
            content,
            finish_reason: Some(ModelFinishReason::Stop),
            usage: None,
        })
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;

    #[inline]
    fn output_token_ceiling(&self) -> Option<u32> {
        self.output_token_ceiling
    }

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<ModelResponse, Self::Error>> + Send + 'static
    {
        let result = self.answer(req);
        let delay = self.delay;
        async move {
            if let Some(delay) = delay {
                sleep(delay).await;
            }
            result
        }
    }
}
