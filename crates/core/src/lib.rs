//! A uniform way to call chat models across providers, including credential
//! resolution, output-token clamping and connection checks.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

pub mod credential;
mod error;
mod model_client;
mod provider;
mod settings;

pub use error::Error;
pub use polyllm_model::{
    ErrorKind, ModelFinishReason, ModelMessage, ModelRequest, ProviderIdentity,
    ProviderKind, Role, TokenUsage, UnsupportedProvider,
};
pub use provider::{
    CallOutput, ConnectionCheck, LlmProvider, LlmProviderBuilder,
    VERIFY_MAX_COMPLETION_TOKENS, VERIFY_PROMPT,
};
pub use settings::{BASE_URL_VAR, LlmSettings, MODEL_VAR, TIMEOUT_VAR};
