//! One interface to chat models hosted by OpenAI, Groq, Gemini and Ollama.
//!
//! The crate includes a CLI tool that probes which provider and model
//! combinations are usable with the credentials in the environment. You can
//! also use it as a library:
//!
//! ```no_run
//! use polyllm::core::{ConfigSnapshot, LlmSettings, ModelMessage};
//!
//! # async fn run() -> Result<(), polyllm::core::Error> {
//! let provider = LlmSettings::from_config(&ConfigSnapshot::from_env())?
//!     .into_provider();
//! let output = provider
//!     .call([ModelMessage::user("Hello")], 512, None)
//!     .await?;
//! println!("{}", output.content);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod probe;

/// Re-exports of [`polyllm_core`] crate.
pub mod core {
    pub use polyllm_core::credential::{self, ConfigSnapshot, Credential};
    pub use polyllm_core::*;
}

/// Re-exports of the backend crates, for callers that configure a backend
/// directly.
pub mod backends {
    pub use polyllm_gemini_model as gemini;
    pub use polyllm_model as model;
    pub use polyllm_openai_model as openai;
}
