use std::fmt::{self, Debug, Formatter};
use std::time::Duration;

use polyllm_gemini_model::{GeminiConfigBuilder, GeminiProvider};
use polyllm_model::{
    ErrorKind, ModelFinishReason, ModelMessage, ModelProvider, ModelRequest,
    ProviderIdentity, ProviderKind, TokenUsage,
};
use polyllm_openai_model::{OpenAIConfigBuilder, OpenAIFlavor, OpenAIProvider};

use crate::Error;
use crate::credential::Credential;
use crate::model_client::ModelClient;

/// The prompt sent by [`LlmProvider::verify_connection`].
pub const VERIFY_PROMPT: &str = "Say 'ok'";

/// The completion budget of [`LlmProvider::verify_connection`].
///
/// Reasoning models (OpenAI `o`-series and `gpt-5`, Gemini 2.5) count their
/// hidden thinking tokens against this budget before producing any visible
/// text. A model that thinks longer than this leaves no content and the
/// check fails with [`EmptyResult`](ErrorKind::EmptyResult) even though
/// the credential, endpoint and model are usable.
pub const VERIFY_MAX_COMPLETION_TOKENS: u32 = 1_024;

/// The outcome of a successful [`LlmProvider::call`].
#[derive(Clone, Debug, PartialEq)]
pub struct CallOutput {
    /// The generated text, never empty.
    pub content: String,
    /// The completion budget actually sent to the backend.
    pub max_completion_tokens: u32,
    /// The completion budget the caller asked for.
    pub requested_max_completion_tokens: u32,
    /// Why the model stopped, if the backend said so.
    pub finish_reason: Option<ModelFinishReason>,
    /// Token usage, if the backend reported it.
    pub usage: Option<TokenUsage>,
}

impl CallOutput {
    /// Returns `true` if the requested budget exceeded the backend's ceiling
    /// and was lowered.
    #[inline]
    pub fn was_clamped(&self) -> bool {
        self.max_completion_tokens < self.requested_max_completion_tokens
    }
}

/// The outcome of [`LlmProvider::verify_connection`].
#[derive(Clone, Debug, PartialEq)]
pub enum ConnectionCheck {
    /// The provider answered a trivial request.
    Verified,
    /// The trivial request failed.
    Failed(Error),
}

impl ConnectionCheck {
    /// Returns `true` if the connection was verified.
    #[inline]
    pub fn is_verified(&self) -> bool {
        matches!(self, ConnectionCheck::Verified)
    }

    /// Returns the failure, if any.
    #[inline]
    pub fn error(&self) -> Option<&Error> {
        match self {
            ConnectionCheck::Verified => None,
            ConnectionCheck::Failed(err) => Some(err),
        }
    }

    /// Converts the check into a `Result`.
    #[inline]
    pub fn into_result(self) -> Result<(), Error> {
        match self {
            ConnectionCheck::Verified => Ok(()),
            ConnectionCheck::Failed(err) => Err(err),
        }
    }
}

/// A uniform entry point to one model of one provider.
///
/// The provider is cheap to clone and holds no mutable state, so a single
/// instance can serve any number of concurrent calls. A failed call leaves
/// the instance usable.
#[derive(Clone)]
pub struct LlmProvider {
    identity: ProviderIdentity,
    client: ModelClient,
}

impl LlmProvider {
    /// Creates a provider from a provider tag.
    ///
    /// An empty `base_url` selects the provider's public endpoint. The
    /// credential is not checked here; an unusable one surfaces as an
    /// [`Authentication`](ErrorKind::Authentication) error from the first
    /// call.
    ///
    /// # Errors
    ///
    /// Fails with [`UnsupportedProvider`](ErrorKind::UnsupportedProvider)
    /// if the tag is not a supported provider.
    pub fn new(
        provider: &str,
        api_key: impl Into<String>,
        base_url: &str,
        model: impl Into<String>,
    ) -> Result<Self, Error> {
        let provider: ProviderKind = provider.parse()?;
        Ok(LlmProviderBuilder::with_provider(provider)
            .with_api_key(api_key)
            .with_base_url(base_url)
            .with_model(model)
            .build())
    }

    /// Wraps an arbitrary backend implementation.
    pub fn with_model_provider<P: ModelProvider + 'static>(
        identity: ProviderIdentity,
        provider: P,
    ) -> Self {
        let client = ModelClient::new(provider, identity.clone());
        Self { identity, client }
    }

    /// Returns the provider and model this instance talks to.
    #[inline]
    pub fn identity(&self) -> &ProviderIdentity {
        &self.identity
    }

    /// Returns the largest completion budget that will be sent, if the
    /// backend has one.
    #[inline]
    pub fn output_token_ceiling(&self) -> Option<u32> {
        self.client.output_token_ceiling()
    }

    /// Sends `messages` to the model and returns the generated text.
    ///
    /// A `max_completion_tokens` above the backend's ceiling is lowered to
    /// the ceiling; the budget actually used is reported in the output. A
    /// `temperature` of `None` is left out of the request so the backend
    /// default applies.
    ///
    /// The returned future doesn't borrow `self`. Dropping it cancels the
    /// request.
    pub fn call(
        &self,
        messages: impl Into<Vec<ModelMessage>>,
        max_completion_tokens: u32,
        temperature: Option<f32>,
    ) -> impl Future<Output = Result<CallOutput, Error>> + Send + 'static {
        self.send(ModelRequest {
            messages: messages.into(),
            max_completion_tokens,
            temperature,
        })
    }

    /// Like [`call`](Self::call), but takes a prepared request.
    pub fn send(
        &self,
        req: ModelRequest,
    ) -> impl Future<Output = Result<CallOutput, Error>> + Send + 'static {
        let requested = req.max_completion_tokens;
        let fut = self
            .prepare(req)
            .map(|req| (req.max_completion_tokens, self.client.send_request(req)));

        async move {
            let (max_completion_tokens, fut) = fut?;
            let resp = fut.await?;
            Ok(CallOutput {
                content: resp.content,
                max_completion_tokens,
                requested_max_completion_tokens: requested,
                finish_reason: resp.finish_reason,
                usage: resp.usage,
            })
        }
    }

    /// Like [`send`](Self::send), but gives up as soon as `cancel`
    /// completes. A cancelled call fails with
    /// [`Transient`](ErrorKind::Transient) and the in-flight request is
    /// dropped.
    pub async fn call_until<C>(
        &self,
        req: ModelRequest,
        cancel: C,
    ) -> Result<CallOutput, Error>
    where
        C: Future<Output = ()>,
    {
        let call = self.send(req);
        tokio::select! {
            result = call => result,
            () = cancel => {
                debug!("call to {} cancelled", self.identity);
                Err(Error::new(ErrorKind::Transient, "call cancelled")
                    .with_identity(&self.identity))
            }
        }
    }

    /// Checks that the provider, model and credential are currently usable
    /// by making the smallest viable call.
    ///
    /// The check is verified exactly when that call succeeds; failures carry
    /// the same error the call would have returned.
    pub fn verify_connection(
        &self,
    ) -> impl Future<Output = ConnectionCheck> + Send + 'static {
        let call = self.call(
            [ModelMessage::user(VERIFY_PROMPT)],
            VERIFY_MAX_COMPLETION_TOKENS,
            None,
        );
        async move {
            match call.await {
                Ok(_) => ConnectionCheck::Verified,
                Err(err) => ConnectionCheck::Failed(err),
            }
        }
    }

    /// Validates the request and clamps its completion budget.
    fn prepare(&self, mut req: ModelRequest) -> Result<ModelRequest, Error> {
        let invalid = |message: &str| {
            Err(Error::new(ErrorKind::InvalidRequest, message)
                .with_identity(&self.identity))
        };
        if req.messages.is_empty() {
            return invalid("messages must not be empty");
        }
        if req.max_completion_tokens == 0 {
            return invalid("max_completion_tokens must be positive");
        }
        if let Some(temperature) = req.temperature {
            if !temperature.is_finite()
                || !self.client.accepts_temperature(temperature)
            {
                return invalid(&format!(
                    "temperature {temperature} is out of range"
                ));
            }
        }

        if let Some(ceiling) = self.client.output_token_ceiling() {
            if req.max_completion_tokens > ceiling {
                debug!(
                    "clamping max_completion_tokens {} to {ceiling} for {}",
                    req.max_completion_tokens, self.identity
                );
                req.max_completion_tokens = ceiling;
            }
        }
        Ok(req)
    }
}

impl Debug for LlmProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmProvider")
            .field("identity", &self.identity)
            .field("output_token_ceiling", &self.output_token_ceiling())
            .finish()
    }
}

/// Builder for [`LlmProvider`].
#[derive(Clone)]
pub struct LlmProviderBuilder {
    provider: ProviderKind,
    api_key: String,
    model: Option<String>,
    base_url: Option<String>,
    output_token_ceiling: Option<u32>,
    timeout: Option<Duration>,
}

impl LlmProviderBuilder {
    /// Creates a builder for the given provider.
    #[inline]
    pub fn with_provider(provider: ProviderKind) -> Self {
        Self {
            provider,
            api_key: String::new(),
            model: None,
            base_url: None,
            output_token_ceiling: None,
            timeout: None,
        }
    }

    /// Sets the API key.
    #[inline]
    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// Sets the API key from a resolved credential.
    #[inline]
    pub fn with_credential(self, credential: Credential) -> Self {
        self.with_api_key(credential.into_inner())
    }

    /// Sets the model. Empty selects the provider's default model.
    #[inline]
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Overrides the endpoint. Empty selects the provider's default.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Overrides the output-token ceiling known for the model.
    #[inline]
    pub fn with_output_token_ceiling(mut self, ceiling: u32) -> Self {
        self.output_token_ceiling = Some(ceiling);
        self
    }

    /// Sets the per-request timeout.
    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the provider. No I/O happens here.
    pub fn build(self) -> LlmProvider {
        match self.provider {
            ProviderKind::OpenAI => self.build_openai(OpenAIFlavor::OpenAI),
            ProviderKind::Groq => self.build_openai(OpenAIFlavor::Groq),
            ProviderKind::Ollama => self.build_openai(OpenAIFlavor::Ollama),
            ProviderKind::Gemini => self.build_gemini(),
        }
    }

    fn build_openai(self, flavor: OpenAIFlavor) -> LlmProvider {
        let mut builder =
            OpenAIConfigBuilder::with_api_key(self.api_key).with_flavor(flavor);
        if let Some(model) = self.model {
            builder = builder.with_model(model);
        }
        if let Some(base_url) = self.base_url {
            builder = builder.with_base_url(base_url);
        }
        if let Some(ceiling) = self.output_token_ceiling {
            builder = builder.with_output_token_ceiling(ceiling);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.with_timeout(timeout);
        }
        let provider = OpenAIProvider::new(builder.build());
        let identity = ProviderIdentity::new(
            self.provider,
            provider.config().model(),
        );
        LlmProvider::with_model_provider(identity, provider)
    }

    fn build_gemini(self) -> LlmProvider {
        let mut builder = GeminiConfigBuilder::with_api_key(self.api_key);
        if let Some(model) = self.model {
            builder = builder.with_model(model);
        }
        if let Some(base_url) = self.base_url {
            builder = builder.with_base_url(base_url);
        }
        if let Some(ceiling) = self.output_token_ceiling {
            builder = builder.with_output_token_ceiling(ceiling);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.with_timeout(timeout);
        }
        let provider = GeminiProvider::new(builder.build());
        let identity = ProviderIdentity::new(
            self.provider,
            provider.config().model(),
        );
        LlmProvider::with_model_provider(identity, provider)
    }
}

impl Debug for LlmProviderBuilder {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmProviderBuilder")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("output_token_ceiling", &self.output_token_ceiling)
            .field("timeout", &self.timeout)
            .finish()
    }
}
