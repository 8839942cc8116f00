use std::pin::Pin;
use std::sync::Arc;

use polyllm_model::{
    ModelProvider, ModelRequest, ModelResponse, ProviderIdentity,
};
use tracing::Instrument;

use crate::Error;

type SendRequestResult = Result<ModelResponse, Error>;
pub(crate) type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send>>;
type HandlerFn = Arc<dyn Fn(ModelRequest) -> BoxedSendRequestFuture + Send + Sync>;
type TemperatureFn = Arc<dyn Fn(f32) -> bool + Send + Sync>;

/// A wrapper around a model provider that provides a type-erased interface
/// for the other modules.
#[derive(Clone)]
pub(crate) struct ModelClient {
    handler_fn: HandlerFn,
    accepts_temperature_fn: TemperatureFn,
    output_token_ceiling: Option<u32>,
}

impl ModelClient {
    pub fn new<P: ModelProvider + 'static>(
        provider: P,
        identity: ProviderIdentity,
    ) -> Self {
        // We have to erase the type `P`, since `LlmProvider` doesn't have a
        // generic parameter and we don't want it either.
        let provider = Arc::new(provider);
        let output_token_ceiling = provider.output_token_ceiling();
        let accepts_temperature_fn: TemperatureFn = {
            let provider = Arc::clone(&provider);
            Arc::new(move |temperature| provider.accepts_temperature(temperature))
        };
        let handler_fn: HandlerFn = Arc::new(move |req| {
            let fut = provider.send_request(&req);
            let identity = identity.clone();
            let span = trace_span!(
                "model client req",
                provider = %identity.provider(),
                model = identity.model(),
            );
            Box::pin(
                async move {
                    trace!("got a request: {:?}", req);
                    let resp = fut.await.map_err(|err| {
                        debug!("request failed: {err}");
                        Error::from_provider_error(&err, &identity)
                    })?;
                    trace!("finished a request");
                    Ok(resp)
                }
                .instrument(span),
            )
        });
        Self {
            handler_fn,
            accepts_temperature_fn,
            output_token_ceiling,
        }
    }

    #[inline]
    pub fn output_token_ceiling(&self) -> Option<u32> {
        self.output_token_ceiling
    }

    #[inline]
    pub fn accepts_temperature(&self, temperature: f32) -> bool {
        (self.accepts_temperature_fn)(temperature)
    }

    /// Sends a request and returns the response.
    ///
    /// # Cancel safety
    ///
    /// The returned future owns everything it needs. Dropping it aborts the
    /// in-flight request and releases its connection.
    #[inline]
    pub fn send_request(&self, req: ModelRequest) -> BoxedSendRequestFuture {
        (self.handler_fn)(req)
    }
}
