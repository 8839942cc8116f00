use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::time::Duration;

use polyllm_model::{
    ErrorKind, ModelFinishReason, ModelMessage, ModelProvider,
    ModelProviderError, ModelRequest, ModelResponse, Role,
};
use tokio::time::sleep;

#[derive(Debug)]
struct FakeModelProviderError(ErrorKind);

impl Display for FakeModelProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Error for FakeModelProviderError {}

impl ModelProviderError for FakeModelProviderError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

struct FakeModelProvider;

impl ModelProvider for FakeModelProvider {
    type Error = FakeModelProviderError;

    fn output_token_ceiling(&self) -> Option<u32> {
        Some(100)
    }

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<ModelResponse, Self::Error>> + Send + 'static
    {
        let last_user_input = req
            .messages
            .iter()
            .rev()
            .find(|msg| msg.role == Role::User)
            .map(|msg| msg.content.clone());
        let over_budget =
            req.max_completion_tokens > self.output_token_ceiling().unwrap_or(0);

        async move {
            sleep(Duration::from_millis(1)).await;
            if over_budget {
                return Err(FakeModelProviderError(ErrorKind::Rejected));
            }
            let Some(input) = last_user_input else {
                return Err(FakeModelProviderError(ErrorKind::InvalidRequest));
            };
            Ok(ModelResponse {
                content: format!("You said {input}"),
                finish_reason: Some(ModelFinishReason::Stop),
                usage: None,
            })
        }
    }
}

mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completion() {
        let provider = FakeModelProvider;
        let req = ModelRequest::new(
            [
                ModelMessage::system("Be brief."),
                ModelMessage::user("Good morning"),
            ],
            50,
        );
        let resp = provider.send_request(&req).await.unwrap();
        assert_eq!(resp.content, "You said Good morning");
        assert_eq!(resp.finish_reason, Some(ModelFinishReason::Stop));
    }

    #[tokio::test]
    async fn test_error() {
        let provider = FakeModelProvider;
        let req = ModelRequest::new(vec![], 50);
        let err = provider.send_request(&req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert_eq!(err.status(), None);

        let req = ModelRequest::new([ModelMessage::user("Hi")], 1000);
        let err = provider.send_request(&req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Rejected);
    }

    #[tokio::test]
    async fn test_future_outlives_provider() {
        let req = ModelRequest::new([ModelMessage::user("Bye")], 10)
            .with_temperature(0.1);
        let fut = {
            let provider = FakeModelProvider;
            assert!(provider.accepts_temperature(0.1));
            assert!(!provider.accepts_temperature(2.5));
            provider.send_request(&req)
        };
        let resp = tokio::spawn(fut).await.unwrap().unwrap();
        assert_eq!(resp.content, "You said Bye");
    }
}
