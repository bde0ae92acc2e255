use std::sync::Arc;

use axum::{
    body::{Bytes, StreamBody},
    extract::State,
    http::{header, HeaderName, StatusCode},
    response::{AppendHeaders, IntoResponse, Response},
    Json,
};
use futures::StreamExt;
use session::{wire::ErrorBody, ChatError, ChatRequest};
use tracing::{error, info, warn};

use crate::{completion::with_system_prompt, env, AppState};

fn no_cache_headers() -> AppendHeaders<[(HeaderName, &'static str); 2]> {
    AppendHeaders([
        (header::CACHE_CONTROL, "no-cache, no-store"),
        (header::EXPIRES, "-1"),
    ])
}

/// `POST /api/chat`: forwards the conversation, prefixed with the system
/// prompt, and streams the answer back as plain text chunks.
pub async fn chat(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Response, ApiError> {
    let provider = state.provider.clone().ok_or_else(|| {
        ChatError::Configuration(format!("{} is not set", env::OPENAI_API_KEY))
    })?;

    let ChatRequest { messages } = ChatRequest::from_json(&body)?;
    info!("Received chat request (messages = {})", messages.len());

    let messages = with_system_prompt(&state.system_prompt, messages);
    let fragments = provider
        .stream_completion(messages, &state.config)
        .await?
        .inspect(|fragment| {
            if let Err(e) = fragment {
                error!("Error streaming completion to client: {e}");
            }
        });

    let content_type = (header::CONTENT_TYPE, "text/plain; charset=utf-8");
    Ok((
        StatusCode::OK,
        AppendHeaders([content_type]),
        no_cache_headers(),
        StreamBody::new(fragments),
    )
        .into_response())
}

#[derive(Debug)]
pub struct ApiError(pub ChatError);

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ChatError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ChatError::Validation(_) => StatusCode::BAD_REQUEST,
            ChatError::Upstream(_) => StatusCode::BAD_GATEWAY,
        };
        match &self.0 {
            ChatError::Validation(_) => warn!("Rejected chat request: {}", self.0),
            _ => error!("Chat request failed: {}", self.0),
        }
        (status, no_cache_headers(), Json(ErrorBody::from(&self.0))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use axum::{body::Body, http::Request};
    use futures::{future::BoxFuture, FutureExt};
    use session::{gateway::FragmentStream, message::Role, wire::ErrorKind, WireMessage};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        app,
        completion::{ChatConfig, CompletionProvider, SYSTEM_PROMPT},
    };

    struct FakeProvider {
        fragments: Vec<Result<String, ChatError>>,
        received: Mutex<Vec<Vec<WireMessage>>>,
    }

    impl FakeProvider {
        fn new(fragments: Vec<Result<String, ChatError>>) -> Arc<Self> {
            Arc::new(Self {
                fragments,
                received: Mutex::new(vec![]),
            })
        }
    }

    impl CompletionProvider for FakeProvider {
        fn stream_completion<'a>(
            &'a self,
            messages: Vec<WireMessage>,
            _config: &'a ChatConfig,
        ) -> BoxFuture<'a, Result<FragmentStream, ChatError>> {
            self.received.lock().unwrap().push(messages);
            let fragments = self.fragments.clone();
            async move { Ok(futures::stream::iter(fragments).boxed()) }.boxed()
        }
    }

    struct FailingProvider;

    impl CompletionProvider for FailingProvider {
        fn stream_completion<'a>(
            &'a self,
            _messages: Vec<WireMessage>,
            _config: &'a ChatConfig,
        ) -> BoxFuture<'a, Result<FragmentStream, ChatError>> {
            async { Err(ChatError::Upstream("provider returned 503".into())) }.boxed()
        }
    }

    fn state(provider: Option<Arc<dyn CompletionProvider>>) -> Arc<AppState> {
        Arc::new(AppState {
            provider,
            config: ChatConfig::default(),
            system_prompt: SYSTEM_PROMPT.to_string(),
        })
    }

    fn chat_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    async fn error_body(response: Response) -> ErrorBody {
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    const REVIEW_BODY: &str = r#"{"messages":[{"role":"user","content":"def f(): pass"}]}"#;

    #[tokio::test]
    async fn chat_streams_fragments_as_plain_text() {
        let provider = FakeProvider::new(vec![Ok("Looks ".into()), Ok("fine.".into())]);
        let response = app(state(Some(provider.clone())))
            .oneshot(chat_request(REVIEW_BODY))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        assert_eq!(
            response.headers()[header::CACHE_CONTROL],
            "no-cache, no-store"
        );
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        assert_eq!(&bytes[..], b"Looks fine.");
    }

    #[tokio::test]
    async fn chat_prepends_system_prompt() {
        let provider = FakeProvider::new(vec![Ok("ok".into())]);
        let _ = app(state(Some(provider.clone())))
            .oneshot(chat_request(REVIEW_BODY))
            .await
            .unwrap();

        let received = provider.received.lock().unwrap();
        assert_eq!(received.len(), 1);
        let roles: Vec<_> = received[0].iter().map(|x| x.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User]);
        assert_eq!(received[0][0].content, SYSTEM_PROMPT);
    }

    #[tokio::test]
    async fn missing_credential_is_configuration_error() {
        let response = app(state(None))
            .oneshot(chat_request(REVIEW_BODY))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = error_body(response).await;
        assert_eq!(body.kind, ErrorKind::Configuration);
        assert!(body.error.contains(env::OPENAI_API_KEY));
    }

    #[tokio::test]
    async fn malformed_body_is_rejected_before_provider_call() {
        let provider = FakeProvider::new(vec![]);
        let bodies = [
            "{",
            r#"{"messages":[]}"#,
            r#"{"messages":[{"role":"system","content":"x"}]}"#,
        ];
        for body in bodies {
            let response = app(state(Some(provider.clone())))
                .oneshot(chat_request(body))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
            assert_eq!(error_body(response).await.kind, ErrorKind::Validation);
        }
        assert!(provider.received.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn provider_failure_maps_to_bad_gateway() {
        let response = app(state(Some(Arc::new(FailingProvider))))
            .oneshot(chat_request(REVIEW_BODY))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(error_body(response).await.kind, ErrorKind::Upstream);
    }

    #[tokio::test]
    async fn broken_provider_stream_aborts_body() {
        let provider = FakeProvider::new(vec![
            Ok("Half".into()),
            Err(ChatError::Upstream("connection reset".into())),
        ]);
        let response = app(state(Some(provider)))
            .oneshot(chat_request(REVIEW_BODY))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(hyper::body::to_bytes(response.into_body()).await.is_err());
    }

    #[tokio::test]
    async fn only_post_is_routed() {
        let response = app(state(None))
            .oneshot(
                Request::builder()
                    .uri("/api/chat")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
