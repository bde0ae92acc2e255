use futures::{future::BoxFuture, FutureExt, Stream, StreamExt};
use reqwest::{header, StatusCode};
use tracing::{error, info, warn};

use crate::{
    error::ChatError,
    gateway::{CompletionGateway, FragmentStream},
    wire::{ChatRequest, ChatResponse, ErrorBody},
};

pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:3000/api/chat";

/// Error detail when the response body breaks off part-way, as happens when
/// the provider fails mid-stream. The transport error itself is only logged.
pub const ENDED_EARLY: &str = "the gateway ended the response early";

/// [`CompletionGateway`] talking to the `/api/chat` route over HTTP.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    url: String,
}

impl HttpGateway {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn post(&self, request: ChatRequest) -> Result<FragmentStream, ChatError> {
        info!(
            "Requesting completion from {} (messages = {})",
            self.url,
            request.messages.len()
        );
        let response = self.client.post(&self.url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = error_from_response(status, &body);
            error!("Gateway rejected request: {err}");
            return Err(err);
        }

        let is_json = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|x| x.to_str().ok())
            .map(|x| x.starts_with("application/json"))
            .unwrap_or(false);

        if is_json {
            let ChatResponse { message } = response.json().await?;
            return Ok(futures::stream::once(async move { Ok(message) }).boxed());
        }

        Ok(decode_fragments(response.bytes_stream()).boxed())
    }
}

impl CompletionGateway for HttpGateway {
    fn send(&self, request: ChatRequest) -> BoxFuture<'_, Result<FragmentStream, ChatError>> {
        self.post(request).boxed()
    }
}

pub(crate) fn error_from_response(status: StatusCode, body: &str) -> ChatError {
    if let Ok(body) = serde_json::from_str::<ErrorBody>(body) {
        return body.into();
    }
    let detail = if body.trim().is_empty() {
        status.to_string()
    } else {
        format!("{status}: {}", body.trim())
    };
    if status.is_client_error() {
        ChatError::Validation(detail)
    } else {
        ChatError::Upstream(detail)
    }
}

/// Turns a byte stream into text fragments without splitting multi-byte
/// characters across fragment boundaries.
pub fn decode_fragments<S, B, E>(stream: S) -> impl Stream<Item = Result<String, ChatError>>
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    futures::stream::unfold(
        (stream.boxed(), Utf8Chunker::default()),
        |(mut stream, mut chunker)| async move {
            loop {
                match stream.next().await {
                    Some(Ok(bytes)) => match chunker.push(bytes.as_ref()) {
                        Ok(text) if text.is_empty() => continue,
                        result => return Some((result, (stream, chunker))),
                    },
                    Some(Err(e)) => {
                        warn!("Response stream broke: {e}");
                        let err = ChatError::Upstream(ENDED_EARLY.into());
                        return Some((Err(err), (stream, chunker)));
                    }
                    None if chunker.has_pending() => {
                        chunker.clear();
                        let err = ChatError::Upstream("response ended mid-character".into());
                        return Some((Err(err), (stream, chunker)));
                    }
                    None => return None,
                }
            }
        },
    )
}

#[derive(Debug, Default)]
struct Utf8Chunker {
    pending: Vec<u8>,
}

impl Utf8Chunker {
    fn push(&mut self, bytes: &[u8]) -> Result<String, ChatError> {
        self.pending.extend_from_slice(bytes);
        match std::str::from_utf8(&self.pending) {
            Ok(text) => {
                let text = text.to_owned();
                self.pending.clear();
                Ok(text)
            }
            // incomplete trailing sequence, keep it for the next chunk
            Err(e) if e.error_len().is_none() => {
                let valid = e.valid_up_to();
                let text = String::from_utf8_lossy(&self.pending[..valid]).into_owned();
                self.pending.drain(..valid);
                Ok(text)
            }
            Err(e) => {
                self.pending.clear();
                Err(ChatError::Upstream(format!("response is not valid utf-8: {e}")))
            }
        }
    }

    fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    fn clear(&mut self) {
        self.pending.clear();
    }
}
