use futures::{future::BoxFuture, stream::BoxStream};

use crate::{error::ChatError, wire::ChatRequest};

/// Lazy, finite, non-restartable sequence of assistant text fragments.
pub type FragmentStream = BoxStream<'static, Result<String, ChatError>>;

/// Anything that turns a message list into generated text.
///
/// The returned future resolves once the gateway has accepted the request;
/// fragments then arrive through the stream until it ends or yields an error.
pub trait CompletionGateway: Send + Sync {
    fn send(&self, request: ChatRequest) -> BoxFuture<'_, Result<FragmentStream, ChatError>>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum GatewayEvent {
    Started,
    Fragment(String),
    Completed,
    Failed(ChatError),
}
