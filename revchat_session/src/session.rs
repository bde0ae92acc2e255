use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    error::ChatError,
    gateway::{CompletionGateway, GatewayEvent},
    message::{Conversation, Message, Role},
    wire::{ChatRequest, WireMessage},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Idle,
    Streaming,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Submitted { message_id: Uuid },
    ResponseStarted { message_id: Uuid },
    FragmentApplied { message_id: Uuid, len: usize },
    StatusChanged(SessionStatus),
    Failed(ChatError),
}

impl SessionEvent {
    /// Whether the transcript itself changed (as opposed to status only).
    pub fn mutates_conversation(&self) -> bool {
        matches!(
            self,
            SessionEvent::Submitted { .. }
                | SessionEvent::ResponseStarted { .. }
                | SessionEvent::FragmentApplied { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    EmptyInput,
    RequestInFlight,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The user turn was appended; the request must now go to the gateway.
    Accepted(ChatRequest),
    Ignored(IgnoreReason),
}

/// Chat transcript plus the status of the one request that may be in flight.
///
/// Every mutation is published as a [`SessionEvent`] to subscribers.
pub struct Session {
    conversation: Conversation,
    status: SessionStatus,
    last_error: Option<ChatError>,
    placeholder: Option<Uuid>,
    events: broadcast::Sender<SessionEvent>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        let (events, rx) = broadcast::channel(100);
        std::mem::drop(rx);

        Self {
            conversation: Conversation::new(),
            status: SessionStatus::Idle,
            last_error: None,
            placeholder: None,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_streaming(&self) -> bool {
        self.status == SessionStatus::Streaming
    }

    pub fn last_error(&self) -> Option<&ChatError> {
        self.last_error.as_ref()
    }

    pub fn submit(&mut self, text: &str) -> SubmitOutcome {
        let text = text.trim();
        if text.is_empty() {
            debug!("Ignoring blank submission");
            return SubmitOutcome::Ignored(IgnoreReason::EmptyInput);
        }
        if self.is_streaming() {
            debug!("Ignoring submission while a request is in flight");
            return SubmitOutcome::Ignored(IgnoreReason::RequestInFlight);
        }

        let message = Message::user(text);
        let message_id = message.id;
        self.conversation.push(message);
        self.last_error = None;
        self.emit(SessionEvent::Submitted { message_id });
        self.set_status(SessionStatus::Streaming);

        SubmitOutcome::Accepted(self.request())
    }

    /// Full history as sent to the gateway. The system prompt is added
    /// server-side and empty placeholders carry nothing worth sending.
    fn request(&self) -> ChatRequest {
        let messages = self
            .conversation
            .messages()
            .iter()
            .filter(|x| x.role != Role::System)
            .filter(|x| !(x.role == Role::Assistant && x.content.is_empty()))
            .map(Message::to_wire)
            .collect::<Vec<WireMessage>>();
        ChatRequest::new(messages)
    }

    pub fn apply(&mut self, event: GatewayEvent) {
        match event {
            GatewayEvent::Started => self.begin_response(),
            GatewayEvent::Fragment(text) => {
                self.on_fragment(&text);
            }
            GatewayEvent::Completed => self.on_complete(),
            GatewayEvent::Failed(err) => self.on_error(err),
        }
    }

    /// Appends the empty assistant message that fragments grow into.
    pub fn begin_response(&mut self) {
        if !self.is_streaming() || self.placeholder.is_some() {
            return;
        }
        let message = Message::assistant("");
        let message_id = message.id;
        self.conversation.push(message);
        self.placeholder = Some(message_id);
        self.emit(SessionEvent::ResponseStarted { message_id });
    }

    pub fn on_fragment(&mut self, text: &str) -> bool {
        if !self.is_streaming() {
            debug!("Dropping fragment received outside of a request");
            return false;
        }
        if self.placeholder.is_none() {
            self.begin_response();
        }

        let Some(message) = self.conversation.last_mut() else {
            return false;
        };
        message.content.push_str(text);
        let event = SessionEvent::FragmentApplied {
            message_id: message.id,
            len: message.content.len(),
        };
        self.emit(event);
        true
    }

    pub fn on_complete(&mut self) {
        if !self.is_streaming() {
            return;
        }
        let len = self.conversation.last().map(|x| x.content.len()).unwrap_or(0);
        info!("Completed response (length = {len})");
        self.placeholder = None;
        self.set_status(SessionStatus::Idle);
    }

    /// Records the failure for display and returns to idle. Whatever was
    /// streamed so far stays in the transcript.
    pub fn on_error(&mut self, err: ChatError) {
        if !self.is_streaming() {
            return;
        }
        warn!("Request failed: {err}");
        self.placeholder = None;
        self.last_error = Some(err.clone());
        self.set_status(SessionStatus::Error);
        self.emit(SessionEvent::Failed(err));
        self.set_status(SessionStatus::Idle);
    }

    fn set_status(&mut self, status: SessionStatus) {
        self.status = status;
        self.emit(SessionEvent::StatusChanged(status));
    }

    fn emit(&self, event: SessionEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }
}

/// Performs one gateway call, reporting progress as [`GatewayEvent`]s.
///
/// The session is never touched here: the receiving loop applies the events
/// so the transcript has a single writer.
pub async fn run_exchange(
    gateway: Arc<dyn CompletionGateway>,
    request: ChatRequest,
    tx: mpsc::UnboundedSender<GatewayEvent>,
) {
    let mut stream = match gateway.send(request).await {
        Ok(stream) => stream,
        Err(err) => {
            error!("Error starting completion: {err}");
            let _ = tx.send(GatewayEvent::Failed(err));
            return;
        }
    };

    if tx.send(GatewayEvent::Started).is_err() {
        return;
    }

    let mut fragment_count = 0_usize;
    while let Some(fragment) = stream.next().await {
        let event = match fragment {
            Ok(text) => {
                fragment_count += 1;
                GatewayEvent::Fragment(text)
            }
            Err(err) => {
                error!("Error streaming completion after {fragment_count} fragment(s): {err}");
                let _ = tx.send(GatewayEvent::Failed(err));
                return;
            }
        };
        if tx.send(event).is_err() {
            return;
        }
    }

    debug!("Completion stream closed after {fragment_count} fragment(s)");
    let _ = tx.send(GatewayEvent::Completed);
}
