//! JSON shapes exchanged between the front-end and the gateway service.

use serde::{Deserialize, Serialize};

use crate::{error::ChatError, message::Role};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<WireMessage>,
}

impl ChatRequest {
    pub fn new(messages: Vec<WireMessage>) -> Self {
        Self { messages }
    }

    /// Parse a raw request body, rejecting anything the gateway would not
    /// forward upstream.
    pub fn from_json(body: &[u8]) -> Result<Self, ChatError> {
        let request: ChatRequest = serde_json::from_slice(body)
            .map_err(|e| ChatError::Validation(format!("invalid request body: {e}")))?;
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<(), ChatError> {
        if self.messages.is_empty() {
            return Err(ChatError::Validation("messages must not be empty".into()));
        }
        for (index, message) in self.messages.iter().enumerate() {
            if message.role == Role::System {
                return Err(ChatError::Validation(format!(
                    "messages[{index}]: system messages are set by the server"
                )));
            }
            if message.content.trim().is_empty() && message.role == Role::User {
                return Err(ChatError::Validation(format!(
                    "messages[{index}]: user content must not be blank"
                )));
            }
        }
        match self.messages.last() {
            Some(WireMessage {
                role: Role::User, ..
            }) => Ok(()),
            _ => Err(ChatError::Validation(
                "last message must come from the user".into(),
            )),
        }
    }
}

/// Buffered reply shape, accepted by the client alongside streamed bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Configuration,
    Validation,
    Upstream,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: ErrorKind,
}

impl From<&ChatError> for ErrorBody {
    fn from(err: &ChatError) -> Self {
        let kind = match err {
            ChatError::Configuration(_) => ErrorKind::Configuration,
            ChatError::Validation(_) => ErrorKind::Validation,
            ChatError::Upstream(_) => ErrorKind::Upstream,
        };
        ErrorBody {
            error: err.detail().to_owned(),
            kind,
        }
    }
}

impl From<ErrorBody> for ChatError {
    fn from(body: ErrorBody) -> Self {
        match body.kind {
            ErrorKind::Configuration => ChatError::Configuration(body.error),
            ErrorKind::Validation => ChatError::Validation(body.error),
            ErrorKind::Upstream => ChatError::Upstream(body.error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_json_accepts_user_turn() {
        let body = br#"{"messages":[{"role":"user","content":"def f(): pass"}]}"#;
        let request = ChatRequest::from_json(body).unwrap();
        assert_eq!(request.messages[0].content, "def f(): pass");
    }

    #[test]
    fn from_json_rejects_malformed_shapes() {
        let cases: [&[u8]; 5] = [
            b"not json",
            br#"{"msgs":[]}"#,
            br#"{"messages":[]}"#,
            br#"{"messages":[{"role":"robot","content":"x"}]}"#,
            br#"{"messages":[{"role":"system","content":"x"},{"role":"user","content":"y"}]}"#,
        ];
        for body in cases {
            let err = ChatRequest::from_json(body).unwrap_err();
            assert!(
                matches!(err, ChatError::Validation(_)),
                "expected validation error, got {err:?}"
            );
        }
    }

    #[test]
    fn validate_requires_trailing_user_turn() {
        let request = ChatRequest::new(vec![
            WireMessage {
                role: Role::User,
                content: "hi".into(),
            },
            WireMessage {
                role: Role::Assistant,
                content: "hello".into(),
            },
        ]);
        assert!(request.validate().is_err());
    }

    #[test]
    fn error_body_round_trips_error_kind() {
        let err = ChatError::Configuration("OPENAI_API_KEY is not set".into());
        let body = ErrorBody::from(&err);
        assert_eq!(body.kind, ErrorKind::Configuration);

        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains(r#""kind":"configuration""#));
        assert!(matches!(ChatError::from(body), ChatError::Configuration(_)));
    }
}
