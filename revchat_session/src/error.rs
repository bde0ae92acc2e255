use thiserror::Error;

/// Failures surfaced to the user. Client-side rejections (blank input, a
/// submit while a request is in flight) are not errors, see
/// [`crate::session::SubmitOutcome`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    /// Missing or unusable provider credential. Fatal for every request.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Request shape rejected before reaching the provider.
    #[error("invalid request: {0}")]
    Validation(String),
    /// The provider call failed or the stream broke part-way.
    #[error("upstream error: {0}")]
    Upstream(String),
}

impl ChatError {
    pub fn detail(&self) -> &str {
        match self {
            ChatError::Configuration(detail)
            | ChatError::Validation(detail)
            | ChatError::Upstream(detail) => detail,
        }
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        ChatError::Upstream(err.to_string())
    }
}
