use futures::{future::BoxFuture, FutureExt, StreamExt};
use serde::Serialize;
use serde_json::Value;
use session::{gateway::FragmentStream, message::Role, ChatError, WireMessage};
use tokio::io::AsyncBufReadExt;
use tracing::{error, info};

use crate::env;

pub const SYSTEM_PROMPT: &str = "You are an experienced software engineer doing code review. \
Point out bugs, security problems and unclear code first, then suggest concrete improvements. \
Use markdown, and put any code in fenced blocks tagged with their language.";

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_PROVIDER_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 2000,
        }
    }
}

impl ChatConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let model = std::env::var(env::MODEL).ok().filter(|x| !x.is_empty());
        let temperature = std::env::var(env::TEMPERATURE).ok();
        let temperature = temperature.and_then(|x| x.parse().ok());
        let max_tokens = std::env::var(env::MAX_TOKENS).ok();
        let max_tokens = max_tokens.and_then(|x| x.parse().ok());

        Self {
            model: model.unwrap_or(defaults.model),
            temperature: temperature.unwrap_or(defaults.temperature),
            max_tokens: max_tokens.unwrap_or(defaults.max_tokens),
        }
    }
}

/// The model API behind the gateway.
pub trait CompletionProvider: Send + Sync {
    fn stream_completion<'a>(
        &'a self,
        messages: Vec<WireMessage>,
        config: &'a ChatConfig,
    ) -> BoxFuture<'a, Result<FragmentStream, ChatError>>;
}

pub fn with_system_prompt(system_prompt: &str, messages: Vec<WireMessage>) -> Vec<WireMessage> {
    let mut prompt = Vec::with_capacity(messages.len() + 1);
    prompt.push(WireMessage {
        role: Role::System,
        content: system_prompt.to_owned(),
    });
    prompt.extend(messages);
    prompt
}

#[derive(Serialize)]
struct ProviderRequest<'a> {
    model: &'a str,
    messages: &'a [WireMessage],
    stream: bool,
    temperature: f32,
    max_tokens: u32,
}

/// OpenAI-compatible `/chat/completions` client using server-sent events.
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(client: reqwest::Client, api_key: String, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    pub fn from_env(client: reqwest::Client) -> Result<Self, ChatError> {
        let api_key = std::env::var(env::OPENAI_API_KEY)
            .ok()
            .filter(|x| !x.trim().is_empty())
            .ok_or_else(|| {
                ChatError::Configuration(format!("{} is not set", env::OPENAI_API_KEY))
            })?;
        let base_url = std::env::var(env::PROVIDER_URL)
            .ok()
            .filter(|x| !x.is_empty())
            .unwrap_or_else(|| DEFAULT_PROVIDER_URL.to_string());

        Ok(Self::new(client, api_key, base_url))
    }

    async fn request(
        &self,
        messages: Vec<WireMessage>,
        config: &ChatConfig,
    ) -> Result<FragmentStream, ChatError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ProviderRequest {
            model: &config.model,
            messages: &messages,
            stream: true,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        };

        info!("Requesting completion from provider (model = {})", config.model);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::Upstream(format!("provider unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            let detail = provider_error_message(&detail).unwrap_or(detail);
            error!("Provider rejected completion request ({status}): {detail}");
            return Err(ChatError::Upstream(format!("provider returned {status}: {detail}")));
        }

        info!("Started streaming completion from provider");
        let stream = response.bytes_stream().map(|result| {
            result.map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))
        });
        let read = tokio_util::io::StreamReader::new(stream.boxed());
        let reader = tokio::io::BufReader::new(read);

        let fragments = futures::stream::unfold(reader.lines(), |mut lines| async move {
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => match parse_sse_line(&line) {
                        SseLine::Fragment(text) => return Some((Ok(text), lines)),
                        SseLine::Skip => continue,
                        SseLine::Done => return None,
                        SseLine::Error(err) => return Some((Err(err), lines)),
                    },
                    Ok(None) => return None,
                    Err(e) => {
                        let err = ChatError::Upstream(format!("provider stream broke: {e}"));
                        return Some((Err(err), lines));
                    }
                }
            }
        });

        Ok(fragments.boxed())
    }
}

impl CompletionProvider for OpenAiProvider {
    fn stream_completion<'a>(
        &'a self,
        messages: Vec<WireMessage>,
        config: &'a ChatConfig,
    ) -> BoxFuture<'a, Result<FragmentStream, ChatError>> {
        self.request(messages, config).boxed()
    }
}

#[derive(Debug, PartialEq)]
pub(crate) enum SseLine {
    Fragment(String),
    Skip,
    Done,
    Error(ChatError),
}

pub(crate) fn parse_sse_line(line: &str) -> SseLine {
    let line = line.trim();
    let Some(data) = line.strip_prefix("data:") else {
        // blank separators, comments and `event:`/`id:` fields
        return SseLine::Skip;
    };
    let data = data.trim_start();
    if data == "[DONE]" {
        return SseLine::Done;
    }

    let event: Value = match serde_json::from_str(data) {
        Ok(event) => event,
        Err(e) => {
            return SseLine::Error(ChatError::Upstream(format!(
                "malformed provider event: {e}"
            )))
        }
    };
    if let Some(message) = event.get("error").map(error_message) {
        return SseLine::Error(ChatError::Upstream(message));
    }

    match event
        .pointer("/choices/0/delta/content")
        .and_then(Value::as_str)
    {
        Some(content) if !content.is_empty() => SseLine::Fragment(content.to_owned()),
        _ => SseLine::Skip,
    }
}

fn error_message(error: &Value) -> String {
    error
        .get("message")
        .and_then(Value::as_str)
        .map(|x| x.to_owned())
        .unwrap_or_else(|| error.to_string())
}

fn provider_error_message(body: &str) -> Option<String> {
    let body: Value = serde_json::from_str(body).ok()?;
    body.get("error").map(error_message)
}
