use std::sync::Arc;

use axum::{routing::post, Router};
use tower_http::trace::TraceLayer;

pub mod api;
pub mod completion;

use completion::{ChatConfig, CompletionProvider};

pub mod env {
    pub const API_PORT: &str = "REVCHAT_API_PORT";
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    pub const MODEL: &str = "REVCHAT_MODEL";
    pub const PROVIDER_URL: &str = "REVCHAT_PROVIDER_URL";
    pub const TEMPERATURE: &str = "REVCHAT_TEMPERATURE";
    pub const MAX_TOKENS: &str = "REVCHAT_MAX_TOKENS";
}

pub struct AppState {
    /// `None` when the provider credential is missing; every request then
    /// fails with a configuration error.
    pub provider: Option<Arc<dyn CompletionProvider>>,
    pub config: ChatConfig,
    pub system_prompt: String,
}

pub fn app(app_state: Arc<AppState>) -> Router<()> {
    Router::new()
        .route("/api/chat", post(api::chat))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
