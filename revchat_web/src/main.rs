use std::net::SocketAddr;
use std::sync::Arc;

use revchat_web::{
    app,
    completion::{ChatConfig, CompletionProvider, OpenAiProvider, SYSTEM_PROMPT},
    env, AppState,
};

mod logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::configure_logging()?;

    let app = app(configure_app_state());

    let addr = socket_addr_from_env(env::API_PORT, 3000);
    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}

fn socket_addr_from_env(port_env_key: &str, default: u16) -> SocketAddr {
    let port = std::env::var(port_env_key).ok();
    let port = port.and_then(|x| x.parse().ok()).unwrap_or(default);
    SocketAddr::from(([0, 0, 0, 0], port))
}

fn configure_app_state() -> Arc<AppState> {
    let config = ChatConfig::from_env();
    let provider: Option<Arc<dyn CompletionProvider>> =
        match OpenAiProvider::from_env(reqwest::Client::new()) {
            Ok(provider) => Some(Arc::new(provider)),
            Err(e) => {
                tracing::warn!("{e}; chat requests will be rejected until it is configured");
                None
            }
        };
    tracing::info!(
        "Using model {} (temperature = {}, max_tokens = {})",
        config.model,
        config.temperature,
        config.max_tokens
    );

    Arc::new(AppState {
        provider,
        config,
        system_prompt: SYSTEM_PROMPT.to_string(),
    })
}
