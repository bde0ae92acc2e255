pub mod client;
pub mod error;
pub mod gateway;
pub mod message;
pub mod render;
pub mod scroll;
pub mod session;
pub mod wire;

pub use client::HttpGateway;
pub use error::ChatError;
pub use gateway::{CompletionGateway, FragmentStream, GatewayEvent};
pub use message::{Conversation, Message, Role};
pub use render::{render_markdown, Renderer};
pub use scroll::{ScrollCommand, ScrollController, ScrollMetrics};
pub use session::{run_exchange, Session, SessionEvent, SessionStatus, SubmitOutcome};
pub use wire::{ChatRequest, ChatResponse, WireMessage};
