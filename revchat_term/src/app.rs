use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Context;
use crossterm::event::{
    Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind,
};
use futures::StreamExt;
use ratatui::{backend::Backend, Terminal};
use session::{
    render::{CodeBlock, RenderedMessage},
    run_exchange, CompletionGateway, GatewayEvent, Renderer, Role, ScrollCommand,
    ScrollController, ScrollMetrics, Session, SessionEvent, SubmitOutcome,
};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    clipboard::ClipboardSink,
    input::{InputAction, InputBox},
    view,
};

const TICK: Duration = Duration::from_millis(50);
const TOAST_DURATION: Duration = Duration::from_secs(2);
/// Rows from the bottom that still count as following the conversation.
const BOTTOM_THRESHOLD_ROWS: u32 = 3;
const WHEEL_ROWS: i32 = 3;

#[derive(Debug, Clone)]
pub struct Toast {
    pub text: &'static str,
    pub is_error: bool,
    expires_at: Instant,
}

impl Toast {
    fn new(text: &'static str, is_error: bool) -> Self {
        Self {
            text,
            is_error,
            expires_at: Instant::now() + TOAST_DURATION,
        }
    }
}

/// Row offset of the transcript viewport plus the sizes from the last layout.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TranscriptScroll {
    offset: u16,
    content_height: u16,
    viewport_height: u16,
    animating: bool,
}

impl TranscriptScroll {
    pub fn offset(&self) -> u16 {
        self.offset
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    fn max_offset(&self) -> u16 {
        self.content_height.saturating_sub(self.viewport_height)
    }

    pub fn metrics(&self) -> ScrollMetrics {
        ScrollMetrics {
            offset: self.offset as u32,
            content_height: self.content_height as u32,
            viewport_height: self.viewport_height as u32,
        }
    }

    fn scroll_by(&mut self, delta: i32) {
        self.animating = false;
        let offset = (self.offset as i32 + delta).clamp(0, self.max_offset() as i32);
        self.offset = offset as u16;
    }

    fn start_animation(&mut self) {
        self.animating = true;
    }

    /// Applies fresh sizes and advances a running smooth scroll by half the
    /// remaining distance. Returns `true` on the frame the bottom is reached.
    fn layout(&mut self, content_height: u16, viewport_height: u16) -> bool {
        self.content_height = content_height;
        self.viewport_height = viewport_height;
        self.offset = self.offset.min(self.max_offset());

        if !self.animating {
            return false;
        }
        let remaining = self.max_offset() - self.offset;
        if remaining == 0 {
            self.animating = false;
            return true;
        }
        self.offset += remaining.div_ceil(2);
        false
    }
}

pub struct App {
    session: Session,
    session_events: broadcast::Receiver<SessionEvent>,
    gateway: Arc<dyn CompletionGateway>,
    exchange_tx: mpsc::UnboundedSender<GatewayEvent>,
    renderer: Renderer,
    rendered: HashMap<Uuid, (usize, RenderedMessage)>,
    scroll: ScrollController,
    transcript: TranscriptScroll,
    input: InputBox,
    clipboard: Box<dyn ClipboardSink>,
    toast: Option<Toast>,
    frame_count: u64,
    quit: bool,
}

impl App {
    pub fn new(
        gateway: Arc<dyn CompletionGateway>,
        renderer: Renderer,
        clipboard: Box<dyn ClipboardSink>,
    ) -> (Self, mpsc::UnboundedReceiver<GatewayEvent>) {
        let session = Session::new();
        let session_events = session.subscribe();
        let (exchange_tx, exchange_rx) = mpsc::unbounded_channel();

        let app = Self {
            session,
            session_events,
            gateway,
            exchange_tx,
            renderer,
            rendered: HashMap::new(),
            scroll: ScrollController::with_threshold(BOTTOM_THRESHOLD_ROWS),
            transcript: TranscriptScroll::default(),
            input: InputBox::default(),
            clipboard,
            toast: None,
            frame_count: 0,
            quit: false,
        };
        (app, exchange_rx)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn input(&self) -> &InputBox {
        &self.input
    }

    pub fn transcript(&self) -> &TranscriptScroll {
        &self.transcript
    }

    pub fn scroll_controller(&self) -> &ScrollController {
        &self.scroll
    }

    pub fn toast(&self) -> Option<&Toast> {
        self.toast.as_ref()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn rendered(&self, message_id: &Uuid) -> Option<&RenderedMessage> {
        self.rendered.get(message_id).map(|(_, rendered)| rendered)
    }

    /// Code blocks of all assistant messages in transcript order, numbered
    /// the same way the view labels them.
    pub fn code_blocks(&self) -> Vec<&CodeBlock> {
        self.session
            .conversation()
            .displayed()
            .filter(|x| x.role == Role::Assistant)
            .filter_map(|x| self.rendered(&x.id))
            .flat_map(RenderedMessage::code_blocks)
            .collect()
    }

    pub fn on_terminal_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => self.on_key(key),
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::ScrollUp => self.scroll_transcript(-WHEEL_ROWS),
                MouseEventKind::ScrollDown => self.scroll_transcript(WHEEL_ROWS),
                _ => {}
            },
            Event::Paste(text) => self.input.paste(&text),
            _ => {}
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        let page = self.transcript.viewport_height.max(2) as i32 - 1;

        match key.code {
            KeyCode::Char('c') if ctrl => self.quit = true,
            KeyCode::Esc => self.quit = true,
            KeyCode::Char('g') if ctrl => self.jump_to_bottom(),
            KeyCode::Char('y') if ctrl => self.copy_code_block(None),
            KeyCode::Char(c @ '1'..='9') if alt => {
                self.copy_code_block(c.to_digit(10).map(|x| x as usize))
            }
            KeyCode::PageUp => self.scroll_transcript(-page),
            KeyCode::PageDown => self.scroll_transcript(page),
            _ => match self.input.handle_key(key) {
                InputAction::Submit => self.submit(),
                InputAction::Edited => {}
                InputAction::Unhandled => match key.code {
                    KeyCode::Up => self.scroll_transcript(-1),
                    KeyCode::Down => self.scroll_transcript(1),
                    KeyCode::End => self.jump_to_bottom(),
                    _ => {}
                },
            },
        }
    }

    pub fn submit(&mut self) {
        if !self.input.can_send(self.session.is_streaming()) {
            return;
        }
        match self.session.submit(self.input.text()) {
            SubmitOutcome::Accepted(request) => {
                info!("Submitting message (history = {})", request.messages.len());
                self.input.clear();
                let gateway = self.gateway.clone();
                tokio::spawn(run_exchange(gateway, request, self.exchange_tx.clone()));
            }
            SubmitOutcome::Ignored(reason) => debug!("Submission ignored: {reason:?}"),
        }
        self.drain_session_events();
    }

    pub fn on_gateway_event(&mut self, event: GatewayEvent) {
        self.session.apply(event);
        self.drain_session_events();
    }

    fn drain_session_events(&mut self) {
        loop {
            match self.session_events.try_recv() {
                Ok(event) => self.on_session_event(event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!("Missed {skipped} session event(s), re-rendering transcript");
                    self.rendered.clear();
                    let ids: Vec<Uuid> = self
                        .session
                        .conversation()
                        .messages()
                        .iter()
                        .map(|x| x.id)
                        .collect();
                    for id in ids {
                        self.refresh_rendered(id);
                    }
                    self.transcript.start_animation();
                }
                Err(_) => break,
            }
        }
    }

    fn on_session_event(&mut self, event: SessionEvent) {
        match &event {
            SessionEvent::ResponseStarted { message_id }
            | SessionEvent::FragmentApplied { message_id, .. } => {
                self.refresh_rendered(*message_id)
            }
            SessionEvent::Failed(err) => debug!("Showing error banner: {err}"),
            _ => {}
        }

        if let Some(command) = self.scroll.observe(&event) {
            match command {
                ScrollCommand::SmoothToBottom => self.transcript.start_animation(),
            }
        }
    }

    /// Re-renders an assistant message whose content changed since it was
    /// last rendered.
    fn refresh_rendered(&mut self, message_id: Uuid) {
        let Some(message) = self
            .session
            .conversation()
            .messages()
            .iter()
            .find(|x| x.id == message_id && x.role == Role::Assistant)
        else {
            return;
        };
        let len = message.content.len();
        if matches!(self.rendered.get(&message_id), Some((rendered_len, _)) if *rendered_len == len)
        {
            return;
        }
        let rendered = self.renderer.render(&message.content);
        self.rendered.insert(message_id, (len, rendered));
    }

    pub fn on_tick(&mut self) {
        self.frame_count = self.frame_count.wrapping_add(1);
        if matches!(&self.toast, Some(toast) if toast.expires_at <= Instant::now()) {
            self.toast = None;
        }
    }

    /// Called by the view once per frame with the laid out transcript size.
    pub fn layout_transcript(&mut self, content_height: u16, viewport_height: u16) {
        if viewport_height != self.transcript.viewport_height && !self.scroll.is_scrolled_away() {
            self.transcript.start_animation();
        }
        if self.transcript.layout(content_height, viewport_height) {
            self.scroll.on_scroll(self.transcript.metrics());
        }
    }

    fn scroll_transcript(&mut self, delta: i32) {
        self.transcript.scroll_by(delta);
        self.scroll.on_scroll(self.transcript.metrics());
    }

    fn jump_to_bottom(&mut self) {
        match self.scroll.jump_to_bottom() {
            ScrollCommand::SmoothToBottom => self.transcript.start_animation(),
        }
    }

    /// Copies code block `index` (1-based), or the most recent one.
    fn copy_code_block(&mut self, index: Option<usize>) {
        let code = {
            let blocks = self.code_blocks();
            let block = match index {
                Some(index) => index.checked_sub(1).and_then(|i| blocks.get(i)),
                None => blocks.last(),
            };
            match block {
                Some(block) => block.copy_text().to_owned(),
                None => return,
            }
        };

        self.toast = Some(match self.clipboard.copy(&code) {
            Ok(()) => {
                info!("Copied code block to clipboard ({} bytes)", code.len());
                Toast::new("Copied to clipboard", false)
            }
            Err(e) => {
                warn!("Failed to copy code block: {e:#}");
                Toast::new("Copy failed", true)
            }
        });
    }
}

pub async fn run<B: Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    mut exchange_rx: mpsc::UnboundedReceiver<GatewayEvent>,
) -> anyhow::Result<()> {
    let mut reader = EventStream::new();
    let mut ticker = tokio::time::interval(TICK);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    while !app.should_quit() {
        terminal
            .draw(|frame| view::draw(frame, &mut app))
            .context("failed to draw frame")?;

        tokio::select! {
            event = reader.next() => match event {
                Some(event) => {
                    app.on_terminal_event(event.context("failed to read terminal event")?)
                }
                None => break,
            },
            Some(event) = exchange_rx.recv() => app.on_gateway_event(event),
            _ = ticker.tick() => app.on_tick(),
        }
    }

    info!("Exiting");
    Ok(())
}
