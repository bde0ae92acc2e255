use ratatui::{
    layout::{Constraint, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Clear, Paragraph, Wrap},
    Frame,
};
use session::Role;

use crate::{app::App, input::PLACEHOLDER, markdown};

const TITLE: &str = "Code Review";
const HINT: &str = "Enter to send, Shift+Enter for new line";
const KEYS: &str = "Ctrl+Y copy · Esc quit";
const JUMP_TO_BOTTOM: &str = " ↓ Jump to bottom (End) ";
const MAX_INPUT_ROWS: usize = 8;
const TYPING_FRAMES: [&str; 3] = ["●∙∙", "∙●∙", "∙∙●"];

const MUTED: Style = Style::new().fg(Color::DarkGray);
const USER_LABEL: Style = Style::new().fg(Color::Magenta).add_modifier(Modifier::BOLD);
const ASSISTANT_LABEL: Style = Style::new().fg(Color::Green).add_modifier(Modifier::BOLD);
const BUBBLE: Style = Style::new().fg(Color::White).bg(Color::Rgb(48, 56, 86));

pub fn draw(frame: &mut Frame, app: &mut App) {
    let input_rows = app.input().line_count().clamp(1, MAX_INPUT_ROWS) as u16;
    let banner_rows = if app.session().last_error().is_some() { 3 } else { 0 };
    let [header, transcript, banner, input, hint] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(banner_rows),
        Constraint::Length(input_rows + 2),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_header(frame, app, header);
    draw_transcript(frame, app, transcript);
    draw_error_banner(frame, app, banner);
    draw_input(frame, app, input);
    draw_hint(frame, app, hint);
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let title = Line::styled(format!(" {TITLE}"), Style::new().add_modifier(Modifier::BOLD));
    frame.render_widget(title, area);

    if app.session().is_streaming() {
        let status = Line::styled("reviewing… ", Style::new().fg(Color::Yellow)).right_aligned();
        frame.render_widget(status, area);
    }
}

/// Transcript lines for every displayed message plus the typing indicator.
fn transcript_lines(app: &App) -> Vec<Line<'static>> {
    let conversation = app.session().conversation();
    let mut lines = vec![];
    let mut code_index = 0;

    for message in conversation.displayed() {
        if !lines.is_empty() {
            lines.push(Line::default());
        }
        match message.role {
            Role::User => {
                lines.push(Line::styled("You ", USER_LABEL).right_aligned());
                for line in message.content.split('\n') {
                    let text = format!(" {} ", line.replace('\t', "    "));
                    lines.push(Line::styled(text, BUBBLE).right_aligned());
                }
            }
            Role::Assistant => {
                lines.push(Line::styled("Reviewer", ASSISTANT_LABEL));
                if message.content.is_empty() {
                    continue;
                }
                match app.rendered(&message.id) {
                    Some(rendered) => {
                        lines.extend(markdown::message_lines(rendered, &mut code_index))
                    }
                    None => lines.extend(
                        message
                            .content
                            .split('\n')
                            .map(|line| Line::raw(line.to_owned())),
                    ),
                }
            }
            Role::System => {}
        }
    }

    if app.session().is_streaming() {
        let last_is_user = conversation.last().map(|x| x.role) == Some(Role::User);
        if last_is_user {
            lines.push(Line::default());
            lines.push(Line::styled("Reviewer", ASSISTANT_LABEL));
        }
        let dots = TYPING_FRAMES[(app.frame_count() / 4) as usize % TYPING_FRAMES.len()];
        lines.push(Line::styled(dots, Style::new().fg(Color::Green)));
    }

    if lines.is_empty() {
        lines.push(Line::styled(
            "Paste some code below and press Enter to get a review.",
            MUTED,
        ));
    }
    lines
}

fn draw_transcript(frame: &mut Frame, app: &mut App, area: Rect) {
    let paragraph = Paragraph::new(transcript_lines(app)).wrap(Wrap { trim: false });
    let content_height = u16::try_from(paragraph.line_count(area.width)).unwrap_or(u16::MAX);
    app.layout_transcript(content_height, area.height);

    let offset = app.transcript().offset();
    frame.render_widget(paragraph.scroll((offset, 0)), area);

    if app.scroll_controller().shows_jump_to_bottom() {
        let width = JUMP_TO_BOTTOM.chars().count() as u16;
        if area.width >= width && area.height > 0 {
            let button = Rect {
                x: area.right() - width,
                y: area.bottom() - 1,
                width,
                height: 1,
            };
            frame.render_widget(Clear, button);
            let style = Style::new().fg(Color::Black).bg(Color::Cyan);
            frame.render_widget(Line::styled(JUMP_TO_BOTTOM, style), button);
        }
    }
}

fn draw_error_banner(frame: &mut Frame, app: &App, area: Rect) {
    let Some(err) = app.session().last_error() else {
        return;
    };
    let red = Style::new().fg(Color::Red);
    let banner = Paragraph::new(err.to_string())
        .style(red)
        .wrap(Wrap { trim: true })
        .block(Block::bordered().title(" Error ").border_style(red));
    frame.render_widget(banner, area);
}

fn draw_input(frame: &mut Frame, app: &App, area: Rect) {
    let input = app.input();
    let can_send = input.can_send(app.session().is_streaming());
    let send_style = if can_send {
        Style::new().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        MUTED
    };
    let block = Block::bordered()
        .title_top(Line::raw(" Message "))
        .title_top(Line::styled(" ⏎ Send ", send_style).right_aligned());
    let inner = block.inner(area);

    let (row, col) = input.cursor_position();
    let scroll_y = row.saturating_sub(inner.height.saturating_sub(1));
    let scroll_x = col.saturating_sub(inner.width.saturating_sub(1));

    let text = if input.text().is_empty() {
        Text::from(Line::styled(
            PLACEHOLDER,
            MUTED.add_modifier(Modifier::ITALIC),
        ))
    } else {
        Text::raw(input.text().to_owned())
    };
    frame.render_widget(
        Paragraph::new(text)
            .block(block)
            .scroll((scroll_y, scroll_x)),
        area,
    );

    if inner.width > 0 && inner.height > 0 {
        frame.set_cursor_position(Position::new(
            inner.x + col - scroll_x,
            inner.y + row - scroll_y,
        ));
    }
}

fn draw_hint(frame: &mut Frame, app: &App, area: Rect) {
    frame.render_widget(Line::styled(format!(" {HINT}"), MUTED), area);

    let right = match app.toast() {
        Some(toast) => {
            let color = if toast.is_error { Color::Red } else { Color::Green };
            Line::from(Span::styled(format!("{} ", toast.text), Style::new().fg(color)))
        }
        None => Line::styled(format!("{KEYS} "), MUTED),
    };
    frame.render_widget(right.right_aligned(), area);
}

#[cfg(test)]
mod tests {
    use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
    use ratatui::{backend::TestBackend, Terminal};
    use session::ChatError;

    use super::*;
    use crate::app::test_support::*;

    fn screen(app: &mut App, width: u16, height: u16) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content
            .chunks(width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect()
    }

    fn contains(screen: &[String], needle: &str) -> bool {
        screen.iter().any(|row| row.contains(needle))
    }

    #[tokio::test]
    async fn empty_session_shows_placeholder_and_hint() {
        let (mut app, _rx) = app_with(
            ScriptedGateway::replying(&[]),
            RecordingClipboard::default(),
        );
        let screen = screen(&mut app, 80, 12);

        assert!(screen[0].starts_with(" Code Review"));
        assert!(contains(&screen, PLACEHOLDER));
        assert!(contains(&screen, HINT));
        assert!(contains(&screen, " Message "));
    }

    #[tokio::test]
    async fn conversation_renders_bubble_and_markdown() {
        let (mut app, mut rx) = app_with(
            ScriptedGateway::replying(&["Looks **fine**.\n\n```python\ndef f(): pass\n```"]),
            RecordingClipboard::default(),
        );
        converse(&mut app, &mut rx, "def f(): pass").await;
        let screen = screen(&mut app, 80, 24);

        let bubble = screen.iter().find(|row| row.contains(" def f(): pass ")).unwrap();
        assert!(bubble.trim_end().ends_with("def f(): pass"));
        assert!(contains(&screen, "Reviewer"));
        assert!(contains(&screen, "Looks fine."));
        assert!(contains(&screen, "╭─ python ─── ⧉ copy (Alt+1)"));
        assert!(contains(&screen, "│ def f(): pass"));
    }

    #[tokio::test]
    async fn streaming_shows_typing_indicator() {
        let (mut app, _rx) = app_with(
            ScriptedGateway::replying(&["never delivered"]),
            RecordingClipboard::default(),
        );
        app.on_terminal_event(Event::Paste("review".into()));
        app.on_terminal_event(Event::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)));
        let screen = screen(&mut app, 60, 12);

        assert!(contains(&screen, "●∙∙"));
        assert!(contains(&screen, "reviewing…"));
    }

    #[tokio::test]
    async fn error_banner_shows_last_error() {
        let (mut app, mut rx) = app_with(
            ScriptedGateway::failing(ChatError::Upstream("provider returned 503".into())),
            RecordingClipboard::default(),
        );
        converse(&mut app, &mut rx, "review").await;
        let screen = screen(&mut app, 80, 14);

        assert!(contains(&screen, " Error "));
        assert!(contains(&screen, "upstream error: provider returned 503"));
        assert_eq!(app.session().conversation().len(), 1);
    }

    #[tokio::test]
    async fn long_transcript_follows_bottom_and_offers_jump() {
        let reply = (1..=40).map(|i| format!("line {i}\n\n")).collect::<String>();
        let (mut app, mut rx) = app_with(
            ScriptedGateway::replying(&[reply.as_str()]),
            RecordingClipboard::default(),
        );
        converse(&mut app, &mut rx, "long").await;

        let mut last = screen(&mut app, 40, 16);
        for _ in 0..20 {
            if !app.transcript().is_animating() {
                break;
            }
            last = screen(&mut app, 40, 16);
        }
        assert!(contains(&last, "line 40"));
        assert!(!contains(&last, "Jump to bottom"));

        for _ in 0..5 {
            app.on_terminal_event(Event::Key(KeyEvent::new(KeyCode::PageUp, KeyModifiers::NONE)));
        }
        let scrolled = screen(&mut app, 40, 16);
        assert!(!contains(&scrolled, "line 40"));
        assert!(contains(&scrolled, "Jump to bottom"));
    }
}
