use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub const PLACEHOLDER: &str = "Paste your code here for review...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    Submit,
    Edited,
    Unhandled,
}

/// Multi-line message editor. `cursor` is a byte offset into `text` and
/// always sits on a char boundary.
#[derive(Debug, Default, Clone)]
pub struct InputBox {
    text: String,
    cursor: usize,
}

impl InputBox {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// The send control is only live for non-blank input with nothing in flight.
    pub fn can_send(&self, streaming: bool) -> bool {
        !self.is_blank() && !streaming
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> InputAction {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Enter
                if key
                    .modifiers
                    .intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) =>
            {
                self.insert('\n');
            }
            KeyCode::Enter => return InputAction::Submit,
            KeyCode::Char('j') if ctrl => self.insert('\n'),
            KeyCode::Char('u') if ctrl => self.clear(),
            KeyCode::Char(_) if ctrl => return InputAction::Unhandled,
            KeyCode::Char(c) => self.insert(c),
            KeyCode::Tab => self.insert_str("    "),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.cursor = self.prev_boundary(),
            KeyCode::Right => self.cursor = self.next_boundary(),
            KeyCode::Home => self.cursor = self.line_start(),
            KeyCode::End if !self.text.is_empty() => self.cursor = self.line_end(),
            KeyCode::Up if !self.text.is_empty() => self.move_vertical(-1),
            KeyCode::Down if !self.text.is_empty() => self.move_vertical(1),
            _ => return InputAction::Unhandled,
        }
        InputAction::Edited
    }

    /// Bracketed paste keeps newlines as text so pasted code never submits.
    pub fn paste(&mut self, text: &str) {
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        self.insert_str(&text);
    }

    pub fn insert(&mut self, c: char) {
        self.text.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn insert_str(&mut self, s: &str) {
        self.text.insert_str(self.cursor, s);
        self.cursor += s.len();
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let start = self.prev_boundary();
        self.text.replace_range(start..self.cursor, "");
        self.cursor = start;
    }

    fn delete(&mut self) {
        if self.cursor < self.text.len() {
            let end = self.next_boundary();
            self.text.replace_range(self.cursor..end, "");
        }
    }

    fn prev_boundary(&self) -> usize {
        self.text[..self.cursor]
            .char_indices()
            .next_back()
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    fn next_boundary(&self) -> usize {
        self.text[self.cursor..]
            .chars()
            .next()
            .map(|c| self.cursor + c.len_utf8())
            .unwrap_or(self.cursor)
    }

    fn line_start(&self) -> usize {
        self.text[..self.cursor].rfind('\n').map(|i| i + 1).unwrap_or(0)
    }

    fn line_end(&self) -> usize {
        self.text[self.cursor..]
            .find('\n')
            .map(|i| self.cursor + i)
            .unwrap_or(self.text.len())
    }

    fn move_vertical(&mut self, direction: i32) {
        let (row, col) = self.cursor_position();
        let target = row as i64 + direction as i64;
        if target < 0 {
            self.cursor = 0;
            return;
        }

        let mut offset = 0;
        for (i, line) in self.text.split('\n').enumerate() {
            if i as i64 == target {
                let col_bytes = line
                    .char_indices()
                    .nth(col as usize)
                    .map(|(i, _)| i)
                    .unwrap_or(line.len());
                self.cursor = offset + col_bytes;
                return;
            }
            offset += line.len() + 1;
        }
        self.cursor = self.text.len();
    }

    pub fn line_count(&self) -> usize {
        self.text.split('\n').count()
    }

    /// Row and column (in chars) of the cursor.
    pub fn cursor_position(&self) -> (u16, u16) {
        let before = &self.text[..self.cursor];
        let row = before.matches('\n').count();
        let col = before[self.line_start()..].chars().count();
        (
            u16::try_from(row).unwrap_or(u16::MAX),
            u16::try_from(col).unwrap_or(u16::MAX),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(input: &mut InputBox, text: &str) {
        for c in text.chars() {
            input.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn enter_submits_and_shift_enter_breaks_line() {
        let mut input = InputBox::default();
        type_str(&mut input, "def f():");

        let shift_enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT);
        assert_eq!(input.handle_key(shift_enter), InputAction::Edited);
        let alt_enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::ALT);
        assert_eq!(input.handle_key(alt_enter), InputAction::Edited);
        type_str(&mut input, "    pass");

        assert_eq!(input.text(), "def f():\n\n    pass");
        assert_eq!(input.handle_key(key(KeyCode::Enter)), InputAction::Submit);
        assert_eq!(input.text(), "def f():\n\n    pass");
    }

    #[test]
    fn send_control_disabled_for_blank_input_or_streaming() {
        let mut input = InputBox::default();
        assert!(!input.can_send(false));

        type_str(&mut input, "   ");
        assert!(!input.can_send(false));

        type_str(&mut input, "x");
        assert!(input.can_send(false));
        assert!(!input.can_send(true));
    }

    #[test]
    fn editing_respects_multibyte_chars() {
        let mut input = InputBox::default();
        type_str(&mut input, "héllo");
        input.handle_key(key(KeyCode::Left));
        input.handle_key(key(KeyCode::Left));
        input.handle_key(key(KeyCode::Left));
        input.handle_key(key(KeyCode::Backspace));

        assert_eq!(input.text(), "hllo");
        assert_eq!(input.cursor_position(), (0, 1));

        input.handle_key(key(KeyCode::Delete));
        assert_eq!(input.text(), "hlo");
    }

    #[test]
    fn paste_keeps_newlines_as_text() {
        let mut input = InputBox::default();
        input.paste("fn main() {\r\n    println!(\"hi\");\r\n}");

        assert_eq!(input.text(), "fn main() {\n    println!(\"hi\");\n}");
        assert_eq!(input.line_count(), 3);
        assert_eq!(input.cursor_position(), (2, 1));
    }

    #[test]
    fn vertical_movement_keeps_column() {
        let mut input = InputBox::default();
        input.paste("abcdef\nxy\nlonger line");
        input.handle_key(key(KeyCode::Up));
        assert_eq!(input.cursor_position(), (1, 2));

        input.handle_key(key(KeyCode::Up));
        assert_eq!(input.cursor_position(), (0, 2));

        input.handle_key(key(KeyCode::Up));
        assert_eq!(input.cursor_position(), (0, 0));
    }

    #[test]
    fn arrows_and_end_are_unhandled_when_empty() {
        let mut input = InputBox::default();
        assert_eq!(input.handle_key(key(KeyCode::Up)), InputAction::Unhandled);
        assert_eq!(input.handle_key(key(KeyCode::Down)), InputAction::Unhandled);
        assert_eq!(input.handle_key(key(KeyCode::End)), InputAction::Unhandled);
        let ctrl_y = KeyEvent::new(KeyCode::Char('y'), KeyModifiers::CONTROL);
        assert_eq!(input.handle_key(ctrl_y), InputAction::Unhandled);
    }
}
