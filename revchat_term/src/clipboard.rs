use std::io::Write;

use anyhow::Context;
use base64::Engine;
use tracing::{debug, warn};

pub trait ClipboardSink {
    fn copy(&mut self, text: &str) -> anyhow::Result<()>;
}

/// OSC 52 escape asking the terminal to set the system clipboard. Works over
/// ssh where no local clipboard is reachable.
pub fn osc52_sequence(text: &str) -> String {
    let engine = base64::engine::general_purpose::STANDARD;
    format!("\x1b]52;c;{}\x07", engine.encode(text))
}

pub struct SystemClipboard {
    native: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        let native = match arboard::Clipboard::new() {
            Ok(clipboard) => Some(clipboard),
            Err(e) => {
                warn!("Native clipboard unavailable, falling back to OSC 52: {e}");
                None
            }
        };
        Self { native }
    }

    fn copy_osc52(text: &str) -> anyhow::Result<()> {
        let mut stdout = std::io::stdout();
        stdout
            .write_all(osc52_sequence(text).as_bytes())
            .and_then(|_| stdout.flush())
            .context("failed to write OSC 52 sequence")
    }
}

impl ClipboardSink for SystemClipboard {
    fn copy(&mut self, text: &str) -> anyhow::Result<()> {
        if let Some(native) = self.native.as_mut() {
            match native.set_text(text.to_owned()) {
                Ok(()) => return Ok(()),
                Err(e) => debug!("Native clipboard rejected text: {e}"),
            }
        }
        Self::copy_osc52(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn osc52_sequence_wraps_base64_payload() {
        assert_eq!(osc52_sequence("def f(): pass"), "\x1b]52;c;ZGVmIGYoKTogcGFzcw==\x07");
        assert_eq!(osc52_sequence(""), "\x1b]52;c;\x07");
    }
}
