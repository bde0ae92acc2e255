use std::path::PathBuf;

use clap::Parser;
use session::client::DEFAULT_GATEWAY_URL;

use crate::env;

/// Most terminals run on a dark background.
pub const TERMINAL_THEME: &str = "base16-ocean.dark";

#[derive(Parser, Debug, Clone)]
#[command(name = "revchat", version, about = "Chat with a code reviewer from the terminal")]
pub struct TermConfig {
    /// Chat endpoint of the revchat gateway.
    #[arg(short = 'g', long, env = env::GATEWAY_URL, default_value = DEFAULT_GATEWAY_URL)]
    pub gateway_url: String,

    /// Write logs to this file; nothing is logged when unset.
    #[arg(short = 'l', long, env = env::LOG_FILE)]
    pub log_file: Option<PathBuf>,

    /// Syntax highlighting theme for fenced code blocks.
    #[arg(short = 't', long, default_value = TERMINAL_THEME)]
    pub theme: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_gateway() {
        let config = TermConfig::try_parse_from(["revchat", "--gateway-url", DEFAULT_GATEWAY_URL])
            .unwrap();

        assert_eq!(config.gateway_url, DEFAULT_GATEWAY_URL);
        assert_eq!(config.theme, TERMINAL_THEME);
    }

    #[test]
    fn default_theme_is_a_known_dark_theme() {
        assert!(session::render::theme_names().contains(&TERMINAL_THEME));
        assert!(session::Renderer::with_theme(TERMINAL_THEME).is_some());
    }

    #[test]
    fn accepts_short_flags() {
        let config = TermConfig::try_parse_from([
            "revchat",
            "-g",
            "http://review.internal:8080/api/chat",
            "-t",
            "InspiredGitHub",
            "-l",
            "/tmp/revchat.log",
        ])
        .unwrap();

        assert_eq!(config.gateway_url, "http://review.internal:8080/api/chat");
        assert_eq!(config.theme, "InspiredGitHub");
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/revchat.log")));
    }
}
