//! One-line status bar: the latest message plus key hints.

use ratatui::text::{Line, Span};

use crate::themes::Theme;

pub const KEY_HINTS: &str =
    "Space toggle  Enter apply  Tab chart  ←/→ marker  h/l pan  +/- zoom  r reset  R reload  q quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub text: String,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Error,
            text: text.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == StatusLevel::Error
    }
}

/// The status line: message (if any) followed by the key hints.
pub fn status_line<'a>(message: Option<&'a StatusMessage>, theme: &Theme) -> Line<'a> {
    let mut spans = Vec::with_capacity(3);
    if let Some(message) = message {
        let style = match message.level {
            StatusLevel::Info => theme.info,
            StatusLevel::Error => theme.error,
        };
        spans.push(Span::styled(message.text.as_str(), style));
        spans.push(Span::styled("  │  ", theme.separator));
    }
    spans.push(Span::styled(KEY_HINTS, theme.dim));
    Line::from(spans)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
