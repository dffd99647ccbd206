use crate::themes::Theme;
use logscope_core::formatting::format_number;
use ratatui::text::{Line, Span};

/// Two-line screen header:
///
/// 1. Application title followed by a separator.
/// 2. `[ file | rows | axis | timezone ]` for the loaded log.
pub struct Header<'a> {
    /// File name, or a placeholder when nothing is loaded.
    pub file: &'a str,
    pub rows: usize,
    /// Axis description, e.g. `"numeric: Time"`.
    pub axis: &'a str,
    pub timezone: &'a str,
    pub theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(
        file: &'a str,
        rows: usize,
        axis: &'a str,
        timezone: &'a str,
        theme: &'a Theme,
    ) -> Self {
        Self {
            file,
            rows,
            axis,
            timezone,
            theme,
        }
    }

    pub fn to_lines(&self) -> Vec<Line<'a>> {
        vec![
            Line::from(vec![
                Span::styled(" LOGSCOPE ", self.theme.header),
                Span::styled("─".repeat(40), self.theme.separator),
            ]),
            Line::from(vec![
                Span::styled("[ ", self.theme.label),
                Span::styled(self.file, self.theme.value),
                Span::styled(" | ", self.theme.label),
                Span::styled(
                    format!("{} rows", format_number(self.rows as f64, 0)),
                    self.theme.value,
                ),
                Span::styled(" | ", self.theme.label),
                Span::styled(self.axis, self.theme.value),
                Span::styled(" | ", self.theme.label),
                Span::styled(self.timezone, self.theme.value),
                Span::styled(" ]", self.theme.label),
            ]),
        ]
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
