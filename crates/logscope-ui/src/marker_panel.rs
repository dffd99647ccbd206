//! Marker readout panel.
//!
//! Holds the text produced by
//! [`render_marker_text`](logscope_core::formatting::render_marker_text) and
//! draws it in a bordered box. The panel takes no space while hidden.

use logscope_core::formatting::render_marker_text;
use logscope_core::models::MarkerReadout;
use logscope_runtime::surface::MarkerPanel;
use ratatui::{
    layout::Rect,
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::themes::Theme;

#[derive(Debug, Default, Clone)]
pub struct MarkerPanelState {
    readout: Option<MarkerReadout>,
    text: Option<String>,
}

impl MarkerPanelState {
    pub fn is_visible(&self) -> bool {
        self.text.is_some()
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn readout(&self) -> Option<&MarkerReadout> {
        self.readout.as_ref()
    }

    /// Rows needed to draw the panel, borders included; 0 when hidden.
    pub fn height(&self) -> u16 {
        self.text
            .as_ref()
            .map(|t| t.lines().count() as u16 + 2)
            .unwrap_or(0)
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let Some(text) = self.text.as_deref() else {
            return;
        };
        let mut lines = text.lines();
        let mut rendered: Vec<Line> = Vec::new();
        if let Some(first) = lines.next() {
            rendered.push(Line::from(Span::styled(first, theme.label)));
        }
        rendered.extend(lines.map(|l| Line::from(Span::styled(l, theme.value))));

        frame.render_widget(
            Paragraph::new(Text::from(rendered)).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme.marker)
                    .title(" Marker "),
            ),
            area,
        );
    }
}

impl MarkerPanel for MarkerPanelState {
    fn show(&mut self, readout: Option<&MarkerReadout>) {
        self.text = render_marker_text(readout);
        self.readout = readout.cloned();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
