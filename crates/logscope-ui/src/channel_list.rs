//! Channel selection pane.
//!
//! Checkbox edits are local until applied; [`ChannelList::selection`] is what
//! the coordinator rebuilds the charts from.

use logscope_core::models::ChannelOption;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

use crate::themes::Theme;

#[derive(Debug, Clone, Default)]
pub struct ChannelList {
    options: Vec<ChannelOption>,
    checked: Vec<bool>,
    cursor: usize,
}

impl ChannelList {
    /// One row per option, checked where `selected` names the header.
    pub fn new(options: Vec<ChannelOption>, selected: &[String]) -> Self {
        let checked = options
            .iter()
            .map(|o| selected.iter().any(|s| *s == o.header))
            .collect();
        Self {
            options,
            checked,
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_checked(&self, index: usize) -> bool {
        self.checked.get(index).copied().unwrap_or(false)
    }

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.cursor + 1 < self.options.len() {
            self.cursor += 1;
        }
    }

    pub fn toggle(&mut self) {
        if let Some(flag) = self.checked.get_mut(self.cursor) {
            *flag = !*flag;
        }
    }

    pub fn select_all(&mut self) {
        self.checked.iter_mut().for_each(|c| *c = true);
    }

    pub fn select_none(&mut self) {
        self.checked.iter_mut().for_each(|c| *c = false);
    }

    /// Checked headers in list order.
    pub fn selection(&self) -> Vec<String> {
        self.options
            .iter()
            .zip(&self.checked)
            .filter(|(_, checked)| **checked)
            .map(|(o, _)| o.header.clone())
            .collect()
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme, focused: bool) {
        let items: Vec<ListItem> = self
            .options
            .iter()
            .zip(&self.checked)
            .map(|(option, checked)| {
                let (mark, style) = if *checked {
                    ("[x] ", theme.checked)
                } else {
                    ("[ ] ", theme.dim)
                };
                let mut spans = vec![
                    Span::styled(mark, style),
                    Span::styled(option.display_name.as_str(), theme.text),
                ];
                if option.display_name != option.header {
                    spans.push(Span::styled(format!(" ({})", option.header), theme.dim));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme.border_style(focused))
                    .title(" Channels "),
            )
            .highlight_style(theme.cursor);

        let mut state = ListState::default().with_selected(Some(self.cursor));
        frame.render_stateful_widget(list, area, &mut state);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn option(header: &str, display: &str) -> ChannelOption {
        ChannelOption {
            header: header.to_string(),
            display_name: display.to_string(),
            default_checked: false,
        }
    }

    fn list() -> ChannelList {
        let options = vec![
            option("RPM", "Engine Speed (rpm)"),
            option("AFR", "Air-Fuel Ratio"),
            option("Gear", "Gear"),
        ];
        ChannelList::new(options, &["RPM".to_string(), "AFR".to_string()])
    }

    #[test]
    fn test_initial_checks_follow_selection() {
        let l = list();
        assert_eq!(l.len(), 3);
        assert!(l.is_checked(0));
        assert!(l.is_checked(1));
        assert!(!l.is_checked(2));
        assert_eq!(l.selection(), vec!["RPM", "AFR"]);
    }

    #[test]
    fn test_cursor_stays_in_bounds() {
        let mut l = list();
        l.move_up();
        assert_eq!(l.cursor(), 0);
        for _ in 0..5 {
            l.move_down();
        }
        assert_eq!(l.cursor(), 2);
    }

    #[test]
    fn test_toggle_at_cursor() {
        let mut l = list();
        l.move_down();
        l.toggle();
        assert_eq!(l.selection(), vec!["RPM"]);
        l.move_down();
        l.toggle();
        assert_eq!(l.selection(), vec!["RPM", "Gear"]);
    }

    #[test]
    fn test_select_all_and_none() {
        let mut l = list();
        l.select_all();
        assert_eq!(l.selection().len(), 3);
        l.select_none();
        assert!(l.selection().is_empty());
    }

    #[test]
    fn test_empty_list_is_inert() {
        let mut l = ChannelList::default();
        l.toggle();
        l.move_down();
        assert!(l.is_empty());
        assert!(l.selection().is_empty());
    }
}
