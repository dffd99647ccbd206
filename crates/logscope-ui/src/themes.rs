use ratatui::style::{Color, Modifier, Style};

/// Terminal background type detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackgroundType {
    Dark,
    Light,
    Unknown,
}

/// Detect terminal background type from the `COLORFGBG` environment variable.
///
/// The variable has the format `"foreground;background"`. Background values
/// 0–6 are dark, 7–15 light. Absent or unparseable values count as dark.
pub fn detect_background() -> BackgroundType {
    std::env::var("COLORFGBG")
        .ok()
        .as_deref()
        .map(background_from_colorfgbg)
        .unwrap_or(BackgroundType::Dark)
}

fn background_from_colorfgbg(value: &str) -> BackgroundType {
    match value.split(';').next_back().and_then(|bg| bg.parse::<u8>().ok()) {
        Some(bg) if bg <= 6 => BackgroundType::Dark,
        Some(_) => BackgroundType::Light,
        None => BackgroundType::Unknown,
    }
}

/// Every style used by the viewer.
#[derive(Debug, Clone)]
pub struct Theme {
    // ── Header ───────────────────────────────────────────────────────────────
    pub header: Style,
    pub separator: Style,

    // ── Text ─────────────────────────────────────────────────────────────────
    pub text: Style,
    pub dim: Style,
    pub label: Style,
    pub value: Style,

    // ── Status ───────────────────────────────────────────────────────────────
    pub info: Style,
    pub error: Style,

    // ── Panes ────────────────────────────────────────────────────────────────
    pub border: Style,
    pub border_focused: Style,
    pub cursor: Style,
    pub checked: Style,

    // ── Charts ───────────────────────────────────────────────────────────────
    /// Vertical marker line.
    pub marker: Style,
    pub axis: Style,
    /// Line colours, cycled by chart position.
    pub series: Vec<Color>,
}

impl Theme {
    // ── Constructors ─────────────────────────────────────────────────────────

    /// Dark-background terminal theme (default).
    pub fn dark() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            separator: Style::default().fg(Color::DarkGray),

            text: Style::default().fg(Color::White),
            dim: Style::default().fg(Color::DarkGray),
            label: Style::default().fg(Color::Gray),
            value: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),

            info: Style::default().fg(Color::Cyan),
            error: Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),

            border: Style::default().fg(Color::DarkGray),
            border_focused: Style::default().fg(Color::Cyan),
            cursor: Style::default().add_modifier(Modifier::REVERSED),
            checked: Style::default().fg(Color::Green),

            marker: Style::default().fg(Color::Red),
            axis: Style::default().fg(Color::Gray),
            series: vec![
                Color::Cyan,
                Color::Yellow,
                Color::Green,
                Color::Magenta,
                Color::LightBlue,
                Color::LightGreen,
            ],
        }
    }

    /// Light-background terminal theme.
    pub fn light() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            separator: Style::default().fg(Color::Gray),

            text: Style::default().fg(Color::Black),
            dim: Style::default().fg(Color::Gray),
            label: Style::default().fg(Color::DarkGray),
            value: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),

            info: Style::default().fg(Color::Blue),
            error: Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),

            border: Style::default().fg(Color::Gray),
            border_focused: Style::default().fg(Color::Blue),
            cursor: Style::default().add_modifier(Modifier::REVERSED),
            checked: Style::default().fg(Color::Green),

            marker: Style::default().fg(Color::Red),
            axis: Style::default().fg(Color::DarkGray),
            series: vec![
                Color::Blue,
                Color::Magenta,
                Color::Green,
                Color::DarkGray,
                Color::Cyan,
                Color::Yellow,
            ],
        }
    }

    /// Basic 8-colour ANSI palette, no bold.
    pub fn classic() -> Self {
        Self {
            header: Style::default().fg(Color::Cyan),
            separator: Style::default().fg(Color::DarkGray),

            text: Style::default().fg(Color::White),
            dim: Style::default().fg(Color::DarkGray),
            label: Style::default().fg(Color::Gray),
            value: Style::default().fg(Color::White),

            info: Style::default().fg(Color::Cyan),
            error: Style::default().fg(Color::Red),

            border: Style::default().fg(Color::DarkGray),
            border_focused: Style::default().fg(Color::White),
            cursor: Style::default().add_modifier(Modifier::REVERSED),
            checked: Style::default().fg(Color::Green),

            marker: Style::default().fg(Color::Red),
            axis: Style::default().fg(Color::Gray),
            series: vec![Color::Cyan, Color::Yellow, Color::Green, Color::Magenta],
        }
    }

    /// Choose a theme automatically based on the detected terminal background.
    pub fn auto_detect() -> Self {
        match detect_background() {
            BackgroundType::Light => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Construct a theme by name. Falls back to `auto_detect` for unknown
    /// names.
    pub fn from_name(name: &str) -> Self {
        match name {
            "light" => Self::light(),
            "dark" => Self::dark(),
            "classic" => Self::classic(),
            _ => Self::auto_detect(),
        }
    }

    // ── Style helpers ────────────────────────────────────────────────────────

    /// Line style for the chart at `position`.
    pub fn series_style(&self, position: usize) -> Style {
        match self.series.len() {
            0 => self.text,
            n => Style::default().fg(self.series[position % n]),
        }
    }

    pub fn border_style(&self, focused: bool) -> Style {
        if focused {
            self.border_focused
        } else {
            self.border
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dark_theme_creation() {
        let t = Theme::dark();
        assert_eq!(t.header.fg, Some(Color::Cyan));
        assert_eq!(t.marker.fg, Some(Color::Red));
        assert_eq!(t.series.len(), 6);
    }

    #[test]
    fn test_light_theme_creation() {
        let t = Theme::light();
        assert_eq!(t.header.fg, Some(Color::Blue));
        assert_eq!(t.text.fg, Some(Color::Black));
        assert_eq!(t.marker.fg, Some(Color::Red));
    }

    #[test]
    fn test_classic_theme_has_no_bold() {
        let t = Theme::classic();
        assert!(!t.header.add_modifier.contains(Modifier::BOLD));
        assert!(!t.error.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Theme::from_name("dark").header.fg, Some(Color::Cyan));
        assert_eq!(Theme::from_name("light").header.fg, Some(Color::Blue));
        assert!(Theme::from_name("does-not-exist").header.fg.is_some());
    }

    #[test]
    fn test_series_style_cycles() {
        let t = Theme::classic();
        assert_eq!(t.series_style(0).fg, Some(Color::Cyan));
        assert_eq!(t.series_style(4).fg, Some(Color::Cyan));
        assert_eq!(t.series_style(5).fg, Some(Color::Yellow));
    }

    #[test]
    fn test_border_style() {
        let t = Theme::dark();
        assert_eq!(t.border_style(true).fg, Some(Color::Cyan));
        assert_eq!(t.border_style(false).fg, Some(Color::DarkGray));
    }

    #[test]
    fn test_colorfgbg_parsing() {
        assert_eq!(background_from_colorfgbg("15;0"), BackgroundType::Dark);
        assert_eq!(background_from_colorfgbg("0;15"), BackgroundType::Light);
        assert_eq!(background_from_colorfgbg("garbage"), BackgroundType::Unknown);
    }
}
