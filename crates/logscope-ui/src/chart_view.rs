//! Terminal chart surface: one channel drawn with ratatui's [`Chart`].
//!
//! Each run of valid samples becomes its own line dataset so gaps stay
//! visibly broken. The marker is a two-point vertical dataset spanning the
//! y range.

use logscope_core::formatting::{format_axis_value, format_compact};
use logscope_core::models::{AxisKind, Domain, Viewport};
use logscope_runtime::surface::{ChartHandle, HandleId, SeriesSpec, SurfaceFactory};
use ratatui::{
    layout::Rect,
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::themes::Theme;

/// Extra room above and below the data, as a share of the y range.
const Y_PADDING: f64 = 0.05;

/// Most x labels drawn under a chart.
const X_TICKS: usize = 3;

// ── TerminalChart ─────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct TerminalChart {
    id: HandleId,
    spec: SeriesSpec,
    segments: Vec<Vec<(f64, f64)>>,
    y_domain: Domain,
    viewport: Viewport,
    marker_x: Option<f64>,
}

impl TerminalChart {
    pub fn new(id: HandleId, spec: SeriesSpec) -> Self {
        let segments = spec.segments();
        let y_domain = match spec.y_bounds() {
            Some((lo, hi)) => {
                let pad = (hi - lo) * Y_PADDING;
                Domain::new(lo - pad, hi + pad)
            }
            None => Domain::new(0.0, 1.0),
        };
        let viewport = Viewport::full(&spec.axis().domain);
        Self {
            id,
            spec,
            segments,
            y_domain,
            viewport,
            marker_x: None,
        }
    }

    pub fn id(&self) -> HandleId {
        self.id
    }

    pub fn spec(&self) -> &SeriesSpec {
        &self.spec
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn marker_x(&self) -> Option<f64> {
        self.marker_x
    }

    pub fn segments(&self) -> &[Vec<(f64, f64)>] {
        &self.segments
    }

    pub fn title(&self) -> String {
        match self.spec.gap_count() {
            0 => format!(" {} ", self.spec.title),
            n => format!(" {} ({} gaps) ", self.spec.title, n),
        }
    }

    /// Y tick labels: bottom, middle, top.
    pub fn y_labels(&self) -> Vec<String> {
        let Domain { min, max } = self.y_domain;
        vec![
            format_compact(min),
            format_compact((min + max) / 2.0),
            format_compact(max),
        ]
    }

    /// X tick labels: viewport start, middle, end. Categorical axes label
    /// visible rows only, so a narrow viewport never repeats a label.
    pub fn x_labels(&self) -> Vec<String> {
        let axis = self.spec.axis();
        if axis.kind == AxisKind::Categorical {
            let ticks = axis.categorical_ticks(self.viewport.low(), self.viewport.high(), X_TICKS);
            match ticks.len() {
                0 => {}
                1 => return vec![String::new(), ticks[0].1.clone(), String::new()],
                _ => return ticks.into_iter().map(|(_, label)| label).collect(),
            }
        }
        let tz = &self.spec.log().timezone;
        [self.viewport.low(), self.viewport.center(), self.viewport.high()]
            .iter()
            .map(|x| format_axis_value(axis, *x, tz))
            .collect()
    }

    /// Screen rectangle of the plotting area inside `area`.
    ///
    /// Mirrors the chart widget's layout: one border cell on each side, the
    /// widest y label plus the axis line on the left, the x labels plus the
    /// axis line at the bottom.
    pub fn plot_area(&self, area: Rect) -> Rect {
        let inner = Rect {
            x: area.x.saturating_add(1),
            y: area.y.saturating_add(1),
            width: area.width.saturating_sub(2),
            height: area.height.saturating_sub(2),
        };
        let gutter = self
            .y_labels()
            .iter()
            .map(|l| l.width())
            .max()
            .unwrap_or(0) as u16
            + 1;
        Rect {
            x: inner.x.saturating_add(gutter),
            y: inner.y,
            width: inner.width.saturating_sub(gutter),
            height: inner.height.saturating_sub(2),
        }
    }

    /// Axis x under terminal column `column`, when it lies inside the plot.
    pub fn x_at_column(&self, area: Rect, column: u16) -> Option<f64> {
        let plot = self.plot_area(area);
        if plot.width == 0 || column < plot.x || column >= plot.x + plot.width {
            return None;
        }
        let offset = (column - plot.x) as f64 + 0.5;
        Some(self.viewport.low() + offset / plot.width as f64 * self.viewport.width())
    }

    /// Points of `segment` within the viewport plus one neighbour on each
    /// side, so lines run to the plot edge.
    fn visible(&self, segment: &[(f64, f64)]) -> Vec<(f64, f64)> {
        let inside = |i: usize| segment.get(i).is_some_and(|p| self.viewport.contains(p.0));
        segment
            .iter()
            .enumerate()
            .filter(|&(i, _)| inside(i) || (i > 0 && inside(i - 1)) || inside(i + 1))
            .map(|(_, p)| *p)
            .collect()
    }

    /// Draw into `area`; `position` picks the line colour.
    pub fn render(
        &self,
        frame: &mut Frame,
        area: Rect,
        theme: &Theme,
        position: usize,
        focused: bool,
    ) {
        let line_style = theme.series_style(position);
        let visible: Vec<Vec<(f64, f64)>> = self
            .segments
            .iter()
            .map(|s| self.visible(s))
            .filter(|s| !s.is_empty())
            .collect();
        let marker_points = self
            .marker_x
            .filter(|x| self.viewport.contains(*x))
            .map(|x| [(x, self.y_domain.min), (x, self.y_domain.max)]);

        let mut datasets: Vec<Dataset> = visible
            .iter()
            .map(|points| {
                let graph = if points.len() == 1 {
                    GraphType::Scatter
                } else {
                    GraphType::Line
                };
                Dataset::default()
                    .marker(symbols::Marker::Braille)
                    .graph_type(graph)
                    .style(line_style)
                    .data(points)
            })
            .collect();
        if let Some(points) = marker_points.as_ref() {
            datasets.push(
                Dataset::default()
                    .marker(symbols::Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(theme.marker)
                    .data(points),
            );
        }

        let x_labels: Vec<Span> = self.x_labels().into_iter().map(Span::raw).collect();
        let y_labels: Vec<Span> = self.y_labels().into_iter().map(Span::raw).collect();

        let chart = Chart::new(datasets)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme.border_style(focused))
                    .title(Span::styled(self.title(), line_style)),
            )
            .x_axis(
                Axis::default()
                    .style(theme.axis)
                    .bounds([self.viewport.low(), self.viewport.high()])
                    .labels(x_labels),
            )
            .y_axis(
                Axis::default()
                    .style(theme.axis)
                    .bounds([self.y_domain.min, self.y_domain.max])
                    .labels(y_labels),
            )
            .legend_position(None);

        frame.render_widget(chart, area);
    }
}

impl ChartHandle for TerminalChart {
    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn set_marker_shape(&mut self, x: Option<f64>) {
        self.marker_x = x;
    }
}

// ── Factory ───────────────────────────────────────────────────────────────────

/// Creates [`TerminalChart`]s for the coordinator.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalSurfaces;

impl SurfaceFactory for TerminalSurfaces {
    type Handle = TerminalChart;

    fn create(&mut self, id: HandleId, spec: SeriesSpec) -> TerminalChart {
        TerminalChart::new(id, spec)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
