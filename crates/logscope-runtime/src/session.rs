//! Per-load view state: the ingested log, the channel selection, the shared
//! viewport and the marker.
//!
//! A `Session` is created for every successful load and dropped when the
//! next one replaces it, so viewport and marker never leak across files.
//! Only the [`crate::sync::SyncCoordinator`] mutates viewport and marker.

use std::collections::HashSet;
use std::sync::Arc;

use logscope_core::error::{LogScopeError, Result};
use logscope_core::formatting::format_axis_value;
use logscope_core::models::{
    AxisKind, ChannelOption, Domain, MarkerReadout, MarkerState, ReadoutEntry, Viewport,
    XAxisDescriptor,
};
use logscope_core::time_utils::format_datetime;
use logscope_data::IngestedLog;
use tracing::{debug, warn};

use crate::surface::SeriesSpec;

#[derive(Debug, Clone)]
pub struct Session {
    log: Arc<IngestedLog>,
    channels: Vec<ChannelOption>,
    selection: Vec<String>,
    default_window: Option<f64>,
    viewport: Viewport,
    marker: MarkerState,
}

impl Session {
    /// Start a session on `log` with the default channel selection.
    ///
    /// `default_window` is the initial (and reset) viewport width; `None`
    /// shows the whole domain.
    pub fn new(log: IngestedLog, default_window: Option<f64>) -> Self {
        let channels = log.channels();
        let selection = log.default_selection();
        let viewport = Viewport::initial(&log.axis.domain, default_window);
        debug!(
            channels = channels.len(),
            selected = selection.len(),
            "session created"
        );
        Self {
            log: Arc::new(log),
            channels,
            selection,
            default_window,
            viewport,
            marker: MarkerState::none(),
        }
    }

    /// Replace the initial selection with `requested` headers.
    ///
    /// Unknown headers are rejected. An empty request keeps the default
    /// selection.
    pub fn with_selection(mut self, requested: &[String]) -> Result<Self> {
        if !requested.is_empty() {
            self.selection = self.resolve_selection(requested)?;
        }
        Ok(self)
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn log(&self) -> &Arc<IngestedLog> {
        &self.log
    }

    pub fn axis(&self) -> &XAxisDescriptor {
        &self.log.axis
    }

    pub fn domain(&self) -> Domain {
        self.log.axis.domain
    }

    pub fn channels(&self) -> &[ChannelOption] {
        &self.channels
    }

    pub fn selection(&self) -> &[String] {
        &self.selection
    }

    pub fn is_selected(&self, header: &str) -> bool {
        self.selection.iter().any(|s| s == header)
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn marker(&self) -> MarkerState {
        self.marker
    }

    pub fn sample_count(&self) -> usize {
        self.log.records.len()
    }

    /// Viewport used on load and on reset.
    pub fn default_viewport(&self) -> Viewport {
        Viewport::initial(&self.log.axis.domain, self.default_window)
    }

    // ── Selection ─────────────────────────────────────────────────────────

    /// Validate `requested` against the channel list.
    ///
    /// The result follows channel order with duplicates and the x column
    /// removed. An empty result is [`LogScopeError::NoChannelsSelected`].
    pub fn resolve_selection(&self, requested: &[String]) -> Result<Vec<String>> {
        let known: HashSet<&str> = self.log.records.headers().iter().map(String::as_str).collect();
        if let Some(unknown) = requested.iter().find(|h| !known.contains(h.as_str())) {
            return Err(LogScopeError::UnknownColumn(unknown.clone()));
        }
        let wanted: HashSet<&str> = requested.iter().map(String::as_str).collect();
        let resolved: Vec<String> = self
            .channels
            .iter()
            .filter(|c| wanted.contains(c.header.as_str()))
            .map(|c| c.header.clone())
            .collect();
        if resolved.is_empty() {
            return Err(LogScopeError::NoChannelsSelected);
        }
        Ok(resolved)
    }

    /// One series per selected channel, in selection order.
    ///
    /// Unparseable cells become gaps. A header that vanished from the record
    /// set is skipped with a warning.
    pub fn series_specs(&self) -> Vec<SeriesSpec> {
        self.selection
            .iter()
            .filter_map(|header| match self.log.records.numeric_column(header) {
                Some(y) => Some(SeriesSpec::new(
                    self.log.clone(),
                    header,
                    self.log.display_name(header),
                    y,
                )),
                None => {
                    warn!(channel = %header, "selected channel missing from log; skipped");
                    None
                }
            })
            .collect()
    }

    // ── Marker readout ────────────────────────────────────────────────────

    /// Readout of every selected channel at row `index`.
    ///
    /// Calendar positions carry the full date, unlike the clock-only ticks.
    pub fn readout(&self, index: usize) -> Option<MarkerReadout> {
        if index >= self.sample_count() {
            return None;
        }
        let axis = &self.log.axis;
        let x_text = match axis.value(index) {
            Some(x) if axis.kind == AxisKind::Calendar => format_datetime(x, &self.log.timezone),
            Some(x) => format_axis_value(axis, x, &self.log.timezone),
            None => axis
                .labels
                .get(index)
                .cloned()
                .flatten()
                .unwrap_or_else(|| "-".to_string()),
        };
        let entries = self
            .selection
            .iter()
            .map(|header| ReadoutEntry {
                channel: header.clone(),
                display_name: self.log.display_name(header).to_string(),
                value: self.log.records.value(index, header).map(str::to_string),
            })
            .collect();
        Some(MarkerReadout {
            sample_index: index,
            axis_label: self.log.display_name(&axis.column).to_string(),
            x_text,
            entries,
        })
    }

    /// Readout at the current marker, if one is set.
    pub fn current_readout(&self) -> Option<MarkerReadout> {
        self.marker.sample_index().and_then(|i| self.readout(i))
    }

    // ── Coordinator-only mutation ─────────────────────────────────────────

    pub(crate) fn set_viewport_state(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub(crate) fn set_marker_state(&mut self, marker: MarkerState) {
        self.marker = marker;
    }

    pub(crate) fn set_selection_state(&mut self, selection: Vec<String>) {
        self.selection = selection;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use logscope_data::{ingest_text, IngestOptions};

    const SCENARIO: &str = "Time,RPM,AFR\n0,1000,14.7\n1,2000,12.1\n2,3000,11.8\n";

    fn session(text: &str) -> Session {
        Session::new(ingest_text(text, &IngestOptions::default()).unwrap(), None)
    }

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_new_session_defaults() {
        let s = session(SCENARIO);
        assert_eq!(s.selection(), &names(&["RPM", "AFR"])[..]);
        assert_eq!(s.viewport(), Viewport::full(&Domain::new(0.0, 2.0)));
        assert!(!s.marker().is_set());
        assert_eq!(s.channels().len(), 2);
    }

    #[test]
    fn test_default_window_limits_initial_viewport() {
        let log = ingest_text(SCENARIO, &IngestOptions::default()).unwrap();
        let s = Session::new(log, Some(1.0));
        assert_eq!(s.viewport().low(), 0.0);
        assert_eq!(s.viewport().high(), 1.0);
        assert_eq!(s.default_viewport(), s.viewport());
    }

    #[test]
    fn test_resolve_selection_orders_and_dedupes() {
        let s = session(SCENARIO);
        let resolved = s.resolve_selection(&names(&["AFR", "RPM", "AFR", "Time"])).unwrap();
        assert_eq!(resolved, names(&["RPM", "AFR"]));
    }

    #[test]
    fn test_resolve_selection_errors() {
        let s = session(SCENARIO);
        assert!(matches!(
            s.resolve_selection(&[]),
            Err(LogScopeError::NoChannelsSelected)
        ));
        assert!(matches!(
            s.resolve_selection(&names(&["Time"])),
            Err(LogScopeError::NoChannelsSelected)
        ));
        assert!(matches!(
            s.resolve_selection(&names(&["Boost"])),
            Err(LogScopeError::UnknownColumn(_))
        ));
    }

    #[test]
    fn test_with_selection() {
        let s = session(SCENARIO).with_selection(&names(&["AFR"])).unwrap();
        assert_eq!(s.selection(), &names(&["AFR"])[..]);
        let unchanged = session(SCENARIO).with_selection(&[]).unwrap();
        assert_eq!(unchanged.selection().len(), 2);
    }

    #[test]
    fn test_series_specs_turn_bad_cells_into_gaps() {
        let s = session("Time,RPM\n0,1000\n1,n/a\n2,3000\n");
        let specs = s.series_specs();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].title, "Engine Speed (rpm)");
        assert_eq!(specs[0].y, vec![Some(1000.0), None, Some(3000.0)]);
    }

    #[test]
    fn test_readout_at_row() {
        let s = session(SCENARIO);
        let readout = s.readout(1).unwrap();
        assert_eq!(readout.sample_index, 1);
        assert_eq!(readout.axis_label, "Time");
        assert_eq!(readout.x_text, "1");
        assert_eq!(readout.value_of("RPM"), Some("2000"));
        assert_eq!(readout.value_of("Air-Fuel Ratio"), Some("12.1"));
        assert!(s.readout(3).is_none());
    }

    #[test]
    fn test_readout_calendar_position_has_date() {
        let s = session("Time,RPM\n2024-01-15 10:30:00,1000\n2024-01-15 10:30:01,2000\n");
        assert_eq!(s.axis().kind, AxisKind::Calendar);
        let readout = s.readout(1).unwrap();
        assert_eq!(readout.x_text, "2024-01-15 10:30:01.000");
    }

    #[test]
    fn test_readout_null_cell() {
        let s = session("Time,RPM\n0,\n1,5\n");
        let readout = s.readout(0).unwrap();
        assert_eq!(readout.entries[0].value, None);
    }
}
