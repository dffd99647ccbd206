//! Boundary between the coordinator and whatever draws the charts.
//!
//! A drawing surface is anything that can show one series against the shared
//! x axis, move its visible range, and draw or hide a vertical marker line.
//! User interaction on a surface comes back as [`crate::events::ChartEvent`]s
//! that the shell forwards to the coordinator.

use std::fmt;
use std::sync::Arc;

use logscope_core::models::{MarkerReadout, Viewport, XAxisDescriptor};
use logscope_data::IngestedLog;

/// Identifies one chart within the current chart set.
///
/// Ids are assigned in display order and are only meaningful for the set
/// that issued them; a rebuild starts again from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(pub usize);

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chart#{}", self.0)
    }
}

// ── SeriesSpec ────────────────────────────────────────────────────────────────

/// Everything a surface needs to draw one channel.
#[derive(Debug, Clone)]
pub struct SeriesSpec {
    /// Raw header of the channel.
    pub channel: String,
    /// Canonical display name.
    pub title: String,
    /// Per-row y values; `None` marks a gap.
    pub y: Vec<Option<f64>>,
    log: Arc<IngestedLog>,
}

impl SeriesSpec {
    pub fn new(log: Arc<IngestedLog>, channel: &str, title: &str, y: Vec<Option<f64>>) -> Self {
        Self {
            channel: channel.to_string(),
            title: title.to_string(),
            y,
            log,
        }
    }

    /// The shared x axis. Every series of one log points at the same values.
    pub fn axis(&self) -> &XAxisDescriptor {
        &self.log.axis
    }

    pub fn x(&self) -> &[Option<f64>] {
        &self.log.axis.values
    }

    pub fn log(&self) -> &Arc<IngestedLog> {
        &self.log
    }

    /// Contiguous runs of drawable points.
    ///
    /// A row whose x or y value is missing ends the current run, so gaps are
    /// never bridged by a line segment.
    pub fn segments(&self) -> Vec<Vec<(f64, f64)>> {
        let mut segments = Vec::new();
        let mut current: Vec<(f64, f64)> = Vec::new();
        for (x, y) in self.x().iter().zip(&self.y) {
            match (x, y) {
                (Some(x), Some(y)) => current.push((*x, *y)),
                _ => {
                    if !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    }
                }
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }

    /// Number of rows with no y value.
    pub fn gap_count(&self) -> usize {
        self.y.iter().filter(|v| v.is_none()).count()
    }

    /// Finite y range, if any row has a value.
    pub fn y_bounds(&self) -> Option<(f64, f64)> {
        self.y.iter().flatten().fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }
}

// ── Traits ────────────────────────────────────────────────────────────────────

/// One live chart.
pub trait ChartHandle {
    /// Show exactly `viewport` on the x axis.
    fn set_viewport(&mut self, viewport: Viewport);

    /// Draw the vertical marker at `x`, or remove it with `None`.
    fn set_marker_shape(&mut self, x: Option<f64>);
}

/// Creates chart handles for a series.
pub trait SurfaceFactory {
    type Handle: ChartHandle;

    fn create(&mut self, id: HandleId, spec: SeriesSpec) -> Self::Handle;
}

/// Where the marker readout is shown.
pub trait MarkerPanel {
    /// Show `readout`, or hide the panel with `None`.
    fn show(&mut self, readout: Option<&MarkerReadout>);
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use logscope_data::{ingest_text, IngestOptions};

    fn log(text: &str) -> Arc<IngestedLog> {
        Arc::new(ingest_text(text, &IngestOptions::default()).unwrap())
    }

    #[test]
    fn test_segments_break_at_gaps() {
        let log = log("Sample,RPM\n0,1000\n1,\n2,3000\n3,3100\n");
        let y = log.records.numeric_column("RPM").unwrap();
        let spec = SeriesSpec::new(log.clone(), "RPM", "Engine Speed (rpm)", y);

        assert_eq!(spec.gap_count(), 1);
        assert_eq!(
            spec.segments(),
            vec![vec![(0.0, 1000.0)], vec![(2.0, 3000.0), (3.0, 3100.0)]]
        );
        assert_eq!(spec.y_bounds(), Some((1000.0, 3100.0)));
    }

    #[test]
    fn test_series_share_x_values() {
        let log = log("Time,RPM,AFR\n0,1000,14.7\n1,2000,12.1\n");
        let a = SeriesSpec::new(log.clone(), "RPM", "RPM", vec![Some(1000.0), Some(2000.0)]);
        let b = SeriesSpec::new(log.clone(), "AFR", "AFR", vec![Some(14.7), Some(12.1)]);
        assert!(std::ptr::eq(a.x(), b.x()));
        assert_eq!(a.x(), &[Some(0.0), Some(1.0)]);
    }

    #[test]
    fn test_all_null_series_has_no_bounds() {
        let log = log("Time,RPM\n0,\n1,\n");
        let spec = SeriesSpec::new(log, "RPM", "RPM", vec![None, None]);
        assert!(spec.segments().is_empty());
        assert_eq!(spec.y_bounds(), None);
    }

    #[test]
    fn test_handle_id_display() {
        assert_eq!(HandleId(3).to_string(), "chart#3");
    }
}
