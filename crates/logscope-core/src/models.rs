use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ── Records ───────────────────────────────────────────────────────────────────

/// One data line of the log, aligned 1:1 with the header list.
///
/// A `None` cell is either an empty field or a field missing from a short row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    cells: Vec<Option<String>>,
}

impl Row {
    pub fn new(cells: Vec<Option<String>>) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[Option<String>] {
        &self.cells
    }

    /// Raw cell text at `index`, `None` for null cells or out-of-range indices.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.cells.get(index).and_then(|c| c.as_deref())
    }
}

/// Ordered rows keyed by an ordered list of unique header names.
///
/// Every row holds exactly `headers.len()` cells.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RecordSet {
    headers: Vec<String>,
    rows: Vec<Row>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl RecordSet {
    /// Build a record set from already-normalised rows.
    pub fn new(headers: Vec<String>, rows: Vec<Row>) -> Self {
        debug_assert!(rows.iter().all(|r| r.cells.len() == headers.len()));
        let index = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), i))
            .collect();
        Self {
            headers,
            rows,
            index,
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of `header` in the header list.
    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.index.get(header).copied()
    }

    /// Raw text of `header` in row `row`.
    pub fn value(&self, row: usize, header: &str) -> Option<&str> {
        let col = self.column_index(header)?;
        self.rows.get(row)?.get(col)
    }

    /// Raw cells of one column, in row order.
    pub fn column(&self, header: &str) -> Option<Vec<Option<&str>>> {
        let col = self.column_index(header)?;
        Some(self.rows.iter().map(|r| r.get(col)).collect())
    }

    /// Numeric view of one column; unparseable or null cells become gaps.
    pub fn numeric_column(&self, header: &str) -> Option<Vec<Option<f64>>> {
        self.column(header)
            .map(|cells| cells.into_iter().map(|c| c.and_then(coerce_numeric)).collect())
    }
}

/// Parse a cell as a float, accepting `,` as the decimal separator.
///
/// Only the first comma is rewritten, so thousands-grouped values such as
/// `1,234,5` stay unparseable.
pub fn coerce_numeric(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalised = trimmed.replacen(',', ".", 1);
    normalised.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Counters describing what ingestion had to repair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Field delimiter that was inferred (`,` or `;`).
    pub delimiter: char,
    /// Non-blank lines in the input, header included.
    pub non_blank_lines: usize,
    /// Rows shorter than the header (missing trailing cells became null).
    pub short_rows: usize,
    /// Rows longer than the header (extra cells were dropped).
    pub long_rows: usize,
}

// ── Headers ───────────────────────────────────────────────────────────────────

/// Classification of one header produced by the column classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderDescriptor {
    /// Header exactly as it appeared in the file (after trimming).
    pub raw: String,
    /// Lowercased key with punctuation and whitespace removed.
    pub key: String,
    /// Canonical name from the alias table, else `raw`.
    pub display_name: String,
    /// Matches the time/timestamp/date/utc naming pattern.
    pub time_candidate: bool,
    /// Pre-checked in the channel selection list.
    pub default_channel: bool,
}

/// Entry of the selectable channel list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelOption {
    pub header: String,
    pub display_name: String,
    pub default_checked: bool,
}

// ── X axis ────────────────────────────────────────────────────────────────────

/// How the x column was interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisKind {
    /// Plain floats.
    Numeric,
    /// Date/time values stored as epoch milliseconds.
    Calendar,
    /// Row index; the raw strings are kept for display only.
    Categorical,
}

impl std::fmt::Display for AxisKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AxisKind::Numeric => "numeric",
            AxisKind::Calendar => "calendar",
            AxisKind::Categorical => "categorical",
        };
        f.write_str(name)
    }
}

/// Valid x range of the loaded file. Always has `min < max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub min: f64,
    pub max: f64,
}

impl Domain {
    /// Build a domain, widening a single-point range by ±0.5.
    pub fn new(min: f64, max: f64) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        if max - min > 0.0 {
            Self { min, max }
        } else {
            Self {
                min: min - 0.5,
                max: max + 0.5,
            }
        }
    }

    /// Domain spanning the finite entries of `values`, or `None` when there
    /// are none.
    pub fn from_values(values: &[Option<f64>]) -> Option<Self> {
        let mut bounds: Option<(f64, f64)> = None;
        for v in values.iter().flatten().filter(|v| v.is_finite()) {
            bounds = Some(match bounds {
                Some((lo, hi)) => (lo.min(*v), hi.max(*v)),
                None => (*v, *v),
            });
        }
        bounds.map(|(lo, hi)| Self::new(lo, hi))
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }
}

/// Inferred x axis, aligned 1:1 with the record set rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XAxisDescriptor {
    pub kind: AxisKind,
    /// Header of the column the axis was built from.
    pub column: String,
    /// Per-row x value; `None` where the raw cell did not parse.
    pub values: Vec<Option<f64>>,
    /// Per-row raw text of the x column.
    pub labels: Vec<Option<String>>,
    pub domain: Domain,
}

impl XAxisDescriptor {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    /// Index of the sample whose x value is closest to `x`.
    ///
    /// Ties resolve to the lower index. Rows without an x value are skipped.
    pub fn nearest_index(&self, x: f64) -> Option<usize> {
        if !x.is_finite() {
            return None;
        }
        let mut best: Option<(usize, f64)> = None;
        for (i, v) in self.values.iter().enumerate() {
            let Some(v) = v else { continue };
            let dist = (v - x).abs();
            if best.map_or(true, |(_, d)| dist < d) {
                best = Some((i, dist));
            }
        }
        best.map(|(i, _)| i)
    }

    /// Sparse `(x, label)` ticks for categorical axes: at most `max_ticks`
    /// evenly spaced row indices inside `[low, high]`, never repeating a row.
    pub fn categorical_ticks(&self, low: f64, high: f64, max_ticks: usize) -> Vec<(f64, String)> {
        if self.kind != AxisKind::Categorical
            || self.labels.is_empty()
            || max_ticks == 0
            || !(low < high)
        {
            return Vec::new();
        }
        let first = low.max(0.0).ceil();
        let last = high.min((self.labels.len() - 1) as f64).floor();
        if first > last {
            return Vec::new();
        }
        let count = ((last - first) as usize + 1).min(max_ticks);
        let step = if count > 1 {
            (last - first) / (count - 1) as f64
        } else {
            0.0
        };
        (0..count)
            .map(|k| {
                let index = (first + k as f64 * step).round() as usize;
                let label = self.labels[index]
                    .clone()
                    .unwrap_or_else(|| index.to_string());
                (index as f64, label)
            })
            .collect()
    }
}

// ── Viewport / marker ─────────────────────────────────────────────────────────

/// Visible x sub-range shared by every chart. Always `low < high` and inside
/// the domain it was clamped against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    low: f64,
    high: f64,
}

impl Viewport {
    /// The whole domain.
    pub fn full(domain: &Domain) -> Self {
        Self {
            low: domain.min,
            high: domain.max,
        }
    }

    /// Clamp a proposed `[low, high]` range into `domain`.
    ///
    /// A non-positive or non-finite width, or one at least as wide as the
    /// domain, yields the full domain. Otherwise the range is shifted back
    /// inside the domain with its width preserved. Clamping an already
    /// clamped range returns it unchanged.
    pub fn clamped(low: f64, high: f64, domain: &Domain) -> Self {
        let width = high - low;
        if !low.is_finite() || !high.is_finite() || width <= 0.0 || width >= domain.width() {
            return Self::full(domain);
        }
        if low < domain.min {
            return Self {
                low: domain.min,
                high: domain.min + width,
            };
        }
        if high > domain.max {
            return Self {
                low: domain.max - width,
                high: domain.max,
            };
        }
        Self { low, high }
    }

    /// Initial window: `width` units from the domain start, or the full domain.
    pub fn initial(domain: &Domain, width: Option<f64>) -> Self {
        match width {
            Some(w) => Self::clamped(domain.min, domain.min + w, domain),
            None => Self::full(domain),
        }
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn width(&self) -> f64 {
        self.high - self.low
    }

    pub fn center(&self) -> f64 {
        (self.low + self.high) / 2.0
    }

    pub fn contains(&self, x: f64) -> bool {
        x >= self.low && x <= self.high
    }

    /// Proposed range after shifting by `delta` x units (unclamped).
    pub fn panned(&self, delta: f64) -> (f64, f64) {
        (self.low + delta, self.high + delta)
    }

    /// Proposed range after zooming by `factor` (> 1 zooms in) while keeping
    /// `anchor` at the same relative position (unclamped).
    pub fn zoomed(&self, factor: f64, anchor: f64) -> (f64, f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return (self.low, self.high);
        }
        let ratio = if self.width() > 0.0 {
            ((anchor - self.low) / self.width()).clamp(0.0, 1.0)
        } else {
            0.5
        };
        let new_width = self.width() / factor;
        let low = anchor - new_width * ratio;
        (low, low + new_width)
    }
}

/// The synchronised marker position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerState {
    sample_index: Option<usize>,
}

impl MarkerState {
    pub fn none() -> Self {
        Self { sample_index: None }
    }

    pub fn at(sample_index: usize) -> Self {
        Self {
            sample_index: Some(sample_index),
        }
    }

    pub fn sample_index(&self) -> Option<usize> {
        self.sample_index
    }

    pub fn is_set(&self) -> bool {
        self.sample_index.is_some()
    }
}

// ── Marker readout ────────────────────────────────────────────────────────────

/// One channel's value at the marker row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadoutEntry {
    pub channel: String,
    pub display_name: String,
    /// Raw cell text; `None` for null cells.
    pub value: Option<String>,
}

/// Everything the marker panel shows for one sample row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerReadout {
    pub sample_index: usize,
    /// Header of the x column.
    pub axis_label: String,
    /// Formatted x value at the marker.
    pub x_text: String,
    pub entries: Vec<ReadoutEntry>,
}

impl MarkerReadout {
    /// Value for `channel` (raw header or display name).
    pub fn value_of(&self, channel: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.channel == channel || e.display_name == channel)
            .and_then(|e| e.value.as_deref())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn record_set() -> RecordSet {
        RecordSet::new(
            vec!["Time".to_string(), "RPM".to_string()],
            vec![
                Row::new(vec![Some("0".into()), Some("1000".into())]),
                Row::new(vec![Some("1".into()), None]),
                Row::new(vec![Some("2".into()), Some("n/a".into())]),
            ],
        )
    }

    fn axis(values: Vec<Option<f64>>) -> XAxisDescriptor {
        let domain = Domain::from_values(&values).unwrap();
        XAxisDescriptor {
            kind: AxisKind::Numeric,
            column: "Time".into(),
            labels: values.iter().map(|v| v.map(|x| x.to_string())).collect(),
            values,
            domain,
        }
    }

    // ── RecordSet ─────────────────────────────────────────────────────────────

    #[test]
    fn test_record_set_lookup_by_header() {
        let rs = record_set();
        assert_eq!(rs.len(), 3);
        assert_eq!(rs.value(0, "RPM"), Some("1000"));
        assert_eq!(rs.value(1, "RPM"), None);
        assert_eq!(rs.value(0, "Boost"), None);
        assert_eq!(rs.column_index("Time"), Some(0));
    }

    #[test]
    fn test_numeric_column_turns_bad_cells_into_gaps() {
        let rs = record_set();
        assert_eq!(
            rs.numeric_column("RPM").unwrap(),
            vec![Some(1000.0), None, None]
        );
    }

    #[test]
    fn test_coerce_numeric_comma_decimal() {
        assert_eq!(coerce_numeric("14,7"), Some(14.7));
        assert_eq!(coerce_numeric(" -3.5 "), Some(-3.5));
        assert_eq!(coerce_numeric(""), None);
        assert_eq!(coerce_numeric("abc"), None);
        assert_eq!(coerce_numeric("1,234,5"), None);
        assert_eq!(coerce_numeric("inf"), None);
    }

    // ── Domain ────────────────────────────────────────────────────────────────

    #[test]
    fn test_domain_from_values_skips_gaps() {
        let d = Domain::from_values(&[None, Some(3.0), Some(-1.0), None]).unwrap();
        assert_eq!(d, Domain { min: -1.0, max: 3.0 });
    }

    #[test]
    fn test_domain_degenerate_is_widened() {
        let d = Domain::new(5.0, 5.0);
        assert_eq!(d.min, 4.5);
        assert_eq!(d.max, 5.5);
        assert!(Domain::from_values(&[None]).is_none());
    }

    // ── Viewport ──────────────────────────────────────────────────────────────

    #[test]
    fn test_viewport_clamp_inside_is_unchanged() {
        let d = Domain::new(0.0, 100.0);
        let vp = Viewport::clamped(10.0, 20.0, &d);
        assert_eq!((vp.low(), vp.high()), (10.0, 20.0));
    }

    #[test]
    fn test_viewport_clamp_shifts_preserving_width() {
        let d = Domain::new(0.0, 100.0);
        let left = Viewport::clamped(-5.0, 15.0, &d);
        assert_eq!((left.low(), left.high()), (0.0, 20.0));
        let right = Viewport::clamped(90.0, 110.0, &d);
        assert_eq!((right.low(), right.high()), (80.0, 100.0));
    }

    #[test]
    fn test_viewport_clamp_bad_width_is_full_domain() {
        let d = Domain::new(0.0, 100.0);
        assert_eq!(Viewport::clamped(50.0, 50.0, &d), Viewport::full(&d));
        assert_eq!(Viewport::clamped(60.0, 40.0, &d), Viewport::full(&d));
        assert_eq!(Viewport::clamped(-10.0, 200.0, &d), Viewport::full(&d));
        assert_eq!(Viewport::clamped(f64::NAN, 1.0, &d), Viewport::full(&d));
    }

    #[test]
    fn test_viewport_clamp_is_idempotent() {
        let d = Domain::new(0.0, 100.0);
        for (lo, hi) in [(-30.0, 5.0), (95.0, 130.0), (40.0, 41.0), (0.0, 0.0)] {
            let once = Viewport::clamped(lo, hi, &d);
            let twice = Viewport::clamped(once.low(), once.high(), &d);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_viewport_zoom_keeps_anchor_ratio() {
        let vp = Viewport::full(&Domain::new(0.0, 100.0));
        let (lo, hi) = vp.zoomed(2.0, 25.0);
        assert!((hi - lo - 50.0).abs() < 1e-9);
        assert!((lo - 12.5).abs() < 1e-9);
        assert_eq!(vp.panned(5.0), (5.0, 105.0));
    }

    #[test]
    fn test_viewport_initial_window() {
        let d = Domain::new(0.0, 100.0);
        let vp = Viewport::initial(&d, Some(30.0));
        assert_eq!((vp.low(), vp.high()), (0.0, 30.0));
        assert_eq!(Viewport::initial(&d, None), Viewport::full(&d));
    }

    // ── XAxisDescriptor ───────────────────────────────────────────────────────

    #[test]
    fn test_nearest_index_by_distance() {
        let ax = axis(vec![Some(0.0), Some(1.0), None, Some(3.0)]);
        assert_eq!(ax.nearest_index(0.4), Some(0));
        assert_eq!(ax.nearest_index(2.2), Some(3));
        assert_eq!(ax.nearest_index(0.5), Some(0));
        assert_eq!(ax.nearest_index(f64::NAN), None);
    }

    #[test]
    fn test_categorical_ticks_are_sparse() {
        let labels: Vec<Option<String>> = (0..10).map(|i| Some(format!("p{i}"))).collect();
        let ax = XAxisDescriptor {
            kind: AxisKind::Categorical,
            column: "Phase".into(),
            values: (0..10).map(|i| Some(i as f64)).collect(),
            labels,
            domain: Domain::new(0.0, 9.0),
        };
        let ticks = ax.categorical_ticks(0.0, 9.0, 4);
        assert_eq!(ticks.len(), 4);
        assert_eq!(ticks[0], (0.0, "p0".to_string()));
        assert_eq!(ticks[1], (3.0, "p3".to_string()));
        assert_eq!(ticks[3], (9.0, "p9".to_string()));

        // Zoomed in past the tick budget: one tick per visible row, no repeats.
        let ticks = ax.categorical_ticks(2.2, 3.9, 3);
        assert_eq!(ticks, vec![(3.0, "p3".to_string())]);
        let ticks = ax.categorical_ticks(1.5, 4.5, 5);
        let xs: Vec<f64> = ticks.iter().map(|t| t.0).collect();
        assert_eq!(xs, vec![2.0, 3.0, 4.0]);

        assert!(ax.categorical_ticks(9.5, 12.0, 3).is_empty());
    }

    // ── MarkerState / readout ─────────────────────────────────────────────────

    #[test]
    fn test_marker_state() {
        assert!(!MarkerState::none().is_set());
        assert_eq!(MarkerState::at(4).sample_index(), Some(4));
    }

    #[test]
    fn test_readout_value_by_header_or_display_name() {
        let readout = MarkerReadout {
            sample_index: 1,
            axis_label: "Time".into(),
            x_text: "1".into(),
            entries: vec![ReadoutEntry {
                channel: "RPM".into(),
                display_name: "Engine Speed (rpm)".into(),
                value: Some("2000".into()),
            }],
        };
        assert_eq!(readout.value_of("RPM"), Some("2000"));
        assert_eq!(readout.value_of("Engine Speed (rpm)"), Some("2000"));
        assert_eq!(readout.value_of("AFR"), None);
    }
}
