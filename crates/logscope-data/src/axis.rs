//! X-axis discovery: which column drives the shared time axis and how its
//! values are interpreted.

use logscope_core::error::{LogScopeError, Result};
use logscope_core::models::{coerce_numeric, AxisKind, Domain, RecordSet, XAxisDescriptor};
use logscope_core::time_utils::CalendarParser;
use tracing::debug;

use crate::classifier;

/// Share of cells that must parse as floats for a numeric axis.
pub const NUMERIC_THRESHOLD: f64 = 0.85;

/// Share of cells that must parse as dates/times for a calendar axis.
pub const CALENDAR_THRESHOLD: f64 = 0.75;

/// Index of the x column.
///
/// An explicit `requested` header must exist. Otherwise the first header
/// matching the time pattern is used, falling back to the first column.
pub fn select_x_column(headers: &[String], requested: Option<&str>) -> Result<usize> {
    if let Some(name) = requested {
        return headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| LogScopeError::UnknownColumn(name.to_string()));
    }
    let index = headers
        .iter()
        .position(|h| classifier::is_time_candidate(h))
        .unwrap_or(0);
    debug!(column = %headers.get(index).map(String::as_str).unwrap_or(""), "x column selected");
    Ok(index)
}

/// Interpret `column` as numeric, calendar or categorical.
///
/// Ratios are taken over every row, null cells included. The numeric test
/// runs first, so integer-like timestamps stay numeric.
pub fn infer_axis(records: &RecordSet, column: &str, parser: &CalendarParser) -> XAxisDescriptor {
    let cells = records.column(column).unwrap_or_default();
    let labels: Vec<Option<String>> = cells.iter().map(|c| c.map(str::to_string)).collect();
    let total = cells.len().max(1) as f64;

    let numeric: Vec<Option<f64>> = cells.iter().map(|c| c.and_then(coerce_numeric)).collect();
    let numeric_ratio = numeric.iter().flatten().count() as f64 / total;

    let (kind, values) = if numeric_ratio >= NUMERIC_THRESHOLD {
        (AxisKind::Numeric, numeric)
    } else {
        let calendar: Vec<Option<f64>> = cells
            .iter()
            .map(|c| c.and_then(|raw| parser.parse_epoch_millis(raw)))
            .collect();
        let calendar_ratio = calendar.iter().flatten().count() as f64 / total;
        if calendar_ratio >= CALENDAR_THRESHOLD {
            (AxisKind::Calendar, calendar)
        } else {
            let index = (0..cells.len()).map(|i| Some(i as f64)).collect();
            (AxisKind::Categorical, index)
        }
    };

    let domain = match kind {
        AxisKind::Categorical => Domain::new(0.0, cells.len().saturating_sub(1) as f64),
        _ => Domain::from_values(&values)
            .unwrap_or_else(|| Domain::new(0.0, cells.len().saturating_sub(1) as f64)),
    };

    debug!(
        column,
        kind = %kind,
        numeric_ratio,
        min = domain.min,
        max = domain.max,
        "x axis inferred"
    );

    XAxisDescriptor {
        kind,
        column: column.to_string(),
        values,
        labels,
        domain,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
