use chrono_tz::Tz;

use crate::models::{AxisKind, MarkerReadout, XAxisDescriptor};
use crate::time_utils;

/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use logscope_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let negative = value < 0.0;
    let abs_value = value.abs();

    // Nudge by a relative epsilon so exact midpoints round away from zero.
    let factor = 10_f64.powi(decimals as i32);
    let epsilon = f64::EPSILON * abs_value * factor;
    let rounded = ((abs_value * factor) + epsilon).round() / factor;

    let integer_part = rounded.trunc() as u64;
    let frac_part = rounded - rounded.trunc();

    let grouped = group_thousands(&integer_part.to_string());

    let result = if decimals == 0 {
        grouped
    } else {
        let frac_str = format!("{:.prec$}", frac_part, prec = decimals as usize);
        // `frac_str` is "0.xx" (or "1.00" after carry, already folded into the
        // integer part by the rounding above).
        format!("{}{}", grouped, &frac_str[1..])
    };

    if negative && rounded != 0.0 {
        format!("-{}", result)
    } else {
        result
    }
}

/// Compact number for tick labels and readouts: at most three decimals,
/// trailing zeros removed, no grouping.
///
/// # Examples
///
/// ```
/// use logscope_core::formatting::format_compact;
///
/// assert_eq!(format_compact(14.7), "14.7");
/// assert_eq!(format_compact(2000.0), "2000");
/// assert_eq!(format_compact(0.12345), "0.123");
/// ```
pub fn format_compact(value: f64) -> String {
    if !value.is_finite() {
        return "-".to_string();
    }
    let s = format!("{:.3}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// Human-readable text for an x position on `axis`.
///
/// Calendar values are shown as clock times in `tz`; categorical positions
/// show the raw label of the nearest row.
pub fn format_axis_value(axis: &XAxisDescriptor, x: f64, tz: &Tz) -> String {
    match axis.kind {
        AxisKind::Numeric => format_compact(x),
        AxisKind::Calendar => time_utils::format_clock(x, tz),
        AxisKind::Categorical => {
            if !x.is_finite() || x < -0.5 {
                return "-".to_string();
            }
            let index = x.round() as usize;
            axis.labels
                .get(index)
                .cloned()
                .flatten()
                .unwrap_or_else(|| index.to_string())
        }
    }
}

/// Marker panel text for one readout, or `None` when the panel is hidden.
///
/// The first line names the sample position and the x value; each following
/// line is `name  value`, names padded to a common width, `-` for null cells.
pub fn render_marker_text(readout: Option<&MarkerReadout>) -> Option<String> {
    let readout = readout?;
    let name_width = readout
        .entries
        .iter()
        .map(|e| e.display_name.chars().count())
        .max()
        .unwrap_or(0);

    let mut lines = Vec::with_capacity(readout.entries.len() + 1);
    lines.push(format!(
        "Position: {}  {}: {}",
        readout.sample_index, readout.axis_label, readout.x_text
    ));
    for entry in &readout.entries {
        let pad = name_width - entry.display_name.chars().count();
        lines.push(format!(
            "{}{}  {}",
            entry.display_name,
            " ".repeat(pad),
            entry.value.as_deref().unwrap_or("-")
        ));
    }
    Some(lines.join("\n"))
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Domain, ReadoutEntry};

    fn categorical_axis() -> XAxisDescriptor {
        XAxisDescriptor {
            kind: AxisKind::Categorical,
            column: "Phase".into(),
            values: vec![Some(0.0), Some(1.0)],
            labels: vec![Some("idle".into()), Some("pull".into())],
            domain: Domain::new(0.0, 1.0),
        }
    }

    // ── format_number ────────────────────────────────────────────────────────

    #[test]
    fn test_format_number_grouping() {
        assert_eq!(format_number(0.0, 2), "0.00");
        assert_eq!(format_number(123.456, 2), "123.46");
        assert_eq!(format_number(1_000.0, 0), "1,000");
        assert_eq!(format_number(-9_876.5, 1), "-9,876.5");
    }

    #[test]
    fn test_format_number_negative_zero_after_rounding() {
        assert_eq!(format_number(-0.001, 1), "0.0");
    }

    // ── format_compact ───────────────────────────────────────────────────────

    #[test]
    fn test_format_compact_trims() {
        assert_eq!(format_compact(12.1), "12.1");
        assert_eq!(format_compact(-0.0001), "0");
        assert_eq!(format_compact(3.0), "3");
        assert_eq!(format_compact(f64::NAN), "-");
    }

    // ── format_axis_value ────────────────────────────────────────────────────

    #[test]
    fn test_format_axis_value_categorical_uses_labels() {
        let axis = categorical_axis();
        assert_eq!(format_axis_value(&axis, 1.2, &Tz::UTC), "pull");
        assert_eq!(format_axis_value(&axis, 7.0, &Tz::UTC), "7");
    }

    #[test]
    fn test_format_axis_value_calendar_is_clock() {
        let mut axis = categorical_axis();
        axis.kind = AxisKind::Calendar;
        assert_eq!(format_axis_value(&axis, 3_600_000.0, &Tz::UTC), "01:00:00.000");
    }

    // ── render_marker_text ───────────────────────────────────────────────────

    #[test]
    fn test_render_marker_text_hidden_without_readout() {
        assert!(render_marker_text(None).is_none());
    }

    #[test]
    fn test_render_marker_text_lists_every_channel() {
        let readout = MarkerReadout {
            sample_index: 1,
            axis_label: "Time".into(),
            x_text: "1".into(),
            entries: vec![
                ReadoutEntry {
                    channel: "RPM".into(),
                    display_name: "Engine Speed (rpm)".into(),
                    value: Some("2000".into()),
                },
                ReadoutEntry {
                    channel: "AFR".into(),
                    display_name: "Air-Fuel Ratio".into(),
                    value: None,
                },
            ],
        };
        let text = render_marker_text(Some(&readout)).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Position: 1  Time: 1");
        assert_eq!(lines[1], "Engine Speed (rpm)  2000");
        assert_eq!(lines[2], "Air-Fuel Ratio      -");
    }
}
