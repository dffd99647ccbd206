//! Header classification: canonical display names and default selection.
//!
//! Both decisions are driven by plain data tables so they can be inspected
//! and tested without any UI. Matching works on a compacted key (lowercase,
//! letters and digits only).

use std::sync::OnceLock;

use logscope_core::models::{ChannelOption, HeaderDescriptor};
use regex::Regex;

// ── Tables ────────────────────────────────────────────────────────────────────

/// A set of header spellings mapped to one canonical display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AliasGroup {
    /// Compacted spellings, most specific first.
    pub aliases: &'static [&'static str],
    pub canonical: &'static str,
    /// Channel is pre-checked in the selection list.
    pub default_select: bool,
}

/// Alias groups in priority order; the first matching group wins.
pub const ALIAS_GROUPS: &[AliasGroup] = &[
    AliasGroup {
        aliases: &["enginespeedrpm", "enginespeed", "engspeed", "rpm"],
        canonical: "Engine Speed (rpm)",
        default_select: true,
    },
    AliasGroup {
        aliases: &["airfuelratio", "airfuel", "wideband", "afr"],
        canonical: "Air-Fuel Ratio",
        default_select: true,
    },
    AliasGroup {
        aliases: &["massairflow", "airflow", "maf"],
        canonical: "Mass Air Flow",
        default_select: true,
    },
    AliasGroup {
        aliases: &["injectordutycycle", "injectorduty", "injduty", "idc"],
        canonical: "Injector Duty (%)",
        default_select: true,
    },
    AliasGroup {
        aliases: &["boostpressure", "boost"],
        canonical: "Boost Pressure",
        default_select: true,
    },
    AliasGroup {
        aliases: &["manifoldabsolutepressure", "manifoldpressure", "map"],
        canonical: "Manifold Pressure",
        default_select: true,
    },
    AliasGroup {
        aliases: &["oilpressure", "oilpress"],
        canonical: "Oil Pressure",
        default_select: true,
    },
    AliasGroup {
        aliases: &["throttleposition", "throttle", "tps"],
        canonical: "Throttle Position (%)",
        default_select: false,
    },
    AliasGroup {
        aliases: &["coolanttemperature", "coolanttemp", "coolant"],
        canonical: "Coolant Temp",
        default_select: false,
    },
    AliasGroup {
        aliases: &["intakeairtemp", "intakeair", "intaketemp", "iat"],
        canonical: "Intake Air Temp",
        default_select: false,
    },
    AliasGroup {
        aliases: &["ignitiontiming", "timingadvance", "ignadvance"],
        canonical: "Ignition Timing",
        default_select: false,
    },
    AliasGroup {
        aliases: &["lambda"],
        canonical: "Lambda",
        default_select: false,
    },
    AliasGroup {
        aliases: &["batteryvoltage", "battery", "vbat"],
        canonical: "Battery Voltage",
        default_select: false,
    },
    AliasGroup {
        aliases: &["vehiclespeed", "vss", "speed"],
        canonical: "Vehicle Speed",
        default_select: false,
    },
];

/// Key substrings that pre-check a channel even without an alias match.
pub const DEFAULT_CHANNEL_HINTS: &[&str] = &[
    "afr",
    "airfuel",
    "rpm",
    "maf",
    "massairflow",
    "injectorduty",
    "injduty",
    "boost",
    "pressure",
];

/// Pattern a header must match to be considered the time column.
pub const TIME_COLUMN_PATTERN: &str = r"(?i)time|timestamp|date|utc";

/// Shortest key allowed to match by being contained in a longer alias.
const MIN_REVERSE_MATCH_LEN: usize = 3;

// ── Public API ────────────────────────────────────────────────────────────────

/// Lowercase `header` and drop everything but letters and digits.
pub fn compact_key(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// First alias group whose spelling contains, or is contained in, `key`.
pub fn resolve_alias(key: &str) -> Option<&'static AliasGroup> {
    if key.is_empty() {
        return None;
    }
    ALIAS_GROUPS.iter().find(|group| {
        group.aliases.iter().any(|alias| {
            key.contains(alias) || (key.len() >= MIN_REVERSE_MATCH_LEN && alias.contains(key))
        })
    })
}

/// `true` when `header` looks like a time/date column.
pub fn is_time_candidate(header: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(TIME_COLUMN_PATTERN).expect("time pattern is valid"))
        .is_match(header)
}

/// Classify one header.
pub fn classify_header(raw: &str) -> HeaderDescriptor {
    let key = compact_key(raw);
    let alias = resolve_alias(&key);
    let hinted = !key.is_empty() && DEFAULT_CHANNEL_HINTS.iter().any(|h| key.contains(h));

    HeaderDescriptor {
        raw: raw.to_string(),
        display_name: alias
            .map(|g| g.canonical.to_string())
            .unwrap_or_else(|| raw.to_string()),
        time_candidate: is_time_candidate(raw),
        default_channel: alias.is_some_and(|g| g.default_select) || hinted,
        key,
    }
}

/// Classify every header, preserving order.
pub fn classify_headers(headers: &[String]) -> Vec<HeaderDescriptor> {
    headers.iter().map(|h| classify_header(h)).collect()
}

/// Selectable channels: every header except the x column.
pub fn channel_options(descriptors: &[HeaderDescriptor], x_column: &str) -> Vec<ChannelOption> {
    descriptors
        .iter()
        .filter(|d| d.raw != x_column)
        .map(|d| ChannelOption {
            header: d.raw.clone(),
            display_name: d.display_name.clone(),
            default_checked: d.default_channel,
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── compact_key ──────────────────────────────────────────────────────────

    #[test]
    fn test_compact_key_strips_punctuation_and_case() {
        assert_eq!(compact_key("Engine Speed (RPM)"), "enginespeedrpm");
        assert_eq!(compact_key("A/F-Ratio"), "afratio");
        assert_eq!(compact_key(" _ "), "");
    }

    // ── resolve_alias ────────────────────────────────────────────────────────

    #[test]
    fn test_alias_forward_containment() {
        assert_eq!(resolve_alias("rpm").unwrap().canonical, "Engine Speed (rpm)");
        assert_eq!(resolve_alias("mafgs").unwrap().canonical, "Mass Air Flow");
        assert_eq!(resolve_alias("boostkpa").unwrap().canonical, "Boost Pressure");
    }

    #[test]
    fn test_alias_reverse_containment() {
        // "engine" is a prefix of the "enginespeed" spelling.
        assert_eq!(resolve_alias("engine").unwrap().canonical, "Engine Speed (rpm)");
        assert_eq!(resolve_alias("injector").unwrap().canonical, "Injector Duty (%)");
    }

    #[test]
    fn test_alias_first_match_wins() {
        // Contains both "enginespeed" and "speed"; the engine group is first.
        assert_eq!(
            resolve_alias("enginespeed").unwrap().canonical,
            "Engine Speed (rpm)"
        );
        assert_eq!(resolve_alias("vehiclespeedkmh").unwrap().canonical, "Vehicle Speed");
    }

    #[test]
    fn test_alias_short_keys_do_not_reverse_match() {
        assert!(resolve_alias("a").is_none());
        assert!(resolve_alias("").is_none());
        assert!(resolve_alias("gear").is_none());
    }

    // ── is_time_candidate ────────────────────────────────────────────────────

    #[test]
    fn test_time_candidates() {
        assert!(is_time_candidate("Time"));
        assert!(is_time_candidate("TIMESTAMP"));
        assert!(is_time_candidate("Log Date"));
        assert!(is_time_candidate("utc_ms"));
        assert!(!is_time_candidate("Ignition Timing"));
        assert!(!is_time_candidate("RPM"));
    }

    // ── classify_header ──────────────────────────────────────────────────────

    #[test]
    fn test_classify_alias_and_default() {
        let d = classify_header("RPM");
        assert_eq!(d.key, "rpm");
        assert_eq!(d.display_name, "Engine Speed (rpm)");
        assert!(d.default_channel);
        assert!(!d.time_candidate);

        let tps = classify_header("TPS %");
        assert_eq!(tps.display_name, "Throttle Position (%)");
        assert!(!tps.default_channel);
    }

    #[test]
    fn test_classify_unknown_keeps_raw_name() {
        let d = classify_header("Fuel Pressure");
        assert_eq!(d.display_name, "Fuel Pressure");
        // No alias, but the "pressure" hint still pre-checks it.
        assert!(d.default_channel);

        let gear = classify_header("Gear");
        assert_eq!(gear.display_name, "Gear");
        assert!(!gear.default_channel);
    }

    // ── channel_options ──────────────────────────────────────────────────────

    #[test]
    fn test_channel_options_exclude_x_column() {
        let headers = vec!["Time".to_string(), "RPM".to_string(), "AFR".to_string()];
        let descriptors = classify_headers(&headers);
        let options = channel_options(&descriptors, "Time");

        assert_eq!(options.len(), 2);
        assert_eq!(options[0].header, "RPM");
        assert_eq!(options[1].display_name, "Air-Fuel Ratio");
        assert!(options.iter().all(|o| o.default_checked));
    }
}
