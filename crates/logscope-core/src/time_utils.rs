use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone as _, Utc};
use chrono_tz::Tz;
use regex::Regex;
use tracing::warn;

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Uses the `iana-time-zone` crate directly – no subprocess calls.
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

/// Resolve a configured zone name (`"auto"` means the system zone).
///
/// Unknown names fall back to UTC with a warning.
pub fn resolve_timezone(name: &str) -> Tz {
    let name = if name.eq_ignore_ascii_case("auto") {
        get_system_timezone()
    } else {
        name.to_string()
    };
    name.parse::<Tz>().unwrap_or_else(|_| {
        warn!("unrecognised timezone \"{}\", falling back to UTC", name);
        Tz::UTC
    })
}

/// Validate that `tz_name` is a recognised IANA timezone identifier.
pub fn validate_timezone(tz_name: &str) -> bool {
    tz_name.parse::<Tz>().is_ok()
}

// ── CalendarParser ────────────────────────────────────────────────────────────

/// Naive date-time layouts tried after RFC 3339, in order.
const DATETIME_FMTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%d.%m.%Y %H:%M:%S%.f",
    "%d.%m.%Y %H:%M:%S",
];

/// Parses x-column cells into epoch milliseconds.
///
/// Naive values are interpreted in `tz`. A bare clock time (`HH:MM:SS[.f]`)
/// is placed on `today`, so logs that cross midnight fold back onto one day.
#[derive(Debug, Clone)]
pub struct CalendarParser {
    tz: Tz,
    today: NaiveDate,
    clock: Regex,
}

impl CalendarParser {
    pub fn new(tz: Tz, today: NaiveDate) -> Self {
        Self {
            tz,
            today,
            clock: Regex::new(r"^(\d{1,2}):(\d{2}):(\d{2})(?:\.(\d{1,9}))?$")
                .expect("clock pattern is valid"),
        }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Epoch milliseconds for `raw`, or `None` when no layout matches.
    pub fn parse_epoch_millis(&self, raw: &str) -> Option<f64> {
        self.parse(raw).map(|dt| dt.timestamp_millis() as f64)
    }

    fn parse(&self, raw: &str) -> Option<DateTime<Utc>> {
        let s = raw.trim();
        if s.is_empty() {
            return None;
        }

        if let Some(time) = self.parse_clock(s) {
            return self.localise(&self.today.and_time(time));
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }

        for fmt in DATETIME_FMTS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                return self.localise(&naive);
            }
        }

        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .and_then(|naive| self.localise(&naive))
    }

    fn parse_clock(&self, s: &str) -> Option<NaiveTime> {
        let caps = self.clock.captures(s)?;
        let hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = caps[2].parse().ok()?;
        let second: u32 = caps[3].parse().ok()?;
        let nanos = match caps.get(4) {
            Some(frac) => {
                let digits = frac.as_str();
                let padded = format!("{:0<9}", digits);
                padded.parse::<u32>().ok()?
            }
            None => 0,
        };
        NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)
    }

    fn localise(&self, naive: &NaiveDateTime) -> Option<DateTime<Utc>> {
        self.tz
            .from_local_datetime(naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

// ── Display ───────────────────────────────────────────────────────────────────

/// `HH:MM:SS.mmm` of an epoch-millisecond value in `tz`.
pub fn format_clock(epoch_ms: f64, tz: &Tz) -> String {
    match to_datetime(epoch_ms) {
        Some(dt) => dt.with_timezone(tz).format("%H:%M:%S%.3f").to_string(),
        None => "-".to_string(),
    }
}

/// `YYYY-MM-DD HH:MM:SS.mmm` of an epoch-millisecond value in `tz`.
pub fn format_datetime(epoch_ms: f64, tz: &Tz) -> String {
    match to_datetime(epoch_ms) {
        Some(dt) => dt
            .with_timezone(tz)
            .format("%Y-%m-%d %H:%M:%S%.3f")
            .to_string(),
        None => "-".to_string(),
    }
}

fn to_datetime(epoch_ms: f64) -> Option<DateTime<Utc>> {
    if !epoch_ms.is_finite() {
        return None;
    }
    DateTime::<Utc>::from_timestamp_millis(epoch_ms.round() as i64)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
