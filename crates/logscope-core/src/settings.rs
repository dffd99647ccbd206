use clap::Parser;
use std::path::PathBuf;

use crate::time_utils;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Synchronised multi-channel viewer for engine-monitor log exports
#[derive(Parser, Debug, Clone)]
#[command(
    name = "logscope",
    about = "Synchronised multi-channel viewer for engine-monitor log exports",
    version
)]
pub struct Settings {
    /// Delimited log file to open (`,` or `;` separated, header row first)
    pub file: Option<PathBuf>,

    /// Column to use as the x axis instead of the inferred time column
    #[arg(long)]
    pub x_column: Option<String>,

    /// Initial channel selection (comma separated headers)
    #[arg(long, value_delimiter = ',')]
    pub channels: Vec<String>,

    /// Default viewport width in x-axis units (full range if not specified)
    #[arg(long, value_parser = parse_positive_width)]
    pub window: Option<f64>,

    /// Delay before the marker is mirrored onto the other charts (ms)
    #[arg(long, default_value = "40", value_parser = clap::value_parser!(u64).range(1..=1000))]
    pub marker_delay_ms: u64,

    /// Timezone for naive timestamps (auto-detected if not specified)
    #[arg(long, default_value = "auto", value_parser = parse_timezone_name)]
    pub timezone: String,

    /// Display theme
    #[arg(long, default_value = "auto", value_parser = ["light", "dark", "classic", "auto"])]
    pub theme: String,

    /// Print a JSON summary of the parsed file and exit
    #[arg(long)]
    pub summary: bool,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Settings {
    /// Parse the process arguments and resolve `"auto"` values.
    pub fn load() -> Self {
        Self::load_from_args(std::env::args_os())
    }

    /// Same as [`Settings::load`] with an explicit argument list.
    pub fn load_from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::resolve_auto_values(Settings::parse_from(args))
    }

    /// Resolve `"auto"` sentinel values and apply the `--debug` flag.
    fn resolve_auto_values(mut settings: Settings) -> Settings {
        if settings.timezone.eq_ignore_ascii_case("auto") {
            settings.timezone = time_utils::get_system_timezone();
        }

        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        settings
    }

    /// Marker debounce delay as a [`std::time::Duration`].
    pub fn marker_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.marker_delay_ms)
    }
}

fn parse_positive_width(s: &str) -> Result<f64, String> {
    let width: f64 = s
        .parse()
        .map_err(|_| format!("`{}` is not a number", s))?;
    if width.is_finite() && width > 0.0 {
        Ok(width)
    } else {
        Err("window width must be a positive number".to_string())
    }
}

fn parse_timezone_name(s: &str) -> Result<String, String> {
    if s.eq_ignore_ascii_case("auto") || time_utils::validate_timezone(s) {
        Ok(s.to_string())
    } else {
        Err(format!("`{}` is not an IANA timezone name", s))
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
