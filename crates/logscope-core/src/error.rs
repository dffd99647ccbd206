use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by logscope.
///
/// Row-arity mismatches and unparseable channel cells are recovered during
/// ingestion (null cells / series gaps) and never show up here.
#[derive(Error, Debug)]
pub enum LogScopeError {
    /// The log file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input has fewer than two non-blank lines or an empty header row.
    #[error("Empty or malformed log: {0}")]
    EmptyOrMalformed(String),

    /// A chart rebuild was requested with an empty channel selection.
    #[error("No channels selected")]
    NoChannelsSelected,

    /// A column name given on the command line or by the UI does not exist.
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// A pinch or zoom gesture carried unusable geometry.
    #[error("Invalid gesture: {0}")]
    InvalidGesture(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A summary document could not be serialised.
    #[error("Failed to serialise JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the logscope crates.
pub type Result<T> = std::result::Result<T, LogScopeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_unreadable() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = LogScopeError::FileUnreadable {
            path: PathBuf::from("/logs/pull-3.csv"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/logs/pull-3.csv"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_empty_or_malformed() {
        let err = LogScopeError::EmptyOrMalformed("only a header line".to_string());
        assert_eq!(err.to_string(), "Empty or malformed log: only a header line");
    }

    #[test]
    fn test_error_display_no_channels() {
        assert_eq!(
            LogScopeError::NoChannelsSelected.to_string(),
            "No channels selected"
        );
    }

    #[test]
    fn test_error_display_unknown_column() {
        let err = LogScopeError::UnknownColumn("Boost".to_string());
        assert_eq!(err.to_string(), "Unknown column: Boost");
    }

    #[test]
    fn test_error_display_invalid_gesture() {
        let err = LogScopeError::InvalidGesture("pinch distance must be > 0".to_string());
        assert_eq!(err.to_string(), "Invalid gesture: pinch distance must be > 0");
    }

    #[test]
    fn test_error_display_config() {
        let err = LogScopeError::Config("--summary needs a log file".to_string());
        assert_eq!(err.to_string(), "Configuration error: --summary needs a log file");
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: LogScopeError = json_err.into();
        assert!(err.to_string().contains("Failed to serialise JSON"));
    }
}
