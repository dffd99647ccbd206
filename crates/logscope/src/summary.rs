//! `--summary` output: what ingestion made of a file, as JSON.

use logscope_core::error::Result;
use logscope_core::models::{AxisKind, Domain, HeaderDescriptor, IngestReport};
use logscope_runtime::Session;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct LogSummary<'a> {
    pub file: Option<String>,
    pub rows: usize,
    pub report: &'a IngestReport,
    pub axis: AxisSummary<'a>,
    pub headers: &'a [HeaderDescriptor],
    pub channels: Vec<ChannelSummary<'a>>,
}

#[derive(Debug, Serialize)]
pub struct AxisSummary<'a> {
    pub kind: AxisKind,
    pub column: &'a str,
    pub domain: Domain,
    /// Rows whose x cell did not parse.
    pub gaps: usize,
}

#[derive(Debug, Serialize)]
pub struct ChannelSummary<'a> {
    pub header: &'a str,
    pub display_name: &'a str,
    pub default: bool,
    pub selected: bool,
    pub gaps: usize,
}

pub fn summarize(session: &Session) -> LogSummary<'_> {
    let log = session.log();
    let axis = session.axis();
    let channels = session
        .channels()
        .iter()
        .map(|c| ChannelSummary {
            header: &c.header,
            display_name: &c.display_name,
            default: c.default_checked,
            selected: session.is_selected(&c.header),
            gaps: log
                .records
                .numeric_column(&c.header)
                .map(|ys| ys.iter().filter(|y| y.is_none()).count())
                .unwrap_or(0),
        })
        .collect();

    LogSummary {
        file: log.source.as_ref().map(|p| p.display().to_string()),
        rows: session.sample_count(),
        report: &log.report,
        axis: AxisSummary {
            kind: axis.kind,
            column: &axis.column,
            domain: axis.domain,
            gaps: axis.values.iter().filter(|v| v.is_none()).count(),
        },
        headers: &log.headers,
        channels,
    }
}

/// Pretty-printed JSON for `session`.
pub fn to_json(session: &Session) -> Result<String> {
    Ok(serde_json::to_string_pretty(&summarize(session))?)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
