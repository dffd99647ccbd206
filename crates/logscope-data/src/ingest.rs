//! Delimited log ingestion.
//!
//! Turns the raw text of an engine-monitor export into a [`RecordSet`], the
//! header classification and the inferred x axis. The delimiter is inferred
//! from the first lines, splitting is quote-aware, and rows are forced to the
//! header's arity (missing trailing cells become null, extra cells are
//! dropped).

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use chrono_tz::Tz;
use logscope_core::error::{LogScopeError, Result};
use logscope_core::models::{
    ChannelOption, HeaderDescriptor, IngestReport, RecordSet, Row, XAxisDescriptor,
};
use logscope_core::time_utils::CalendarParser;
use tracing::{debug, info};

use crate::axis;
use crate::classifier;

/// Number of leading non-blank lines inspected for delimiter inference.
const DELIMITER_SAMPLE_LINES: usize = 5;

/// Invisible markers stripped from every field.
const INVISIBLE_MARKERS: &[char] = &['\u{feff}', '\u{200b}', '\u{200c}', '\u{200d}', '\u{2060}'];

// ── Options / result ──────────────────────────────────────────────────────────

/// Knobs for one ingestion run.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Zone used for naive timestamps and bare clock times.
    pub timezone: Tz,
    /// Date bare clock times are placed on.
    pub today: NaiveDate,
    /// Explicit x column; the inferred time column is used when `None`.
    pub x_column: Option<String>,
}

impl IngestOptions {
    /// Options anchored on the current date in `timezone`.
    pub fn new(timezone: Tz) -> Self {
        let today = chrono::Utc::now().with_timezone(&timezone).date_naive();
        Self {
            timezone,
            today,
            x_column: None,
        }
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn with_x_column(mut self, x_column: Option<String>) -> Self {
        self.x_column = x_column;
        self
    }
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

/// Everything produced by loading one file; replaced wholesale on reload.
#[derive(Debug, Clone)]
pub struct IngestedLog {
    /// File the log was read from, `None` for in-memory text.
    pub source: Option<PathBuf>,
    pub records: RecordSet,
    pub headers: Vec<HeaderDescriptor>,
    pub axis: XAxisDescriptor,
    pub report: IngestReport,
    pub timezone: Tz,
}

impl IngestedLog {
    /// Selectable channels (every header except the x column).
    pub fn channels(&self) -> Vec<ChannelOption> {
        classifier::channel_options(&self.headers, &self.axis.column)
    }

    /// Headers pre-checked by the default-selection heuristic.
    pub fn default_selection(&self) -> Vec<String> {
        self.channels()
            .into_iter()
            .filter(|c| c.default_checked)
            .map(|c| c.header)
            .collect()
    }

    /// Canonical display name of `header`, or the header itself.
    pub fn display_name<'a>(&'a self, header: &'a str) -> &'a str {
        self.headers
            .iter()
            .find(|d| d.raw == header)
            .map(|d| d.display_name.as_str())
            .unwrap_or(header)
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Read `path` and ingest its contents.
///
/// Invalid UTF-8 sequences are replaced rather than rejected.
pub fn load_file(path: &Path, options: &IngestOptions) -> Result<IngestedLog> {
    let bytes = std::fs::read(path).map_err(|source| LogScopeError::FileUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8_lossy(&bytes);
    let mut log = ingest_text(&text, options)?;
    log.source = Some(path.to_path_buf());
    info!(
        path = %path.display(),
        rows = log.records.len(),
        axis = %log.axis.kind,
        "log loaded"
    );
    Ok(log)
}

/// Ingest raw log text.
pub fn ingest_text(text: &str, options: &IngestOptions) -> Result<IngestedLog> {
    let (records, report) = parse_records(text)?;
    let headers = classifier::classify_headers(records.headers());

    let x_index = axis::select_x_column(records.headers(), options.x_column.as_deref())?;
    let x_column = records.headers()[x_index].clone();
    let parser = CalendarParser::new(options.timezone, options.today);
    let axis = axis::infer_axis(&records, &x_column, &parser);

    Ok(IngestedLog {
        source: None,
        records,
        headers,
        axis,
        report,
        timezone: options.timezone,
    })
}

/// Parse text into a record set without any axis inference.
///
/// Fails with [`LogScopeError::EmptyOrMalformed`] when there are fewer than
/// two non-blank lines or the header row has no names at all.
pub fn parse_records(text: &str) -> Result<(RecordSet, IngestReport)> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let lines: Vec<&str> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect();

    if lines.len() < 2 {
        return Err(LogScopeError::EmptyOrMalformed(format!(
            "expected a header and at least one data line, found {} non-blank line(s)",
            lines.len()
        )));
    }

    let sample_len = lines.len().min(DELIMITER_SAMPLE_LINES);
    let delimiter = infer_delimiter(&lines[..sample_len]);

    let raw_headers = split_line(lines[0], delimiter);
    if raw_headers.iter().all(|h| h.is_empty()) {
        return Err(LogScopeError::EmptyOrMalformed(
            "header row has no column names".to_string(),
        ));
    }
    let headers = unique_headers(raw_headers);
    let arity = headers.len();

    let mut report = IngestReport {
        delimiter,
        non_blank_lines: lines.len(),
        short_rows: 0,
        long_rows: 0,
    };

    let rows: Vec<Row> = lines[1..]
        .iter()
        .map(|line| {
            let mut fields = split_line(line, delimiter);
            if fields.len() < arity {
                report.short_rows += 1;
            } else if fields.len() > arity {
                report.long_rows += 1;
            }
            fields.truncate(arity);
            let mut cells: Vec<Option<String>> = fields
                .into_iter()
                .map(|f| if f.is_empty() { None } else { Some(f) })
                .collect();
            cells.resize(arity, None);
            Row::new(cells)
        })
        .collect();

    debug!(
        delimiter = %delimiter,
        columns = arity,
        rows = rows.len(),
        short_rows = report.short_rows,
        long_rows = report.long_rows,
        "records parsed"
    );

    Ok((RecordSet::new(headers, rows), report))
}

/// Pick `;` when it strictly outnumbers `,` outside quotes in `sample`.
pub fn infer_delimiter(sample: &[&str]) -> char {
    let (commas, semicolons) = sample.iter().fold((0usize, 0usize), |(c, s), line| {
        let counts = count_outside_quotes(line);
        (c + counts.0, s + counts.1)
    });
    if semicolons > commas {
        ';'
    } else {
        ','
    }
}

/// Split one line on `delimiter`, honouring double-quoted spans.
///
/// Quotes are removed; inside a quoted span the delimiter is literal and a
/// doubled quote stands for one quote character. Every field is trimmed and
/// cleaned of BOM / zero-width markers.
pub fn split_line(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            c if c == delimiter && !in_quotes => {
                fields.push(clean_field(&current));
                current.clear();
            }
            c => current.push(c),
        }
    }
    fields.push(clean_field(&current));
    fields
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// `(commas, semicolons)` outside quoted spans.
fn count_outside_quotes(line: &str) -> (usize, usize) {
    let mut in_quotes = false;
    let mut commas = 0;
    let mut semicolons = 0;
    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => commas += 1,
            ';' if !in_quotes => semicolons += 1,
            _ => {}
        }
    }
    (commas, semicolons)
}

fn clean_field(raw: &str) -> String {
    raw.chars()
        .filter(|c| !INVISIBLE_MARKERS.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Name empty headers `Column N` and suffix repeats with ` (2)`, ` (3)`, ….
///
/// A suffix never collides with a header that appears literally in the file.
fn unique_headers(raw: Vec<String>) -> Vec<String> {
    let bases: Vec<String> = raw
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            if name.is_empty() {
                format!("Column {}", i + 1)
            } else {
                name
            }
        })
        .collect();

    let mut taken: HashSet<String> = bases.iter().cloned().collect();
    let mut first_seen: HashSet<&str> = HashSet::new();
    let mut next_suffix: HashMap<&str, usize> = HashMap::new();
    let mut result = Vec::with_capacity(bases.len());
    for base in &bases {
        if first_seen.insert(base.as_str()) {
            result.push(base.clone());
            continue;
        }
        let suffix = next_suffix.entry(base.as_str()).or_insert(2);
        let mut candidate = format!("{} ({})", base, suffix);
        while taken.contains(&candidate) {
            *suffix += 1;
            candidate = format!("{} ({})", base, suffix);
        }
        *suffix += 1;
        taken.insert(candidate.clone());
        result.push(candidate);
    }
    result
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use logscope_core::models::AxisKind;
    use std::io::Write;
    use tempfile::TempDir;

    const SCENARIO_A: &str = "Time,RPM,AFR\n0,1000,14.7\n1,2000,12.1\n2,,13.0\n";

    fn options() -> IngestOptions {
        IngestOptions::new(Tz::UTC).with_today(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
    }

    // ── infer_delimiter ──────────────────────────────────────────────────────

    #[test]
    fn test_infer_delimiter_semicolon_majority() {
        assert_eq!(infer_delimiter(&["Time;RPM", "0;1000", "1;2000"]), ';');
    }

    #[test]
    fn test_infer_delimiter_tie_and_comma_majority() {
        assert_eq!(infer_delimiter(&["a;b,c"]), ',');
        assert_eq!(infer_delimiter(&["a,b,c", "1;2"]), ',');
        assert_eq!(infer_delimiter(&["nothing here"]), ',');
    }

    #[test]
    fn test_infer_delimiter_ignores_quoted_commas() {
        // Four quoted commas against two bare semicolons.
        assert_eq!(infer_delimiter(&["\"1,5\";\"2,5\"", "\"3,5\";\"4,5\""]), ';');
    }

    #[test]
    fn test_parse_only_samples_first_five_lines() {
        let text = "a;b\n1;2\n3;4\n5;6\n7;8\n9,9,9,9,9,9,9,9\n";
        let (_, report) = parse_records(text).unwrap();
        assert_eq!(report.delimiter, ';');
    }

    // ── split_line ───────────────────────────────────────────────────────────

    #[test]
    fn test_split_quoted_delimiter_is_literal() {
        assert_eq!(split_line("\"a,b\";c", ';'), vec!["a,b", "c"]);
        assert_eq!(split_line("\"a,b\",c", ','), vec!["a,b", "c"]);
    }

    #[test]
    fn test_split_trims_and_strips_markers() {
        assert_eq!(
            split_line("\u{feff} Time ;\u{200b}RPM\u{200d} ; ", ';'),
            vec!["Time", "RPM", ""]
        );
    }

    #[test]
    fn test_split_doubled_quote_is_literal() {
        assert_eq!(split_line("\"say \"\"hi\"\"\",x", ','), vec!["say \"hi\"", "x"]);
        assert_eq!(split_line("\"\",x", ','), vec!["", "x"]);
    }

    // ── parse_records ────────────────────────────────────────────────────────

    #[test]
    fn test_scenario_a_rows_and_nulls() {
        let (rs, report) = parse_records(SCENARIO_A).unwrap();
        assert_eq!(rs.len(), 3);
        assert_eq!(report.non_blank_lines, 4);
        assert_eq!(
            rs.numeric_column("RPM").unwrap(),
            vec![Some(1000.0), Some(2000.0), None]
        );
    }

    #[test]
    fn test_scenario_b_semicolon_file() {
        let (rs, report) = parse_records("Time;RPM\n0;1000\n1;2000\n").unwrap();
        assert_eq!(report.delimiter, ';');
        assert_eq!(rs.len(), 2);
        assert_eq!(rs.value(1, "RPM"), Some("2000"));
    }

    #[test]
    fn test_row_count_is_non_blank_lines_minus_one() {
        let text = "\n\nA,B\r\n1,2\r\n\r\n   \n3,4\n\n";
        let (rs, report) = parse_records(text).unwrap();
        assert_eq!(rs.len(), report.non_blank_lines - 1);
        assert_eq!(rs.len(), 2);
    }

    #[test]
    fn test_arity_short_rows_padded_long_rows_truncated() {
        let (rs, report) = parse_records("A,B,C\n1\n1,2,3,4,5\n").unwrap();
        assert_eq!(report.short_rows, 1);
        assert_eq!(report.long_rows, 1);
        assert!(rs.rows().iter().all(|r| r.cells().len() == 3));
        assert_eq!(rs.value(0, "B"), None);
        assert_eq!(rs.value(1, "C"), Some("3"));
    }

    #[test]
    fn test_bom_prefixed_header() {
        let (rs, _) = parse_records("\u{feff}Time,RPM\n0,1\n").unwrap();
        assert_eq!(rs.headers()[0], "Time");
    }

    #[test]
    fn test_headers_made_unique() {
        let (rs, _) = parse_records("RPM,,RPM,RPM\n1,2,3,4\n").unwrap();
        assert_eq!(rs.headers(), &["RPM", "Column 2", "RPM (2)", "RPM (3)"]);
    }

    #[test]
    fn test_suffix_skips_literal_header() {
        let log = ingest_text("Time,RPM,RPM (2),RPM\n0,1,2,3\n", &IngestOptions::default())
            .unwrap();
        assert_eq!(log.records.headers(), &["Time", "RPM", "RPM (2)", "RPM (3)"]);
        assert_eq!(log.records.value(0, "RPM (2)"), Some("2"));
        assert_eq!(log.records.value(0, "RPM (3)"), Some("3"));

        let channels: Vec<String> = log.channels().into_iter().map(|c| c.header).collect();
        let distinct: HashSet<&String> = channels.iter().collect();
        assert_eq!(distinct.len(), channels.len());
    }

    #[test]
    fn test_repeated_literal_suffix_header() {
        let (rs, _) = parse_records("A,A (2),A,A (2)\n1,2,3,4\n").unwrap();
        assert_eq!(rs.headers(), &["A", "A (2)", "A (3)", "A (2) (2)"]);
    }

    #[test]
    fn test_too_few_lines_is_malformed() {
        for text in ["", "   \n\n", "Time,RPM\n", "Time,RPM\n\n  \n"] {
            let err = parse_records(text).unwrap_err();
            assert!(matches!(err, LogScopeError::EmptyOrMalformed(_)), "{text:?}");
        }
    }

    #[test]
    fn test_empty_header_row_is_malformed() {
        let err = parse_records(" , \n1,2\n").unwrap_err();
        assert!(matches!(err, LogScopeError::EmptyOrMalformed(_)));
    }

    // ── ingest_text ──────────────────────────────────────────────────────────

    #[test]
    fn test_ingest_scenario_a() {
        let log = ingest_text(SCENARIO_A, &options()).unwrap();
        assert_eq!(log.axis.column, "Time");
        assert_eq!(log.axis.kind, AxisKind::Numeric);
        assert_eq!(log.axis.values, vec![Some(0.0), Some(1.0), Some(2.0)]);
        assert_eq!(log.axis.len(), log.records.len());

        let channels = log.channels();
        assert_eq!(channels.len(), 2);
        assert_eq!(log.default_selection(), vec!["RPM", "AFR"]);
        assert_eq!(log.display_name("RPM"), "Engine Speed (rpm)");
        assert_eq!(log.display_name("missing"), "missing");
    }

    #[test]
    fn test_ingest_x_column_override() {
        let opts = options().with_x_column(Some("RPM".to_string()));
        let log = ingest_text(SCENARIO_A, &opts).unwrap();
        assert_eq!(log.axis.column, "RPM");
        assert!(log.channels().iter().any(|c| c.header == "Time"));
    }

    #[test]
    fn test_ingest_unknown_x_column() {
        let opts = options().with_x_column(Some("Lap".to_string()));
        let err = ingest_text(SCENARIO_A, &opts).unwrap_err();
        assert!(matches!(err, LogScopeError::UnknownColumn(ref c) if c == "Lap"));
    }

    // ── load_file ────────────────────────────────────────────────────────────

    #[test]
    fn test_load_file_sets_source() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pull.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{}", SCENARIO_A).unwrap();

        let log = load_file(&path, &options()).unwrap();
        assert_eq!(log.source.as_deref(), Some(path.as_path()));
        assert_eq!(log.records.len(), 3);
    }

    #[test]
    fn test_load_file_missing_is_unreadable() {
        let dir = TempDir::new().unwrap();
        let err = load_file(&dir.path().join("nope.csv"), &options()).unwrap_err();
        assert!(matches!(err, LogScopeError::FileUnreadable { .. }));
    }
}
