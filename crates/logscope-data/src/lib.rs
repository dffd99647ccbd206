//! Data ingestion layer for logscope.
//!
//! Reads delimited engine-monitor exports, infers the delimiter and the x
//! axis, and classifies headers into display names and default channels.

pub mod axis;
pub mod classifier;
pub mod ingest;

pub use ingest::{ingest_text, load_file, IngestOptions, IngestedLog};
pub use logscope_core as core;
