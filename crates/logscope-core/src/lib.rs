//! Shared model layer for logscope.
//!
//! Holds the error type, the record/axis/viewport data model, command-line
//! settings, calendar parsing and the number and marker-readout formatting
//! used by every other crate.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use error::{LogScopeError, Result};
