//! Terminal UI layer for logscope.
//!
//! Provides themes, the channel list, ratatui-backed chart surfaces, the
//! marker readout panel and the main application event loop.

pub mod app;
pub mod channel_list;
pub mod chart_view;
pub mod components;
pub mod marker_panel;
pub mod themes;

pub use app::{App, AppConfig};
pub use logscope_core as core;
