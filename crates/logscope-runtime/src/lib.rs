//! Runtime layer for logscope.
//!
//! Owns the per-load [`session::Session`], keeps every chart on the same
//! viewport and marker through [`sync::SyncCoordinator`], and loads files in
//! the background with [`loader::LogLoader`].

pub mod chart_set;
pub mod events;
pub mod loader;
pub mod scheduler;
pub mod session;
pub mod surface;
pub mod sync;

pub use events::{ChartEvent, Interaction, Pick, Pinch};
pub use loader::{LoadOutcome, LogLoader};
pub use session::Session;
pub use surface::{ChartHandle, HandleId, MarkerPanel, SeriesSpec, SurfaceFactory};
pub use sync::SyncCoordinator;

pub use logscope_core as core;
pub use logscope_data as data;
