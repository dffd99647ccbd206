//! Interaction events raised by chart surfaces.

use logscope_core::error::{LogScopeError, Result};

use crate::surface::HandleId;

/// Scale factors this close to 1 are treated as no zoom.
pub const PINCH_EPSILON: f64 = 1e-6;

/// A pointer position resolved against a chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pick {
    /// Sample under the pointer, when the surface resolved one.
    pub sample_index: Option<usize>,
    /// Pointer x in axis units.
    pub x: f64,
}

impl Pick {
    pub fn at_x(x: f64) -> Self {
        Self {
            sample_index: None,
            x,
        }
    }

    pub fn at_index(sample_index: usize, x: f64) -> Self {
        Self {
            sample_index: Some(sample_index),
            x,
        }
    }
}

/// Two-finger zoom: distance between touch points before and after, plus the
/// x position of their midpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pinch {
    pub previous_distance: f64,
    pub current_distance: f64,
    pub midpoint: f64,
}

impl Pinch {
    /// Zoom scale of the gesture (> 1 zooms in).
    ///
    /// Non-finite or non-positive distances are rejected. A scale within
    /// [`PINCH_EPSILON`] of 1 yields `None`.
    pub fn scale(&self) -> Result<Option<f64>> {
        let Pinch {
            previous_distance,
            current_distance,
            midpoint,
        } = *self;
        if !previous_distance.is_finite() || previous_distance <= 0.0 {
            return Err(LogScopeError::InvalidGesture(format!(
                "previous distance must be finite and > 0, got {previous_distance}"
            )));
        }
        if !current_distance.is_finite() || current_distance <= 0.0 {
            return Err(LogScopeError::InvalidGesture(format!(
                "current distance must be finite and > 0, got {current_distance}"
            )));
        }
        if !midpoint.is_finite() {
            return Err(LogScopeError::InvalidGesture(format!(
                "midpoint must be finite, got {midpoint}"
            )));
        }
        let scale = current_distance / previous_distance;
        if (scale - 1.0).abs() <= PINCH_EPSILON {
            return Ok(None);
        }
        Ok(Some(scale))
    }
}

/// What the user did on a chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interaction {
    Hover(Pick),
    Click(Pick),
    /// The surface proposes a new x range; `None` asks for autorange.
    ViewportChanged(Option<(f64, f64)>),
    PinchGesture(Pinch),
}

/// An interaction tagged with the chart it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartEvent {
    pub origin: HandleId,
    pub interaction: Interaction,
}

impl ChartEvent {
    pub fn new(origin: HandleId, interaction: Interaction) -> Self {
        Self {
            origin,
            interaction,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
