//! Synchronisation of viewport and marker across every chart.
//!
//! [`SyncCoordinator`] is the only writer of the session's viewport and
//! marker. Viewport changes reach every chart at once. A marker placed from a
//! chart is drawn on that chart and the readout panel immediately, while the
//! other charts receive it after a short single-flight delay so that a fast
//! pointer sweep costs one redraw per chart instead of one per sample.

use std::time::{Duration, Instant};

use logscope_core::error::Result;
use logscope_core::models::{MarkerState, Viewport};
use tracing::{debug, info, warn};

use crate::chart_set::ChartSet;
use crate::events::{ChartEvent, Interaction, Pick, Pinch};
use crate::scheduler::SingleFlight;
use crate::session::Session;
use crate::surface::{ChartHandle, HandleId, MarkerPanel, SurfaceFactory};

/// Default delay before a marker is mirrored onto the other charts.
pub const DEFAULT_MARKER_DELAY: Duration = Duration::from_millis(40);

/// Marker waiting to be mirrored onto non-origin charts.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingMarker {
    origin: HandleId,
    x: Option<f64>,
}

pub struct SyncCoordinator<F: SurfaceFactory, P: MarkerPanel> {
    factory: F,
    charts: ChartSet<F::Handle>,
    panel: P,
    pending_marker: SingleFlight<PendingMarker>,
}

impl<F: SurfaceFactory, P: MarkerPanel> SyncCoordinator<F, P> {
    pub fn new(factory: F, panel: P, marker_delay: Duration) -> Self {
        Self {
            factory,
            charts: ChartSet::default(),
            panel,
            pending_marker: SingleFlight::new(marker_delay),
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn charts(&self) -> &ChartSet<F::Handle> {
        &self.charts
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// When the next deferred marker update is due, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending_marker.deadline()
    }

    // ── Chart set lifecycle ───────────────────────────────────────────────

    /// Build charts for a freshly loaded session.
    ///
    /// An empty selection leaves no charts; that is not an error here.
    pub fn attach(&mut self, session: &mut Session) -> usize {
        self.install(session);
        info!(charts = self.charts.len(), "charts attached");
        self.charts.len()
    }

    /// Replace the chart set for a new channel selection.
    ///
    /// On error nothing changes: the old charts, selection, viewport and
    /// marker stay in place. On success the previous viewport and marker are
    /// reapplied to the new charts.
    pub fn rebuild(&mut self, session: &mut Session, selection: &[String]) -> Result<usize> {
        let resolved = match session.resolve_selection(selection) {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(error = %e, "selection rejected; charts unchanged");
                return Err(e);
            }
        };
        session.set_selection_state(resolved);
        self.install(session);
        info!(charts = self.charts.len(), "charts rebuilt");
        Ok(self.charts.len())
    }

    fn install(&mut self, session: &Session) {
        // Deferred updates refer to handles that are about to be dropped.
        self.pending_marker.cancel();
        self.charts = ChartSet::build(&mut self.factory, session.series_specs());
        self.charts.apply_viewport(session.viewport());
        let marker_x = session.marker().sample_index().and_then(|i| session.axis().value(i));
        self.charts.apply_marker(marker_x, None);
        self.panel.show(session.current_readout().as_ref());
    }

    // ── Viewport ──────────────────────────────────────────────────────────

    /// Clamp `[low, high]` into the domain and apply it to every chart.
    pub fn set_viewport(&mut self, session: &mut Session, low: f64, high: f64) -> Viewport {
        let viewport = Viewport::clamped(low, high, &session.domain());
        session.set_viewport_state(viewport);
        self.charts.apply_viewport(viewport);
        debug!(low = viewport.low(), high = viewport.high(), "viewport applied");
        viewport
    }

    /// Show the whole domain.
    pub fn autorange(&mut self, session: &mut Session) -> Viewport {
        let domain = session.domain();
        self.set_viewport(session, domain.min, domain.max)
    }

    /// Shift the viewport by `fraction` of its width (negative pans left).
    pub fn pan(&mut self, session: &mut Session, fraction: f64) -> Viewport {
        let current = session.viewport();
        let (low, high) = current.panned(current.width() * fraction);
        self.set_viewport(session, low, high)
    }

    /// Zoom by `factor` (> 1 zooms in) keeping `anchor` in place, or the
    /// viewport centre when `anchor` is `None`.
    pub fn zoom(&mut self, session: &mut Session, factor: f64, anchor: Option<f64>) -> Viewport {
        let current = session.viewport();
        let anchor = anchor.unwrap_or_else(|| current.center());
        let (low, high) = current.zoomed(factor, anchor);
        self.set_viewport(session, low, high)
    }

    /// Apply a pinch: the new width is the old width divided by the pinch
    /// scale, centred on the gesture midpoint.
    pub fn pinch(&mut self, session: &mut Session, pinch: Pinch) -> Result<Viewport> {
        let Some(scale) = pinch.scale()? else {
            return Ok(session.viewport());
        };
        let width = session.viewport().width() / scale;
        let low = pinch.midpoint - width / 2.0;
        Ok(self.set_viewport(session, low, low + width))
    }

    // ── Marker ────────────────────────────────────────────────────────────

    /// Place the marker on row `index`.
    ///
    /// With an `origin` chart, that chart and the panel update now and the
    /// remaining charts at the next due [`Self::tick`]. Without one, every
    /// chart updates now. Out-of-range rows and rows without an x value are
    /// ignored, leaving the current marker in place.
    pub fn set_marker(
        &mut self,
        session: &mut Session,
        index: usize,
        origin: Option<HandleId>,
        now: Instant,
    ) -> bool {
        let Some(readout) = session.readout(index) else {
            debug!(index, "marker index out of range; ignored");
            return false;
        };
        let Some(x) = session.axis().value(index) else {
            debug!(index, "row has no x value; marker not moved");
            return false;
        };
        let x = Some(x);
        session.set_marker_state(MarkerState::at(index));
        self.panel.show(Some(&readout));

        match origin.filter(|id| self.charts.contains(*id)) {
            Some(origin) => {
                if let Some(handle) = self.charts.get_mut(origin) {
                    handle.set_marker_shape(x);
                }
                self.pending_marker.schedule(PendingMarker { origin, x }, now);
            }
            None => {
                self.pending_marker.cancel();
                self.charts.apply_marker(x, None);
            }
        }
        true
    }

    /// Move the marker by `delta` rows, starting from the first row when no
    /// marker is set. Rows without an x value are skipped in the direction of
    /// travel. Applied to every chart at once.
    pub fn step_marker(&mut self, session: &mut Session, delta: isize, now: Instant) -> bool {
        let count = session.sample_count();
        if count == 0 {
            return false;
        }
        let axis = session.axis();
        let has_x = |i: &usize| axis.value(*i).is_some();
        let target = match session.marker().sample_index() {
            None => (0..count).find(has_x),
            Some(current) if delta < 0 => {
                let wanted = current.saturating_sub(delta.unsigned_abs());
                (0..=wanted).rev().find(has_x)
            }
            Some(current) => {
                let wanted = current.saturating_add(delta.unsigned_abs()).min(count - 1);
                (wanted..count).find(has_x)
            }
        };
        match target {
            Some(index) => self.set_marker(session, index, None, now),
            None => false,
        }
    }

    /// Remove the marker from every chart and hide the panel.
    pub fn clear_marker(&mut self, session: &mut Session) {
        session.set_marker_state(MarkerState::none());
        self.pending_marker.cancel();
        self.charts.apply_marker(None, None);
        self.panel.show(None);
    }

    /// Deliver the deferred marker once its delay has passed.
    ///
    /// Returns `true` when charts were updated.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.pending_marker.take_due(now) {
            Some(PendingMarker { origin, x }) => {
                self.charts.apply_marker(x, Some(origin));
                true
            }
            None => false,
        }
    }

    // ── Reset ─────────────────────────────────────────────────────────────

    /// Back to the default viewport with no marker.
    pub fn reset(&mut self, session: &mut Session) -> Viewport {
        let initial = session.default_viewport();
        let viewport = self.set_viewport(session, initial.low(), initial.high());
        self.clear_marker(session);
        viewport
    }

    // ── Events ────────────────────────────────────────────────────────────

    /// Route one chart interaction.
    ///
    /// Events from charts that are no longer part of the set are dropped.
    pub fn handle_event(
        &mut self,
        session: &mut Session,
        event: ChartEvent,
        now: Instant,
    ) -> Result<()> {
        if !self.charts.contains(event.origin) {
            debug!(origin = %event.origin, "event from detached chart dropped");
            return Ok(());
        }
        match event.interaction {
            Interaction::Hover(pick) | Interaction::Click(pick) => {
                if let Some(index) = resolve_pick(session, pick) {
                    self.set_marker(session, index, Some(event.origin), now);
                }
            }
            Interaction::ViewportChanged(Some((low, high))) => {
                self.set_viewport(session, low, high);
            }
            Interaction::ViewportChanged(None) => {
                self.autorange(session);
            }
            Interaction::PinchGesture(pinch) => {
                if let Err(e) = self.pinch(session, pinch) {
                    warn!(error = %e, "pinch ignored");
                    return Err(e);
                }
            }
        }
        Ok(())
    }
}

/// Row picked by a pointer: the surface's own index when valid, otherwise
/// the row whose x is nearest.
fn resolve_pick(session: &Session, pick: Pick) -> Option<usize> {
    match pick.sample_index {
        Some(i) if i < session.sample_count() => Some(i),
        _ if pick.x.is_finite() => session.axis().nearest_index(pick.x),
        _ => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
