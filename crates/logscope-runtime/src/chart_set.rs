//! The live set of chart handles, one per selected channel.

use logscope_core::models::Viewport;

use crate::surface::{ChartHandle, HandleId, SeriesSpec, SurfaceFactory};

/// One chart in display order.
#[derive(Debug)]
pub struct ChartEntry<H> {
    pub id: HandleId,
    pub channel: String,
    pub handle: H,
}

/// Chart handles for the current selection.
///
/// A set is never edited in place: a selection change builds a new one and
/// the old handles are dropped with it.
#[derive(Debug)]
pub struct ChartSet<H> {
    entries: Vec<ChartEntry<H>>,
}

impl<H> Default for ChartSet<H> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<H: ChartHandle> ChartSet<H> {
    /// Create one handle per spec, ids in spec order.
    pub fn build<F>(factory: &mut F, specs: Vec<SeriesSpec>) -> Self
    where
        F: SurfaceFactory<Handle = H>,
    {
        let entries = specs
            .into_iter()
            .enumerate()
            .map(|(i, spec)| {
                let id = HandleId(i);
                let channel = spec.channel.clone();
                ChartEntry {
                    id,
                    channel,
                    handle: factory.create(id, spec),
                }
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: HandleId) -> bool {
        id.0 < self.entries.len()
    }

    pub fn get(&self, id: HandleId) -> Option<&H> {
        self.entries.get(id.0).map(|e| &e.handle)
    }

    pub fn get_mut(&mut self, id: HandleId) -> Option<&mut H> {
        self.entries.get_mut(id.0).map(|e| &mut e.handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChartEntry<H>> {
        self.entries.iter()
    }

    pub fn channels(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.channel.as_str()).collect()
    }

    /// Push `viewport` to every handle.
    pub fn apply_viewport(&mut self, viewport: Viewport) {
        for entry in &mut self.entries {
            entry.handle.set_viewport(viewport);
        }
    }

    /// Draw the marker at `x` on every handle except `skip`.
    pub fn apply_marker(&mut self, x: Option<f64>, skip: Option<HandleId>) {
        for entry in &mut self.entries {
            if Some(entry.id) != skip {
                entry.handle.set_marker_shape(x);
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
