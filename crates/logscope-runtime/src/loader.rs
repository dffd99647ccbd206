//! Background file loading.
//!
//! Reading and parsing a log runs on tokio's blocking pool; the result comes
//! back through an `mpsc` channel so the UI loop never blocks on disk. Each
//! request is tagged with a generation number and only the newest one is
//! accepted, so a slow load can never overwrite a newer file.

use std::path::PathBuf;

use logscope_core::error::{LogScopeError, Result};
use logscope_data::{load_file, IngestOptions, IngestedLog};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

// ── Public types ──────────────────────────────────────────────────────────────

/// Result of one load request.
#[derive(Debug)]
pub struct LoadOutcome {
    pub generation: u64,
    pub path: PathBuf,
    pub result: Result<IngestedLog>,
}

// ── LogLoader ─────────────────────────────────────────────────────────────────

/// Issues load requests and filters their outcomes.
pub struct LogLoader {
    options: IngestOptions,
    tx: mpsc::Sender<LoadOutcome>,
    latest: u64,
    pending: Option<u64>,
    task: Option<JoinHandle<()>>,
}

impl LogLoader {
    /// Create a loader and the receiver its outcomes arrive on.
    pub fn new(options: IngestOptions) -> (Self, mpsc::Receiver<LoadOutcome>) {
        let (tx, rx) = mpsc::channel(16);
        let loader = Self {
            options,
            tx,
            latest: 0,
            pending: None,
            task: None,
        };
        (loader, rx)
    }

    pub fn options(&self) -> &IngestOptions {
        &self.options
    }

    /// `true` while the newest request has not been accepted yet.
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Start loading `path`, superseding any load still in flight.
    ///
    /// Must be called from within a tokio runtime. Returns the generation
    /// assigned to this request.
    pub fn request(&mut self, path: PathBuf) -> u64 {
        self.latest += 1;
        let generation = self.latest;
        self.pending = Some(generation);

        if let Some(previous) = self.task.take() {
            previous.abort();
        }

        let tx = self.tx.clone();
        let options = self.options.clone();
        debug!(generation, path = %path.display(), "load requested");

        self.task = Some(tokio::spawn(async move {
            let read_path = path.clone();
            let joined = tokio::task::spawn_blocking(move || load_file(&read_path, &options)).await;
            let result = match joined {
                Ok(result) => result,
                Err(e) => Err(LogScopeError::Other(anyhow::anyhow!("load task failed: {e}"))),
            };
            let outcome = LoadOutcome {
                generation,
                path,
                result,
            };
            if let Err(e) = tx.send(outcome).await {
                warn!(error = %e, "failed to deliver load outcome; receiver dropped");
            }
        }));
        generation
    }

    /// Filter an outcome received from the channel.
    ///
    /// Outcomes from superseded requests are discarded and yield `None`.
    pub fn accept(&mut self, outcome: LoadOutcome) -> Option<Result<IngestedLog>> {
        if outcome.generation != self.latest {
            warn!(
                generation = outcome.generation,
                latest = self.latest,
                path = %outcome.path.display(),
                "stale load discarded"
            );
            return None;
        }
        self.pending = None;
        self.task = None;
        Some(outcome.result)
    }
}

impl Drop for LogLoader {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
