//! Progress reporting and cooperative cancellation
//!
//! The runner announces each phase; the track pass additionally reports
//! after every batch and stops when `progress` returns false.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use super::{DrcPhase, Marker};

pub trait ProgressReporter {
    fn phase(&mut self, phase: DrcPhase);

    /// Called at batch boundaries; return false to cancel the current phase
    fn progress(&mut self, _done: usize, _total: usize) -> bool {
        true
    }

    /// Markers found since the previous call within a long phase
    fn markers_added(&mut self, _markers: &[Marker]) {}
}

/// Reporter that ignores everything and never cancels
#[derive(Debug, Default)]
pub struct NullReporter;

impl ProgressReporter for NullReporter {
    fn phase(&mut self, _phase: DrcPhase) {}
}

/// Shared cancel flag, settable from another thread
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Writes phase and batch progress to the tracing log
#[derive(Debug, Default)]
pub struct LogReporter {
    cancel: Option<CancellationToken>,
    phases: Vec<DrcPhase>,
}

impl LogReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Phases announced so far, in order
    pub fn phases(&self) -> &[DrcPhase] {
        &self.phases
    }
}

impl ProgressReporter for LogReporter {
    fn phase(&mut self, phase: DrcPhase) {
        info!("[DRC] {}", phase.label());
        self.phases.push(phase);
    }

    fn progress(&mut self, done: usize, total: usize) -> bool {
        debug!("[DRC]   {}/{}", done, total);
        !self.cancel.as_ref().is_some_and(|t| t.is_cancelled())
    }

    fn markers_added(&mut self, markers: &[Marker]) {
        if !markers.is_empty() {
            debug!("[DRC]   +{} markers", markers.len());
        }
    }
}
