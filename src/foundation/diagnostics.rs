//! Pluggable diagnostic sink.
//!
//! Engine code reports notable conditions (failed passes, degraded tiles, cache misses that
//! had to fall back) through [`emit`]. The default sink forwards to `tracing`; applications
//! can install their own with [`set_sink`].

use std::sync::{Arc, Mutex, RwLock};

/// Diagnostic severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Informational.
    Info,
    /// Recoverable problem; the result is still produced.
    Warning,
    /// A pass failed.
    Error,
}

/// One diagnostic event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity of the event.
    pub severity: Severity,
    /// Emitting component (algorithm name, `"smp"`, `"raycast"`, ...).
    pub source: String,
    /// Human-readable message.
    pub message: String,
}

/// Receiver of diagnostics.
pub trait DiagnosticSink: Send + Sync {
    /// Handle one diagnostic. Must not block for long; called from the invoking thread.
    fn emit(&self, diagnostic: &Diagnostic);
}

/// Default sink: forwards to `tracing` at the matching level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, d: &Diagnostic) {
        match d.severity {
            Severity::Info => tracing::info!(source = %d.source, "{}", d.message),
            Severity::Warning => tracing::warn!(source = %d.source, "{}", d.message),
            Severity::Error => tracing::error!(source = %d.source, "{}", d.message),
        }
    }
}

/// Sink that records everything it receives.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    /// New empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded diagnostics.
    pub fn events(&self) -> Vec<Diagnostic> {
        self.events
            .lock()
            .map(|g| g.clone())
            .unwrap_or_default()
    }

    /// Recorded diagnostics of at least `min` severity.
    pub fn count_at_least(&self, min: Severity) -> usize {
        self.events().iter().filter(|d| d.severity >= min).count()
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&self, d: &Diagnostic) {
        if let Ok(mut g) = self.events.lock() {
            g.push(d.clone());
        }
    }
}

static SINK: RwLock<Option<Arc<dyn DiagnosticSink>>> = RwLock::new(None);

/// Install a process-wide sink, replacing the previous one.
pub fn set_sink(sink: Arc<dyn DiagnosticSink>) {
    if let Ok(mut g) = SINK.write() {
        *g = Some(sink);
    }
}

/// Restore the default [`TracingSink`].
pub fn reset_sink() {
    if let Ok(mut g) = SINK.write() {
        *g = None;
    }
}

/// Emit a diagnostic to the installed sink.
pub fn emit(severity: Severity, source: &str, message: impl Into<String>) {
    let d = Diagnostic {
        severity,
        source: source.to_owned(),
        message: message.into(),
    };
    let sink = SINK.read().ok().and_then(|g| g.clone());
    match sink {
        Some(s) => s.emit(&d),
        None => TracingSink.emit(&d),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/diagnostics.rs"]
mod tests;
