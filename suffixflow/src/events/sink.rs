//! Event sink trait and implementations.

use super::{DispatchDecision, DispatchEvent};
use parking_lot::RwLock;
use tracing::{debug, error, info, warn, Level};

/// Trait for sinks receiving dispatch decisions.
///
/// Emission must never fail or block for long; it runs on the dispatch path.
pub trait EventSink: Send + Sync {
    /// Emits an event.
    fn emit(&self, event: DispatchEvent);
}

/// A no-op event sink that discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn emit(&self, _event: DispatchEvent) {}
}

/// An event sink that logs events using the tracing framework.
///
/// Run and skip decisions go out at the configured level; missing inputs
/// and halts are warnings, failures are errors.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    /// The log level for routine decisions.
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Creates a new logging event sink with the specified level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }
}

impl EventSink for LoggingEventSink {
    fn emit(&self, event: DispatchEvent) {
        let line = event.line();
        let sample = event.sample.as_deref().unwrap_or("");
        match event.decision {
            DispatchDecision::Run | DispatchDecision::Skip => {
                if self.level == Level::DEBUG {
                    debug!(stage = %event.stage, path = %event.path, sample = %sample, "{line}");
                } else {
                    info!(stage = %event.stage, path = %event.path, sample = %sample, "{line}");
                }
            }
            DispatchDecision::Missing | DispatchDecision::Halt => {
                warn!(stage = %event.stage, path = %event.path, sample = %sample, "{line}");
            }
            DispatchDecision::Failed => {
                error!(stage = %event.stage, path = %event.path, sample = %sample, "{line}");
            }
        }
    }
}

/// A collecting event sink for testing purposes.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: RwLock<Vec<DispatchEvent>>,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<DispatchEvent> {
        self.events.read().clone()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Clears all collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    /// Returns events with the given decision.
    #[must_use]
    pub fn events_of(&self, decision: DispatchDecision) -> Vec<DispatchEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.decision == decision)
            .cloned()
            .collect()
    }

    /// Returns the rendered lines of all collected events.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.events.read().iter().map(DispatchEvent::line).collect()
    }
}

impl EventSink for CollectingEventSink {
    fn emit(&self, event: DispatchEvent) {
        self.events.write().push(event);
    }
}
