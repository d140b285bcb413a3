//! Dispatch event reporting.
//!
//! Every dispatch decision (run, skip, missing requirement, failure, halt)
//! is emitted as a [`DispatchEvent`] to an [`EventSink`]. The default sink
//! writes one tracing line per decision; tests collect them instead.

mod event;
mod sink;

pub use event::{DispatchDecision, DispatchEvent};
pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
