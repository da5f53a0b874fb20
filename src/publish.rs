//! Observability sink.
//!
//! The clock reports position and state changes through a sink trait,
//! so an embedder can forward them to a UI, OSC, or a log without the
//! clock knowing about any of those. Publishing is fire-and-forget and
//! never fails.

use crate::clock::RunState;
use crate::signature::TimeSignature;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;

/// One published state change.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum StatusEvent {
    /// The measure counter after a rollover (or a republish).
    Measure(u64),
    /// The beat position after a non-rollover tick (or a republish).
    Beat(f64),
    /// The active time signature changed.
    Signature(TimeSignature),
    /// The clock started or stopped.
    Run(RunState),
}

/// Receiver for published state changes.
pub trait StatusSink {
    fn publish(&self, event: StatusEvent);
}

/// Discards everything. The default when an embedder has no observer.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl StatusSink for NullSink {
    fn publish(&self, _event: StatusEvent) {}
}

/// Records every event in publish order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: RefCell<Vec<StatusEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything published so far.
    pub fn events(&self) -> Vec<StatusEvent> {
        self.events.borrow().clone()
    }

    /// Drain the recorded events.
    pub fn take(&self) -> Vec<StatusEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    /// Just the measure numbers, in publish order.
    pub fn measures(&self) -> Vec<u64> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                StatusEvent::Measure(m) => Some(*m),
                _ => None,
            })
            .collect()
    }
}

impl StatusSink for MemorySink {
    fn publish(&self, event: StatusEvent) {
        self.events.borrow_mut().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_records_in_order() {
        let sink = MemorySink::new();
        sink.publish(StatusEvent::Run(RunState::Running));
        sink.publish(StatusEvent::Beat(1.5));
        sink.publish(StatusEvent::Measure(2));

        assert_eq!(
            sink.events(),
            vec![
                StatusEvent::Run(RunState::Running),
                StatusEvent::Beat(1.5),
                StatusEvent::Measure(2),
            ]
        );

        assert_eq!(sink.measures(), vec![2]);

        sink.take();
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_status_event_serialization() {
        let json = serde_json::to_string(&StatusEvent::Signature(TimeSignature::SevenEight))
            .unwrap();
        assert_eq!(json, r#"{"Signature":"7/8"}"#);

        let back: StatusEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, StatusEvent::Signature(TimeSignature::SevenEight));

        let json = serde_json::to_string(&StatusEvent::Measure(17)).unwrap();
        let back: StatusEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, StatusEvent::Measure(17));
    }
}
