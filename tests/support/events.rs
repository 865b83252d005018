//! Event recorder capturing emitted events for assertions.

use gatecheck::engine::event::{EventLevel, EventRecorder};
use parking_lot::Mutex;

/// One captured event: run name, level, reason, message.
pub type CapturedEvent = (String, EventLevel, String, String);

#[derive(Default)]
pub struct RecordingEvents {
    seen: Mutex<Vec<CapturedEvent>>,
}

impl RecordingEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn captured(&self) -> Vec<CapturedEvent> {
        self.seen.lock().clone()
    }

    pub fn reasons(&self) -> Vec<String> {
        self.seen.lock().iter().map(|e| e.2.clone()).collect()
    }
}

impl EventRecorder for RecordingEvents {
    fn record(&self, run_name: &str, level: EventLevel, reason: &str, message: &str) {
        self.seen
            .lock()
            .push((run_name.into(), level, reason.into(), message.into()));
    }
}
