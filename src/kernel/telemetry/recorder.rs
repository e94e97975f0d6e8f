use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use super::event::TelemetryEvent;
use super::metrics::{compute_snapshot, TelemetrySnapshot};

const MAX_EVENTS: usize = 10_000;

/// Bounded event log. Clones share the same buffer, so the session and its
/// inference task record into one place.
#[derive(Debug, Clone)]
pub struct TelemetryRecorder {
    buffer: Arc<Mutex<VecDeque<TelemetryEvent>>>,
}

impl Default for TelemetryRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryRecorder {
    pub fn new() -> Self {
        Self {
            buffer: Arc::new(Mutex::new(VecDeque::with_capacity(MAX_EVENTS))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<TelemetryEvent>> {
        // Poisoning is ignored; the buffer holds plain data.
        match self.buffer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn record(&self, event: TelemetryEvent) {
        let mut buffer = self.lock();
        if buffer.len() >= MAX_EVENTS {
            buffer.pop_front();
        }
        buffer.push_back(event);
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        compute_snapshot(&self.lock())
    }

    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.lock().iter().cloned().collect()
    }
}
