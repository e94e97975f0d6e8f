//! Session telemetry.
//!
//! Telemetry is a read-only side-effect layer: no decision in the kernel
//! reads it. Events carry labels, phases and counts only, never frames or
//! embeddings.

pub mod event;
pub mod metrics;
pub mod recorder;

pub use event::TelemetryEvent;
pub use metrics::TelemetrySnapshot;
pub use recorder::TelemetryRecorder;
