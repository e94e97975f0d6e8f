use serde::{Deserialize, Serialize};

use crate::kernel::event::Label;
use crate::kernel::session::SessionPhase;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TelemetryEvent {
    PhaseTransition {
        from: SessionPhase,
        to: SessionPhase,
    },

    TrainingCompleted {
        label: Label,
        examples: usize,
    },

    TrainingAborted {
        label: Label,
        collected: usize,
    },

    InferenceTick {
        touched: bool,
    },

    /// A tick lost to a transient failure (no frame).
    TickSkipped,

    AlertFired,

    CueFinished,
}
