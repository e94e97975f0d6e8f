use std::collections::VecDeque;

use serde::Serialize;

use super::event::TelemetryEvent;
use crate::kernel::event::Label;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    pub phase_transitions: u64,
    pub training: TrainingStats,
    pub inference: InferenceStats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrainingStats {
    pub not_touched_examples: u64,
    pub touched_examples: u64,
    pub aborted_phases: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InferenceStats {
    pub ticks: u64,
    pub touched_ticks: u64,
    pub skipped_ticks: u64,
    pub alerts: u64,
    pub cues_finished: u64,
    pub touched_ratio: f64,
}

pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();

    for event in events {
        match event {
            TelemetryEvent::PhaseTransition { .. } => snap.phase_transitions += 1,
            TelemetryEvent::TrainingCompleted { label, examples } => match label {
                Label::NotTouched => snap.training.not_touched_examples += *examples as u64,
                Label::Touched => snap.training.touched_examples += *examples as u64,
            },
            TelemetryEvent::TrainingAborted { .. } => snap.training.aborted_phases += 1,
            TelemetryEvent::InferenceTick { touched } => {
                snap.inference.ticks += 1;
                if *touched {
                    snap.inference.touched_ticks += 1;
                }
            }
            TelemetryEvent::TickSkipped => snap.inference.skipped_ticks += 1,
            TelemetryEvent::AlertFired => snap.inference.alerts += 1,
            TelemetryEvent::CueFinished => snap.inference.cues_finished += 1,
        }
    }

    if snap.inference.ticks > 0 {
        snap.inference.touched_ratio =
            snap.inference.touched_ticks as f64 / snap.inference.ticks as f64;
    }

    snap
}
