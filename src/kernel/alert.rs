use serde::{Deserialize, Serialize};
use tracing::info;

use super::event::Verdict;

/// Debounce state. `Cooldown` lasts until the alert cue reports it finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AlertState {
    #[default]
    Armed,
    Cooldown,
}

/// What the driver must do after a verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertEffect {
    PlayCue,
    Notify { title: String, body: String },
    SetTouched(bool),
}

pub struct AlertController {
    state: AlertState,
    last_verdict: Option<Verdict>,
    title: String,
    body: String,
}

impl AlertController {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            state: AlertState::Armed,
            last_verdict: None,
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn state(&self) -> AlertState {
        self.state
    }

    pub fn last_verdict(&self) -> Option<Verdict> {
        self.last_verdict
    }

    /// Pure step: verdict in, effects out.
    /// Only `Armed + Touched` fires; the UI flag follows every verdict.
    pub fn on_verdict(&mut self, verdict: Verdict) -> Vec<AlertEffect> {
        self.last_verdict = Some(verdict);

        match (self.state, verdict) {
            (AlertState::Armed, Verdict::Touched) => {
                info!("Touch detected, alert fired");
                self.state = AlertState::Cooldown;
                vec![
                    AlertEffect::PlayCue,
                    AlertEffect::Notify {
                        title: self.title.clone(),
                        body: self.body.clone(),
                    },
                    AlertEffect::SetTouched(true),
                ]
            }
            (AlertState::Cooldown, Verdict::Touched) => vec![AlertEffect::SetTouched(true)],
            (_, Verdict::NotTouched) => vec![AlertEffect::SetTouched(false)],
        }
    }

    /// The cue's completion event. Re-arms regardless of the current verdict.
    pub fn on_cue_finished(&mut self) {
        if self.state == AlertState::Cooldown {
            info!("Alert cue finished, re-armed");
        }
        self.state = AlertState::Armed;
    }
}
