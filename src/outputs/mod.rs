pub mod cue;
pub mod notify;
pub mod ui;

pub use cue::{AlertCue, CommandCue, TimedCue};
pub use notify::{CommandNotifier, LogNotifier, Notifier, ThrottledNotifier};
pub use ui::{LogUi, UiSink};

use std::sync::Arc;

/// Everything the kernel pushes out of the process.
#[derive(Clone)]
pub struct Outputs {
    pub cue: Arc<dyn AlertCue>,
    pub notifier: Arc<dyn Notifier>,
    pub ui: Arc<dyn UiSink>,
}

impl Outputs {
    pub fn new(cue: Arc<dyn AlertCue>, notifier: Arc<dyn Notifier>, ui: Arc<dyn UiSink>) -> Self {
        Self { cue, notifier, ui }
    }
}
