use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::kernel::event::UiEvent;

/// Receives phase changes, progress, the touched flag and status text.
/// Purely observational; must not block.
pub trait UiSink: Send + Sync {
    fn publish(&self, event: UiEvent);
}

impl UiSink for mpsc::Sender<UiEvent> {
    fn publish(&self, event: UiEvent) {
        // A slow renderer loses updates rather than stalling the kernel.
        if let Err(e) = self.try_send(event) {
            debug!("UI update dropped: {}", e);
        }
    }
}

/// Renders the session into the log.
pub struct LogUi;

impl UiSink for LogUi {
    fn publish(&self, event: UiEvent) {
        match event {
            UiEvent::Status(text) => info!("[UI] {}", text),
            UiEvent::Phase(phase) => info!("[UI] Phase -> {:?}", phase),
            UiEvent::Progress(p) => debug!("[UI] {:?} {}%", p.label, p.percent()),
            UiEvent::Touched(touched) => debug!("[UI] touched={}", touched),
        }
    }
}
