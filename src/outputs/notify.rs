use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::process::Command;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Desktop notification. Fire-and-forget.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str);
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn notify(&self, title: &str, body: &str) {
        (**self).notify(title, body)
    }
}

pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, body: &str) {
        info!("[NOTIFY] {}: {}", title, body);
    }
}

/// Shells out to a notifier binary with `title body` appended to its args
/// (`notify-send` on Linux by default).
pub struct CommandNotifier {
    program: String,
    args: Vec<String>,
}

impl CommandNotifier {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl Default for CommandNotifier {
    fn default() -> Self {
        Self::new("notify-send", Vec::new())
    }
}

impl Notifier for CommandNotifier {
    fn notify(&self, title: &str, body: &str) {
        match Command::new(&self.program)
            .args(&self.args)
            .arg(title)
            .arg(body)
            .spawn()
        {
            Ok(mut child) => {
                // Reap in the background.
                tokio::spawn(async move {
                    let _ = child.wait().await;
                });
            }
            Err(e) => warn!("Failed to spawn notifier '{}': {}", self.program, e),
        }
    }
}

/// Drops notifications that arrive within `cooldown` of the last delivered one.
pub struct ThrottledNotifier<N> {
    inner: N,
    cooldown: Duration,
    last_sent: Mutex<Option<Instant>>,
}

impl<N: Notifier> ThrottledNotifier<N> {
    pub fn new(inner: N, cooldown: Duration) -> Self {
        Self {
            inner,
            cooldown,
            last_sent: Mutex::new(None),
        }
    }
}

impl<N: Notifier> Notifier for ThrottledNotifier<N> {
    fn notify(&self, title: &str, body: &str) {
        let now = Instant::now();
        {
            // Poisoning is ignored; the guard holds a plain timestamp.
            let mut last_sent = match self.last_sent.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Some(prev) = *last_sent {
                if now.duration_since(prev) < self.cooldown {
                    debug!("Notification suppressed (cooldown)");
                    return;
                }
            }
            *last_sent = Some(now);
        }
        self.inner.notify(title, body);
    }
}
