use std::path::Path;
use std::time::Duration;

use tokio::process::Command;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Audible alert. `play` is fire-and-forget; the returned receiver resolves
/// exactly once, when the cue has finished (or could not be played).
/// Must be called from inside a tokio runtime.
pub trait AlertCue: Send + Sync {
    fn play(&self) -> oneshot::Receiver<()>;
}

/// Plays the cue through an external player process, e.g. `paplay alert.wav`
/// or `afplay alert.mp3`. Completion is the process exiting.
pub struct CommandCue {
    program: String,
    args: Vec<String>,
}

impl CommandCue {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl AlertCue for CommandCue {
    fn play(&self) -> oneshot::Receiver<()> {
        let (done_tx, done_rx) = oneshot::channel();

        match Command::new(&self.program)
            .args(&self.args)
            .kill_on_drop(true)
            .spawn()
        {
            Ok(mut child) => {
                let program = self.program.clone();
                tokio::spawn(async move {
                    match child.wait().await {
                        Ok(status) => debug!("Cue player '{}' exited: {}", program, status),
                        Err(e) => warn!("Cue player '{}' wait failed: {}", program, e),
                    }
                    let _ = done_tx.send(());
                });
            }
            Err(e) => {
                // Nothing is playing, so the cooldown ends now.
                warn!("Failed to spawn cue player '{}': {}", self.program, e);
                let _ = done_tx.send(());
            }
        }

        done_rx
    }
}

/// Silent stand-in that just waits for the length of the cue.
pub struct TimedCue {
    duration: Duration,
}

impl TimedCue {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    /// Takes the duration from a WAV file's header.
    pub fn from_wav(path: impl AsRef<Path>) -> Result<Self, hound::Error> {
        let reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        let frames = reader.duration() as u64;
        let millis = frames * 1000 / spec.sample_rate.max(1) as u64;
        Ok(Self::new(Duration::from_millis(millis)))
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl AlertCue for TimedCue {
    fn play(&self) -> oneshot::Receiver<()> {
        let (done_tx, done_rx) = oneshot::channel();
        let duration = self.duration;
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let _ = done_tx.send(());
        });
        done_rx
    }
}
