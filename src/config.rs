use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::kernel::error::{KernelError, KernelResult};

/// Tunables for one session. Every field has a default, so a config file
/// only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Examples collected per training phase.
    pub examples_per_phase: usize,
    pub training_interval_ms: u64,
    pub inference_interval_ms: u64,
    /// Strict: a touch needs confidence above this.
    pub touch_threshold: f32,
    /// k of the nearest-neighbour vote.
    pub neighbors: usize,
    pub notification_cooldown_ms: u64,
    pub notification_title: String,
    pub notification_body: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            examples_per_phase: 50,
            training_interval_ms: 100,
            inference_interval_ms: 200,
            touch_threshold: 0.8,
            neighbors: 3,
            notification_cooldown_ms: 3000,
            notification_title: "Hands off!".to_string(),
            notification_body: "You just touched your face!".to_string(),
        }
    }
}

impl SessionConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: SessionConfig = serde_json::from_str(&raw)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> KernelResult<()> {
        if self.examples_per_phase == 0 {
            return Err(KernelError::SetupFailed("examples_per_phase must be > 0".into()));
        }
        if self.neighbors == 0 {
            return Err(KernelError::SetupFailed("neighbors must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.touch_threshold) {
            return Err(KernelError::SetupFailed(format!(
                "touch_threshold {} outside [0, 1]",
                self.touch_threshold
            )));
        }
        Ok(())
    }

    pub fn training_interval(&self) -> Duration {
        Duration::from_millis(self.training_interval_ms)
    }

    pub fn inference_interval(&self) -> Duration {
        Duration::from_millis(self.inference_interval_ms)
    }

    pub fn notification_cooldown(&self) -> Duration {
        Duration::from_millis(self.notification_cooldown_ms)
    }
}
