use thiserror::Error;

use super::session::{SessionPhase, UserAction};

/// Every failure the kernel can surface.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KernelError {
    /// The frame source could not produce a frame right now.
    #[error("Frame unavailable: {0}")]
    FrameUnavailable(String),

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Classifier has no examples yet")]
    NotTrained,

    /// A user action arrived in a phase that does not accept it.
    #[error("Action {action:?} is not valid in phase {phase:?}")]
    InvalidTransition {
        phase: SessionPhase,
        action: UserAction,
    },

    /// Camera/model setup (or configuration) failed; the session stays in `Init`.
    #[error("Setup failed: {0}")]
    SetupFailed(String),
}

impl KernelError {
    /// Contract violations. The inference loop stops on these instead of skipping the tick.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            KernelError::DimensionMismatch { .. } | KernelError::NotTrained
        )
    }
}

pub type KernelResult<T> = Result<T, KernelError>;
