pub mod alert;
pub mod classifier;
pub mod error;
pub mod event;
pub mod inference;
pub mod session;
pub mod telemetry;
pub mod training;

pub use error::{KernelError, KernelResult};
pub use event::{Embedding, Example, Label, Prediction, TrainingProgress, UiEvent, Verdict};
pub use session::{PhaseGraph, Session, SessionPhase, UserAction};
