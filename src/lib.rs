pub mod config;
pub mod kernel;
pub mod outputs;
pub mod vision;

// Re-export specific items for convenient access
pub use config::SessionConfig;
pub use kernel::session::{Session, SessionPhase, UserAction};
