mod config;
mod coordinator;

pub use config::{ConfigError, TurnConfig};
pub use coordinator::{TurnCoordinator, TurnError, TurnPhase};
