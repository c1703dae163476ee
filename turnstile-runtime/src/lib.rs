// Time source for the actor
pub mod clock;

// Runtime errors
pub mod error;

// Coordinator actor and its handle
pub mod runtime;

// Action sinks backed by channels
pub mod sink;

// Re-exports for convenience
pub use clock::SessionClock;
pub use error::{Result, RuntimeError};
pub use runtime::{SessionClient, SessionCommand, SessionHandle, SessionRuntime, TurnSnapshot};
pub use sink::ChannelSink;
