use std::time::Duration;
use thiserror::Error;

/// Caller-side failures of the engine channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The engine thread could not be created.
    #[error("failed to spawn engine thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// No engine context exists (never started or already destroyed).
    #[error("engine is not running")]
    NotRunning,

    #[error("engine command queue is full")]
    QueueFull,

    #[error("engine channel disconnected")]
    Disconnected,

    #[error("{command} timed out after {}ms", .after.as_millis())]
    Timeout {
        command: &'static str,
        after: Duration,
    },

    /// The command faulted inside the engine.
    #[error("engine error: {0}")]
    Engine(String),
}
