//! Asynchronous command channel in front of the render engine.
//!
//! The engine lives on a dedicated thread (`worker`) and owns the terminal.
//! Callers talk to it through `LiveClient`, whose async operations resolve
//! on the matching response or on timeout, whichever comes first.

pub mod client;
pub mod error;
pub mod worker;

pub use client::{DEFAULT_TIMEOUT, LiveClient};
pub use error::ChannelError;
