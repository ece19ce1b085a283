//! Engine command protocol: typed commands, correlated responses.
//!
//! Every request sent to the engine worker is an `Envelope` carrying a fresh
//! `CorrelationId`; the worker answers with at most one `Response` echoing the
//! same id. `Destroy` is the only command that never gets an answer.

use core_render::{Content, LogicalLine, StartOptions};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

// -------------------------------------------------------------------------------------------------
// Channel Policy
// -------------------------------------------------------------------------------------------------
// Commands travel over a bounded channel sized by `COMMAND_CHANNEL_CAP`. The caller side sends with
// `try_send` semantics from async code and reports a full queue as a failed call rather than
// blocking the runtime. Responses use an unbounded channel: the worker must never stall on a slow
// caller while it owns the terminal.
// -------------------------------------------------------------------------------------------------
pub const COMMAND_CHANNEL_CAP: usize = 1024;

// -------------------------------------------------------------------------------------------------
// Telemetry
// -------------------------------------------------------------------------------------------------
pub static COMMANDS_SENT: AtomicU64 = AtomicU64::new(0);
pub static COMMAND_SEND_FAILURES: AtomicU64 = AtomicU64::new(0);
pub static RESPONSES_UNMATCHED: AtomicU64 = AtomicU64::new(0);
pub static COMMAND_TIMEOUTS: AtomicU64 = AtomicU64::new(0);
pub static ENGINE_FAULTS: AtomicU64 = AtomicU64::new(0);

pub fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

/// Identifier pairing a request with its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CorrelationId(pub u64);

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic id source; one per client.
#[derive(Debug, Default)]
pub struct IdGenerator(AtomicU64);

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> CorrelationId {
        CorrelationId(self.0.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

#[derive(Debug, Clone)]
pub enum Command {
    Start(StartOptions),
    Stop { commit: bool },
    /// Terminate the worker. Fire-and-forget.
    Destroy,
    Update(Content),
    Append(Content),
    Render { force: bool },
    QueryLines,
}

impl Command {
    /// Short stable name for logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Start(_) => "start",
            Command::Stop { .. } => "stop",
            Command::Destroy => "destroy",
            Command::Update(_) => "update",
            Command::Append(_) => "append",
            Command::Render { .. } => "render",
            Command::QueryLines => "query_lines",
        }
    }

    pub fn expects_response(&self) -> bool {
        !matches!(self, Command::Destroy)
    }
}

#[derive(Debug, Clone)]
pub struct Envelope {
    pub id: CorrelationId,
    pub command: Command,
}

impl Envelope {
    pub fn new(id: CorrelationId, command: Command) -> Self {
        Self { id, command }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Ok,
    /// The command faulted inside the engine; carries the fault detail.
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Outcome of a state-changing command (false = no-op, e.g. not started).
    Ack(bool),
    Lines(Vec<LogicalLine>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub id: CorrelationId,
    pub status: Status,
    pub payload: Payload,
}

impl Response {
    pub fn ack(id: CorrelationId, done: bool) -> Self {
        Self {
            id,
            status: Status::Ok,
            payload: Payload::Ack(done),
        }
    }

    pub fn lines(id: CorrelationId, lines: Vec<LogicalLine>) -> Self {
        Self {
            id,
            status: Status::Ok,
            payload: Payload::Lines(lines),
        }
    }

    pub fn error(id: CorrelationId, detail: impl Into<String>) -> Self {
        Self {
            id,
            status: Status::Error(detail.into()),
            payload: Payload::Ack(false),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}
