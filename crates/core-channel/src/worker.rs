//! Engine worker: the single execution context owning the terminal.
//!
//! Commands are processed one at a time in arrival order. The loop selects
//! between the command receiver and the spinner tick receiver, so a tick can
//! only run between two commands, never inside one.
//!
//! Faults never leave the worker: an `Err` from the engine or a panic while
//! executing a command becomes an error `Response` for that command id.
//!
//! Exit paths:
//! - `Destroy`: commit any active session, then exit without answering;
//! - command channel disconnected (caller dropped): same, so the terminal
//!   is always restored before the process goes away.

use anyhow::Result;
use core_events::{Command, ENGINE_FAULTS, Envelope, Payload, Response, bump};
use core_render::RenderEngine;
use crossbeam_channel::{Receiver, Sender, select};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, info, warn};

enum Step {
    Command(Envelope),
    Tick,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitReason {
    Destroyed,
    ChannelClosed,
}

impl ExitReason {
    fn as_str(self) -> &'static str {
        match self {
            ExitReason::Destroyed => "destroyed",
            ExitReason::ChannelClosed => "channel_closed",
        }
    }
}

/// Drive `engine` until destroyed or the caller goes away.
pub fn run(mut engine: RenderEngine, commands: Receiver<Envelope>, responses: Sender<Response>) {
    info!(target: "channel.worker", "engine_worker_started");
    let reason = loop {
        let ticks = engine.spinner_ticks();
        let step = select! {
            recv(commands) -> msg => match msg {
                Ok(envelope) => Step::Command(envelope),
                Err(_) => Step::Closed,
            },
            recv(ticks) -> _ => Step::Tick,
        };
        match step {
            Step::Closed => break ExitReason::ChannelClosed,
            Step::Command(envelope) if matches!(envelope.command, Command::Destroy) => {
                break ExitReason::Destroyed;
            }
            Step::Command(envelope) => {
                let response = dispatch(&mut engine, envelope);
                if responses.send(response).is_err() {
                    debug!(target: "channel.worker", "response_receiver_gone");
                }
            }
            Step::Tick => {
                if let Err(e) = guarded(|| engine.tick()) {
                    bump(&ENGINE_FAULTS);
                    warn!(target: "channel.worker", error = %e, "spinner_tick_failed");
                }
            }
        }
    };

    if let Err(e) = guarded(|| engine.stop(true)) {
        warn!(target: "channel.worker", error = %e, "final_stop_failed");
    }
    info!(target: "channel.worker", reason = reason.as_str(), "engine_worker_stopped");
}

/// Execute one command and build its response.
pub fn dispatch(engine: &mut RenderEngine, envelope: Envelope) -> Response {
    let Envelope { id, command } = envelope;
    let name = command.name();
    debug!(target: "channel.worker", %id, command = name, "dispatch");
    match guarded(|| execute(engine, command)) {
        Ok(Payload::Ack(done)) => Response::ack(id, done),
        Ok(Payload::Lines(lines)) => Response::lines(id, lines),
        Err(e) => {
            bump(&ENGINE_FAULTS);
            warn!(target: "channel.worker", %id, command = name, error = %e, "command_failed");
            Response::error(id, format!("{name}: {e}"))
        }
    }
}

fn execute(engine: &mut RenderEngine, command: Command) -> Result<Payload> {
    let payload = match command {
        Command::Start(options) => Payload::Ack(engine.start(options)?),
        Command::Stop { commit } => Payload::Ack(engine.stop(commit)?),
        Command::Update(content) => Payload::Ack(engine.update(content)?),
        Command::Append(content) => Payload::Ack(engine.append(content)?),
        Command::Render { force } => Payload::Ack(engine.force_render(force)?),
        Command::QueryLines => Payload::Lines(engine.get_lines()),
        // Handled by the loop before dispatch.
        Command::Destroy => Payload::Ack(true),
    };
    Ok(payload)
}

/// Run `f`, folding both its error and any panic into a displayable error.
fn guarded<T>(f: impl FnOnce() -> Result<T>) -> Result<T, String> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(format!("{e:#}")),
        Err(payload) => Err(format!("panicked: {}", panic_detail(payload.as_ref()))),
    }
}

fn panic_detail(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
