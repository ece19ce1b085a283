//! Caller-side adapter over the engine worker.
//!
//! Each call allocates a `CorrelationId`, registers a oneshot sender under it
//! in the pending map, enqueues the command and awaits whichever comes first:
//! the matching response (delivered by the router thread) or the timeout.
//! A timed out entry is removed from the map, so a late response finds no
//! listener and is dropped by the router.
//!
//! Public operations never return errors. Failures resolve to `false` (or an
//! empty list) and record a message readable through `last_error`.

use crate::error::ChannelError;
use crate::worker;
use core_events::{
    COMMAND_CHANNEL_CAP, COMMAND_SEND_FAILURES, COMMAND_TIMEOUTS, COMMANDS_SENT, Command,
    CorrelationId, Envelope, IdGenerator, Payload, RESPONSES_UNMATCHED, Response, Status, bump,
};
use core_render::{Content, LogicalLine, RenderEngine, StartOptions};
use core_terminal::TerminalBackend;
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded, unbounded};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

type Pending = Arc<Mutex<HashMap<CorrelationId, oneshot::Sender<Response>>>>;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct LiveClient {
    /// `None` once destroyed.
    commands: Option<Sender<Envelope>>,
    ids: IdGenerator,
    pending: Pending,
    timeout: Duration,
    last_error: Mutex<Option<String>>,
    worker: Option<JoinHandle<()>>,
    router: Option<JoinHandle<()>>,
}

impl LiveClient {
    /// Spawn an engine worker rendering to `backend`.
    pub fn spawn(backend: Box<dyn TerminalBackend>) -> Result<Self, ChannelError> {
        Self::spawn_with(move |commands, responses| {
            worker::run(RenderEngine::new(backend), commands, responses)
        })
    }

    /// Spawn a client over an arbitrary worker body.
    pub fn spawn_with<F>(body: F) -> Result<Self, ChannelError>
    where
        F: FnOnce(Receiver<Envelope>, Sender<Response>) + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = bounded(COMMAND_CHANNEL_CAP);
        let (resp_tx, resp_rx) = unbounded();
        let worker = thread::Builder::new()
            .name("oxlive-engine".into())
            .spawn(move || body(cmd_rx, resp_tx))
            .map_err(ChannelError::Spawn)?;

        let pending: Pending = Arc::default();
        let router = thread::Builder::new()
            .name("oxlive-router".into())
            .spawn({
                let pending = Arc::clone(&pending);
                move || route(resp_rx, pending)
            })
            .map_err(ChannelError::Spawn)?;

        info!(target: "channel.client", "client_spawned");
        Ok(Self {
            commands: Some(cmd_tx),
            ids: IdGenerator::new(),
            pending,
            timeout: DEFAULT_TIMEOUT,
            last_error: Mutex::new(None),
            worker: Some(worker),
            router: Some(router),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Most recent failure description, if any call has failed.
    pub fn last_error(&self) -> Option<String> {
        lock(&self.last_error).clone()
    }

    pub fn is_running(&self) -> bool {
        self.commands.is_some()
    }

    pub async fn start(&self, options: StartOptions) -> bool {
        self.ack(Command::Start(options), "session already active").await
    }

    pub async fn stop(&self, commit: bool) -> bool {
        self.ack(Command::Stop { commit }, "session not started").await
    }

    pub async fn update(&self, content: impl Into<Content>) -> bool {
        self.ack(Command::Update(content.into()), "session not started").await
    }

    pub async fn append(&self, content: impl Into<Content>) -> bool {
        self.ack(Command::Append(content.into()), "session not started").await
    }

    pub async fn force_render(&self, force: bool) -> bool {
        self.ack(Command::Render { force }, "session not started").await
    }

    /// Current next-frame lines; empty on failure.
    pub async fn get_render_queue(&self) -> Vec<LogicalLine> {
        match self.request(Command::QueryLines).await {
            Ok(Payload::Lines(lines)) => lines,
            Ok(Payload::Ack(_)) => Vec::new(),
            Err(e) => {
                self.record("query_lines", &e);
                Vec::new()
            }
        }
    }

    /// Ask the worker to terminate. Fire-and-forget: never waits for a reply
    /// and treats an already closed channel as success.
    pub fn destroy(&mut self) -> bool {
        let Some(commands) = self.commands.take() else {
            self.record("destroy", &ChannelError::NotRunning);
            return false;
        };
        let id = self.ids.next_id();
        if commands.try_send(Envelope::new(id, Command::Destroy)).is_err() {
            debug!(target: "channel.client", %id, "destroy_channel_already_closed");
        }
        info!(target: "channel.client", "destroy_sent");
        true
    }

    async fn ack(&self, command: Command, noop: &str) -> bool {
        let name = command.name();
        match self.request(command).await {
            Ok(Payload::Ack(true)) => true,
            Ok(_) => {
                *lock(&self.last_error) = Some(format!("{name}: {noop}"));
                false
            }
            Err(e) => {
                self.record(name, &e);
                false
            }
        }
    }

    async fn request(&self, command: Command) -> Result<Payload, ChannelError> {
        let Some(commands) = self.commands.as_ref() else {
            return Err(ChannelError::NotRunning);
        };
        let name = command.name();
        let id = self.ids.next_id();
        let (tx, rx) = oneshot::channel();
        lock(&self.pending).insert(id, tx);

        if let Err(e) = commands.try_send(Envelope::new(id, command)) {
            lock(&self.pending).remove(&id);
            bump(&COMMAND_SEND_FAILURES);
            return Err(match e {
                TrySendError::Full(_) => ChannelError::QueueFull,
                TrySendError::Disconnected(_) => ChannelError::Disconnected,
            });
        }
        bump(&COMMANDS_SENT);

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(response)) => match response.status {
                Status::Ok => Ok(response.payload),
                Status::Error(detail) => Err(ChannelError::Engine(detail)),
            },
            Ok(Err(_)) => Err(ChannelError::Disconnected),
            Err(_) => {
                lock(&self.pending).remove(&id);
                bump(&COMMAND_TIMEOUTS);
                Err(ChannelError::Timeout {
                    command: name,
                    after: self.timeout,
                })
            }
        }
    }

    fn record(&self, command: &str, err: &ChannelError) {
        warn!(target: "channel.client", command, error = %err, "call_failed");
        *lock(&self.last_error) = Some(err.to_string());
    }
}

impl Drop for LiveClient {
    fn drop(&mut self) {
        if self.commands.is_some() {
            self.destroy();
        }
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            warn!(target: "channel.client", "engine_worker_panicked");
        }
        if let Some(router) = self.router.take() {
            let _ = router.join();
        }
    }
}

/// Deliver responses to their waiting callers until the worker hangs up.
fn route(responses: Receiver<Response>, pending: Pending) {
    for response in responses.iter() {
        let waiter = lock(&pending).remove(&response.id);
        match waiter {
            Some(tx) => {
                if tx.send(response).is_err() {
                    debug!(target: "channel.client", "waiter_dropped");
                }
            }
            None => {
                bump(&RESPONSES_UNMATCHED);
                debug!(target: "channel.client", id = %response.id, "unmatched_response_dropped");
            }
        }
    }
    lock(&pending).clear();
}
