//! oxlive entrypoint: a live task list rendered inline.
//!
//! Spawns N fake tasks, each owning a shared line that starts with the
//! spinner placeholder and ends with a tick or cross glyph. Tasks mutate
//! their line and ask for a render; the engine worker animates the spinner
//! on its own in between.
use anyhow::{Result, anyhow};
use clap::Parser;
use core_channel::LiveClient;
use core_config::load_from;
use core_render::{Content, LogicalLine, PLACEHOLDER, STYLED_CROSS, STYLED_TICK, SharedLine};
use core_terminal::CrosstermBackend;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

const LOG_FILE: &str = "oxlive.log";

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "oxlive", version, about = "Inline live terminal renderer demo")]
struct Args {
    /// Optional configuration file path (overrides discovery of `oxlive.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Number of concurrent fake tasks.
    #[arg(long = "tasks", default_value_t = 4)]
    pub tasks: usize,
    /// Spinner interval in milliseconds (overrides the configured value).
    #[arg(long = "ticks-ms")]
    pub ticks_ms: Option<u64>,
    /// Erase the output on exit instead of leaving it on screen.
    #[arg(long = "erase")]
    pub erase: bool,
}

fn configure_logging() -> Option<WorkerGuard> {
    let log_dir = Path::new(".");
    let log_path = log_dir.join(LOG_FILE);
    if log_path.exists() {
        let _ = std::fs::remove_file(&log_path);
    }

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_ansi(false)
        .with_writer(nb_writer)
        .try_init()
    {
        Ok(_) => Some(guard),
        // Global subscriber already installed; dropping the guard shuts the writer down.
        Err(_) => None,
    }
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

fn running_line(idx: usize) -> LogicalLine {
    LogicalLine::new(format!("{PLACEHOLDER} task {} running", idx + 1)).with_indent(2)
}

fn finished_text(idx: usize, ok: bool, took: Duration) -> String {
    let glyph = if ok { STYLED_TICK } else { STYLED_CROSS };
    let verdict = if ok { "done" } else { "failed" };
    format!("{glyph} task {} {verdict} ({}ms)", idx + 1, took.as_millis())
}

/// Simulated work time; staggered so tasks finish one by one.
fn work_time(idx: usize) -> Duration {
    Duration::from_millis(600 + 450 * idx as u64)
}

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = configure_logging();
    install_panic_hook();
    info!(target: "runtime", "startup");

    let args = Args::parse();
    let config = load_from(args.config.clone())?;
    let mut options = config.start_options();
    if let Some(ms) = args.ticks_ms {
        options.update_frequency = Duration::from_millis(ms);
    }

    let client = Arc::new(
        LiveClient::spawn(Box::new(CrosstermBackend::new()))?.with_timeout(config.request_timeout()),
    );
    if !client.start(options).await {
        return Err(anyhow!(
            "failed to start session: {}",
            client.last_error().unwrap_or_default()
        ));
    }

    let lines: Vec<SharedLine> = (0..args.tasks).map(|i| SharedLine::new(running_line(i))).collect();
    let mut content = Content::from(format!("Running {} tasks", args.tasks));
    for line in &lines {
        content.push(line);
    }
    if !client.update(content.clone()).await {
        warn!(target: "runtime", error = ?client.last_error(), "update_failed");
    }

    let started = Instant::now();
    let mut handles = Vec::with_capacity(lines.len());
    for (idx, line) in lines.iter().cloned().enumerate() {
        let client = Arc::clone(&client);
        handles.push(tokio::spawn(async move {
            tokio::time::sleep(work_time(idx)).await;
            let ok = idx % 4 != 3;
            line.set_text(finished_text(idx, ok, started.elapsed()));
            client.force_render(false).await
        }));
    }
    for handle in handles {
        if let Err(e) = handle.await {
            warn!(target: "runtime", error = %e, "task_join_failed");
        }
    }

    // Re-submitting the same sources re-evaluates spinner eligibility.
    if !client.update(content).await {
        warn!(target: "runtime", error = ?client.last_error(), "update_failed");
    }
    let commit = !args.erase;
    if !client.stop(commit).await {
        warn!(target: "runtime", error = ?client.last_error(), "stop_failed");
    }
    if commit {
        println!();
    }
    info!(
        target: "runtime.shutdown",
        last_render_ns = core_render::timing::last_render_ns(),
        "shutdown"
    );
    Ok(())
}
