//! Daemon runtime: serialized renderer worker plus sync, health,
//! evaluation, capture, and socket-server tasks.
//!
//! The renderer surface is a shared, exclusively-mutating resource —
//! navigation changes what a concurrent capture would observe — so every
//! renderer interaction is a job on one worker queue. All other timers run
//! as independent tasks and enqueue their renderer-touching work.

use std::fs;
use std::io::ErrorKind;
use std::os::unix::net::UnixStream as StdUnixStream;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Datelike, Local, SecondsFormat, Timelike, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};
use tokio::time::MissedTickBehavior;

use inkframe_capture::CaptureGate;
use inkframe_core::types::{DisplayConfig, TimeOfDay};
use inkframe_core::Settings;
use inkframe_renderer::{Frame, Renderer, RendererError};
use inkframe_scheduler::{
    eligible_screens, select_screen, PresenceLookup, SchedulerState, TickClock,
};

use crate::error::{io_err, DaemonError};
use crate::paths::{
    run_dir, socket_path, CAPTURE_INTERVAL, DAEMON_LABEL, FALLBACK_RECHECK_INTERVAL,
    HEALTH_PING_INTERVAL, RENDERER_JOB_TIMEOUT, SYNC_RETRY_BACKOFF,
};
use crate::protocol::{DaemonRequest, DaemonResponse};
use crate::remote::{ConfigClient, FetchError, HealthClient, PresenceClient};

/// The currently adopted configuration; `None` until the first successful
/// sync.
pub type SharedConfig = Arc<RwLock<Option<DisplayConfig>>>;

/// Mutable runtime facts surfaced through the control socket.
#[derive(Debug, Default)]
pub struct StatusState {
    pub last_sync_at: Option<DateTime<Utc>>,
    pub active_url: Option<String>,
    pub frames_saved: u64,
    pub last_saved_at: Option<DateTime<Utc>>,
}

pub type SharedStatus = Arc<RwLock<StatusState>>;

// ---------------------------------------------------------------------------
// Renderer worker
// ---------------------------------------------------------------------------

enum RendererJob {
    Navigate {
        url: String,
        respond_to: oneshot::Sender<Result<(), RendererError>>,
    },
    Capture {
        respond_to: oneshot::Sender<Result<Frame, RendererError>>,
    },
}

/// Owns the engine and executes jobs one at a time via `spawn_blocking`.
async fn renderer_worker_task(
    engine: Box<dyn Renderer + Send>,
    mut job_rx: mpsc::Receiver<RendererJob>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    let mut slot = Some(engine);
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            maybe_job = job_rx.recv() => {
                let Some(job) = maybe_job else { break };
                let Some(engine) = slot.take() else {
                    return Err(DaemonError::Protocol("renderer engine lost".to_string()));
                };
                let engine = match job {
                    RendererJob::Navigate { url, respond_to } => {
                        let (engine, result) = tokio::task::spawn_blocking(move || {
                            let mut engine = engine;
                            let result = engine.navigate(&url);
                            if result.is_ok() {
                                // Best effort; a failed auto-fill never
                                // aborts the tick.
                                if let Err(err) = engine.run_login_hook() {
                                    tracing::warn!(error = %err, "login hook failed");
                                }
                            }
                            (engine, result)
                        })
                        .await
                        .map_err(|err| {
                            DaemonError::Protocol(format!("renderer task join error: {err}"))
                        })?;
                        let _ = respond_to.send(result);
                        engine
                    }
                    RendererJob::Capture { respond_to } => {
                        let (engine, result) = tokio::task::spawn_blocking(move || {
                            let mut engine = engine;
                            let result = engine.capture_frame();
                            (engine, result)
                        })
                        .await
                        .map_err(|err| {
                            DaemonError::Protocol(format!("renderer task join error: {err}"))
                        })?;
                        let _ = respond_to.send(result);
                        engine
                    }
                };
                slot = Some(engine);
            }
        }
    }
    Ok(())
}

async fn request_navigate(
    jobs: &mpsc::Sender<RendererJob>,
    url: &str,
) -> Result<(), DaemonError> {
    let (tx, rx) = oneshot::channel();
    jobs.send(RendererJob::Navigate {
        url: url.to_owned(),
        respond_to: tx,
    })
    .await
    .map_err(|_| DaemonError::ChannelClosed("renderer jobs"))?;

    match tokio::time::timeout(RENDERER_JOB_TIMEOUT, rx).await {
        Err(_) => Err(DaemonError::Protocol(format!(
            "navigation to {url} timed out"
        ))),
        Ok(Err(_)) => Err(DaemonError::ChannelClosed("navigate response")),
        Ok(Ok(result)) => result.map_err(DaemonError::Renderer),
    }
}

async fn request_frame(jobs: &mpsc::Sender<RendererJob>) -> Result<Frame, DaemonError> {
    let (tx, rx) = oneshot::channel();
    jobs.send(RendererJob::Capture { respond_to: tx })
        .await
        .map_err(|_| DaemonError::ChannelClosed("renderer jobs"))?;

    match tokio::time::timeout(RENDERER_JOB_TIMEOUT, rx).await {
        Err(_) => Err(DaemonError::Protocol("frame capture timed out".to_string())),
        Ok(Err(_)) => Err(DaemonError::ChannelClosed("capture response")),
        Ok(Ok(result)) => result.map_err(DaemonError::Renderer),
    }
}

// ---------------------------------------------------------------------------
// Config synchronizer
// ---------------------------------------------------------------------------

/// Install a fetch outcome. Returns the delay before the next attempt and
/// whether a new config was adopted. A failed fetch leaves the previously
/// installed config untouched.
async fn apply_sync_result(
    config: &SharedConfig,
    status: &SharedStatus,
    result: Result<DisplayConfig, FetchError>,
) -> (Duration, bool) {
    match result {
        Ok(new_config) => {
            let refresh = new_config.refresh_interval();
            tracing::info!(
                screens = new_config.screens.len(),
                refresh_minutes = new_config.refresh_interval_minutes,
                "config synced"
            );
            *config.write().await = Some(new_config);
            status.write().await.last_sync_at = Some(Utc::now());
            (refresh, true)
        }
        Err(err) => {
            tracing::warn!(error = %err, "config fetch failed; keeping previous config");
            (SYNC_RETRY_BACKOFF, false)
        }
    }
}

async fn config_sync_task(
    client: Option<ConfigClient>,
    health: Option<Arc<HealthClient>>,
    config: SharedConfig,
    status: SharedStatus,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    let Some(client) = client else {
        tracing::info!("no config endpoint configured; staying on the fallback URL");
        let _ = shutdown_rx.recv().await;
        return Ok(());
    };
    let client = Arc::new(client);

    loop {
        let fetch = {
            let client = client.clone();
            tokio::task::spawn_blocking(move || client.fetch())
                .await
                .map_err(|err| DaemonError::Protocol(format!("config fetch join error: {err}")))?
        };

        let (delay, synced) = apply_sync_result(&config, &status, fetch).await;

        if synced {
            if let Some(health) = &health {
                let last_sync = status.read().await.last_sync_at;
                ping_health(health.clone(), last_sync).await;
            }
        }

        tokio::select! {
            _ = shutdown_rx.recv() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Health reporter
// ---------------------------------------------------------------------------

async fn ping_health(client: Arc<HealthClient>, last_sync: Option<DateTime<Utc>>) {
    let result = tokio::task::spawn_blocking(move || client.ping(last_sync)).await;
    match result {
        Ok(Ok(())) => tracing::debug!("health ping ok"),
        Ok(Err(err)) => tracing::warn!(error = %err, "health ping failed"),
        Err(err) => tracing::warn!(error = %err, "health ping join error"),
    }
}

async fn health_task(
    client: Option<Arc<HealthClient>>,
    status: SharedStatus,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    let Some(client) = client else {
        tracing::info!("no health endpoint configured; skipping liveness pings");
        let _ = shutdown_rx.recv().await;
        return Ok(());
    };

    let mut interval = tokio::time::interval(HEALTH_PING_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // Consume the immediate tick; the first ping follows the first sync.
    interval.tick().await;

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            _ = interval.tick() => {
                let last_sync = status.read().await.last_sync_at;
                ping_health(client.clone(), last_sync).await;
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Evaluation loop
// ---------------------------------------------------------------------------

fn local_time_of_day() -> TimeOfDay {
    let now = Local::now();
    TimeOfDay::new(now.hour() as u8, now.minute() as u8).unwrap_or(TimeOfDay::MIDNIGHT)
}

async fn evaluation_task(
    config: SharedConfig,
    status: SharedStatus,
    presence: Arc<dyn PresenceLookup + Send + Sync>,
    fallback_url: String,
    jobs: mpsc::Sender<RendererJob>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    let mut state = SchedulerState::new();
    let mut rng = StdRng::from_entropy();

    loop {
        let snapshot = config.read().await.clone();
        let delay = match &snapshot {
            Some(config) => config.conditions_check_interval(),
            None => FALLBACK_RECHECK_INTERVAL,
        };

        let target = match snapshot {
            // Never synced: show the fallback page, no rotation logic.
            None => Some(fallback_url.clone()),
            Some(snapshot) => {
                let eligible = {
                    let presence = presence.clone();
                    let config_for_eval = snapshot.clone();
                    let today = Local::now().weekday();
                    tokio::task::spawn_blocking(move || {
                        eligible_screens(&config_for_eval, &*presence, today)
                    })
                    .await
                    .map_err(|err| {
                        DaemonError::Protocol(format!("condition evaluation join error: {err}"))
                    })?
                };
                let clock = TickClock {
                    now_ms: Utc::now().timestamp_millis(),
                    time_of_day: local_time_of_day(),
                };
                select_screen(&snapshot, &eligible, clock, &mut state, &mut rng)
                    .map(|screen| screen.url.clone())
            }
        };

        if let Some(url) = target {
            if state.needs_navigation(&url) {
                tracing::info!(url = %url, "switching screen");
                // Recorded before the attempt so a persistently failing
                // page is not retried every tick.
                state.record_navigation(&url);
                status.write().await.active_url = Some(url.clone());
                if let Err(err) = request_navigate(&jobs, &url).await {
                    tracing::warn!(error = %err, "navigation failed; keeping previous content");
                }
            }
        }

        tokio::select! {
            _ = shutdown_rx.recv() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Capture loop
// ---------------------------------------------------------------------------

async fn capture_task(
    gate: CaptureGate,
    status: SharedStatus,
    jobs: mpsc::Sender<RendererJob>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    let mut interval = tokio::time::interval(CAPTURE_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut slot = Some(gate);

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            _ = interval.tick() => {
                let frame = match request_frame(&jobs).await {
                    Ok(frame) => frame,
                    Err(err) => {
                        tracing::warn!(error = %err, "frame capture failed");
                        continue;
                    }
                };

                let Some(gate) = slot.take() else {
                    return Err(DaemonError::Protocol("capture gate lost".to_string()));
                };
                let (gate, outcome) = tokio::task::spawn_blocking(move || {
                    let mut gate = gate;
                    let outcome = gate.offer(&frame);
                    (gate, outcome)
                })
                .await
                .map_err(|err| DaemonError::Protocol(format!("capture join error: {err}")))?;

                match outcome {
                    Ok(outcome) if outcome.saved() => {
                        let mut status = status.write().await;
                        status.frames_saved = gate.frames_saved();
                        status.last_saved_at = gate.last_saved_at();
                    }
                    Ok(_) => {}
                    Err(err) => {
                        tracing::warn!(error = %err, "frame persistence failed; will retry next tick");
                    }
                }
                slot = Some(gate);
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Control socket
// ---------------------------------------------------------------------------

async fn socket_server_task(
    home: PathBuf,
    config: SharedConfig,
    status: SharedStatus,
    shutdown_tx: broadcast::Sender<()>,
    mut shutdown_rx: broadcast::Receiver<()>,
    started_at_unix: u64,
) -> Result<(), DaemonError> {
    let run = run_dir(&home);
    if !run.exists() {
        fs::create_dir_all(&run).map_err(|e| io_err(&run, e))?;
    }

    let socket = socket_path(&home);
    prepare_socket_for_bind(&socket)?;

    let listener = UnixListener::bind(&socket).map_err(|e| io_err(&socket, e))?;
    set_socket_permissions(&socket)?;

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            accepted = listener.accept() => {
                let (stream, _) = accepted.map_err(|e| io_err(&socket, e))?;
                let config = config.clone();
                let status = status.clone();
                let shutdown_tx = shutdown_tx.clone();
                tokio::spawn(async move {
                    if let Err(err) = handle_socket_client(
                        stream,
                        config,
                        status,
                        shutdown_tx,
                        started_at_unix,
                    ).await {
                        tracing::error!(error = %err, "socket client error");
                    }
                });
            }
        }
    }

    if socket.exists() {
        let _ = fs::remove_file(&socket);
    }
    Ok(())
}

async fn handle_socket_client(
    stream: UnixStream,
    config: SharedConfig,
    status: SharedStatus,
    shutdown_tx: broadcast::Sender<()>,
    started_at_unix: u64,
) -> Result<(), DaemonError> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| io_err("daemon socket read", e))?
    {
        if line.trim().is_empty() {
            continue;
        }

        let request: Result<DaemonRequest, _> = serde_json::from_str(&line);
        let request = match request {
            Ok(request) => request,
            Err(err) => {
                write_response(
                    &mut writer,
                    &DaemonResponse::error(format!("invalid request JSON: {err}")),
                )
                .await?;
                continue;
            }
        };

        let response = match request.cmd.as_str() {
            "status" => {
                let payload =
                    build_status_payload(config.clone(), status.clone(), started_at_unix).await;
                DaemonResponse::ok(payload)
            }
            "stop" => {
                let _ = shutdown_tx.send(());
                DaemonResponse::ok(json!({ "stopping": true }))
            }
            other => DaemonResponse::error(format!("unknown command '{other}'")),
        };

        write_response(&mut writer, &response).await?;
        if request.cmd == "stop" {
            break;
        }
    }

    Ok(())
}

async fn build_status_payload(
    config: SharedConfig,
    status: SharedStatus,
    started_at_unix: u64,
) -> Value {
    // Snapshot the config shape (read lock, dropped immediately).
    let screens: Option<usize> = {
        let config = config.read().await;
        config.as_ref().map(|c| c.screens.len())
    };

    let (last_sync_at, active_url, frames_saved, last_saved_at) = {
        let status = status.read().await;
        (
            status.last_sync_at,
            status.active_url.clone(),
            status.frames_saved,
            status.last_saved_at,
        )
    };

    json!({
        "running": true,
        "label": DAEMON_LABEL,
        "started_at_unix": started_at_unix,
        "synced": screens.is_some(),
        "screens": screens,
        "last_sync_at": last_sync_at.map(|ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true)),
        "active_url": active_url,
        "frames_saved": frames_saved,
        "last_saved_at": last_saved_at.map(|ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true)),
    })
}

// ---------------------------------------------------------------------------
// Runtime entry
// ---------------------------------------------------------------------------

/// Start the daemon runtime and block the current thread until it exits.
pub fn start_blocking(
    home: &Path,
    settings: Settings,
    engine: Box<dyn Renderer + Send>,
) -> Result<(), DaemonError> {
    init_tracing();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(home.to_path_buf(), settings, engine))
}

/// Run the daemon runtime.
pub async fn run(
    home: PathBuf,
    settings: Settings,
    engine: Box<dyn Renderer + Send>,
) -> Result<(), DaemonError> {
    ensure_runtime_dirs(&home)?;

    let config: SharedConfig = Arc::new(RwLock::new(None));
    let status: SharedStatus = Arc::new(RwLock::new(StatusState::default()));
    let started_at_unix = unix_seconds_now();

    let config_client = settings
        .config_url
        .as_ref()
        .map(|url| ConfigClient::new(url.clone(), settings.http_timeout));
    let health_client = settings
        .health_url
        .as_ref()
        .map(|url| Arc::new(HealthClient::new(url.clone(), settings.http_timeout)));
    let presence: Arc<dyn PresenceLookup + Send + Sync> = Arc::new(PresenceClient::new(
        settings.presence_url.clone(),
        settings.presence_token.clone(),
        settings.http_timeout,
    ));
    let gate = CaptureGate::new(settings.output_path.clone());

    let (job_tx, job_rx) = mpsc::channel::<RendererJob>(16);
    let (shutdown_tx, _) = broadcast::channel::<()>(16);

    let renderer_handle = {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            let result = renderer_worker_task(engine, job_rx, shutdown.subscribe()).await;
            let _ = shutdown.send(());
            result
        })
    };

    let sync_handle = {
        let shutdown = shutdown_tx.clone();
        let health = health_client.clone();
        let config = config.clone();
        let status = status.clone();
        tokio::spawn(async move {
            let result =
                config_sync_task(config_client, health, config, status, shutdown.subscribe())
                    .await;
            let _ = shutdown.send(());
            result
        })
    };

    let health_handle = {
        let shutdown = shutdown_tx.clone();
        let status = status.clone();
        tokio::spawn(async move {
            let result = health_task(health_client, status, shutdown.subscribe()).await;
            let _ = shutdown.send(());
            result
        })
    };

    let evaluation_handle = {
        let shutdown = shutdown_tx.clone();
        let config = config.clone();
        let status = status.clone();
        let jobs = job_tx.clone();
        let fallback = settings.fallback_url.clone();
        tokio::spawn(async move {
            let result =
                evaluation_task(config, status, presence, fallback, jobs, shutdown.subscribe())
                    .await;
            let _ = shutdown.send(());
            result
        })
    };

    let capture_handle = {
        let shutdown = shutdown_tx.clone();
        let status = status.clone();
        let jobs = job_tx.clone();
        tokio::spawn(async move {
            let result = capture_task(gate, status, jobs, shutdown.subscribe()).await;
            let _ = shutdown.send(());
            result
        })
    };

    let socket_handle = {
        let shutdown = shutdown_tx.clone();
        let home = home.clone();
        let config = config.clone();
        let status = status.clone();
        tokio::spawn(async move {
            let result = socket_server_task(
                home,
                config,
                status,
                shutdown.clone(),
                shutdown.subscribe(),
                started_at_unix,
            )
            .await;
            let _ = shutdown.send(());
            result
        })
    };

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            let mut shutdown_rx = shutdown.subscribe();
            tokio::select! {
                _ = shutdown_rx.recv() => Ok(()),
                signal = tokio::signal::ctrl_c() => {
                    match signal {
                        Ok(()) => {
                            tracing::info!("received ctrl-c, shutting down daemon");
                            let _ = shutdown.send(());
                            Ok(())
                        }
                        Err(err) => Err(DaemonError::Protocol(format!("ctrl-c handler failed: {err}"))),
                    }
                }
            }
        })
    };

    let (
        renderer_result,
        sync_result,
        health_result,
        evaluation_result,
        capture_result,
        socket_result,
        signal_result,
    ) = tokio::join!(
        renderer_handle,
        sync_handle,
        health_handle,
        evaluation_handle,
        capture_handle,
        socket_handle,
        signal_handle
    );

    handle_join("renderer_worker", renderer_result)?;
    handle_join("config_sync", sync_result)?;
    handle_join("health", health_result)?;
    handle_join("evaluation", evaluation_result)?;
    handle_join("capture", capture_result)?;
    handle_join("socket_server", socket_result)?;
    handle_join("signal_handler", signal_result)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn prepare_socket_for_bind(socket: &Path) -> Result<(), DaemonError> {
    if !socket.exists() {
        return Ok(());
    }

    match StdUnixStream::connect(socket) {
        Ok(_) => {
            return Err(DaemonError::Protocol(format!(
                "daemon socket already in use: {}",
                socket.display()
            )));
        }
        Err(err) => {
            tracing::warn!(
                socket = %socket.display(),
                error = %err,
                "removing stale daemon socket before bind",
            );
        }
    }

    match fs::remove_file(socket) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(io_err(socket, err)),
    }
}

fn ensure_runtime_dirs(home: &Path) -> Result<(), DaemonError> {
    let run = run_dir(home);
    if !run.exists() {
        fs::create_dir_all(&run).map_err(|e| io_err(&run, e))?;
    }
    Ok(())
}

async fn write_response(
    writer: &mut OwnedWriteHalf,
    response: &DaemonResponse,
) -> Result<(), DaemonError> {
    let payload = serde_json::to_string(response)?;
    writer
        .write_all(payload.as_bytes())
        .await
        .map_err(|e| io_err("daemon socket write", e))?;
    writer
        .write_all(b"\n")
        .await
        .map_err(|e| io_err("daemon socket write", e))?;
    writer
        .flush()
        .await
        .map_err(|e| io_err("daemon socket flush", e))?;
    Ok(())
}

fn handle_join(
    task: &str,
    result: Result<Result<(), DaemonError>, tokio::task::JoinError>,
) -> Result<(), DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(DaemonError::Protocol(format!(
            "{task} task join failure: {err}"
        ))),
    }
}

fn unix_seconds_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

#[cfg(unix)]
fn set_socket_permissions(path: &Path) -> Result<(), DaemonError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| io_err(path, e))
}

#[cfg(not(unix))]
fn set_socket_permissions(_path: &Path) -> Result<(), DaemonError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use inkframe_core::types::ScreenSpec;
    use inkframe_renderer::TestCardRenderer;

    fn config_with_screens(urls: &[&str]) -> DisplayConfig {
        DisplayConfig {
            screens: urls
                .iter()
                .map(|url| ScreenSpec {
                    url: url.to_string(),
                    duration_minutes: Some(1),
                    start_time: None,
                    end_time: None,
                    conditions: vec![],
                    force_show_if_conditions_match: false,
                })
                .collect(),
            ..DisplayConfig::default()
        }
    }

    // ─── Config synchronizer ───────────────────────────────────────────────

    #[tokio::test]
    async fn successful_sync_installs_config_and_uses_its_refresh_interval() {
        let config: SharedConfig = Arc::new(RwLock::new(None));
        let status: SharedStatus = Arc::new(RwLock::new(StatusState::default()));

        let fetched = DisplayConfig {
            refresh_interval_minutes: 45,
            ..config_with_screens(&["http://a"])
        };
        let (delay, synced) = apply_sync_result(&config, &status, Ok(fetched.clone())).await;

        assert!(synced);
        assert_eq!(delay, Duration::from_secs(45 * 60));
        assert_eq!(config.read().await.as_ref(), Some(&fetched));
        assert!(status.read().await.last_sync_at.is_some());
    }

    #[tokio::test]
    async fn failed_sync_keeps_previous_config_and_backs_off_sixty_seconds() {
        let installed = config_with_screens(&["http://a", "http://b"]);
        let config: SharedConfig = Arc::new(RwLock::new(Some(installed.clone())));
        let status: SharedStatus = Arc::new(RwLock::new(StatusState::default()));

        let failure = Err(FetchError::Decode(std::io::Error::other("bad document")));
        let (delay, synced) = apply_sync_result(&config, &status, failure).await;

        assert!(!synced);
        assert_eq!(delay, SYNC_RETRY_BACKOFF);
        assert_eq!(
            config.read().await.as_ref(),
            Some(&installed),
            "a failed fetch must leave the installed config untouched"
        );
        assert!(
            status.read().await.last_sync_at.is_none(),
            "a failed fetch must not count as a sync"
        );
    }

    // ─── Renderer worker ───────────────────────────────────────────────────

    #[tokio::test]
    async fn renderer_worker_serializes_navigate_and_capture() {
        let (job_tx, job_rx) = mpsc::channel(16);
        let (shutdown_tx, _) = broadcast::channel(4);
        let worker = tokio::spawn(renderer_worker_task(
            Box::new(TestCardRenderer::new(80, 48)),
            job_rx,
            shutdown_tx.subscribe(),
        ));

        request_navigate(&job_tx, "http://dash.test/a")
            .await
            .expect("navigate");
        let frame_a = request_frame(&job_tx).await.expect("frame a");
        let again = request_frame(&job_tx).await.expect("frame a again");
        assert_eq!(frame_a, again, "same page must capture identically");

        request_navigate(&job_tx, "http://dash.test/b")
            .await
            .expect("navigate");
        let frame_b = request_frame(&job_tx).await.expect("frame b");
        assert_ne!(frame_a, frame_b, "capture must observe the navigation");

        let decoded = image::load_from_memory(frame_b.bytes()).expect("decode");
        assert_eq!((decoded.width(), decoded.height()), (80, 48));

        let _ = shutdown_tx.send(());
        worker.await.expect("join").expect("worker");
    }

    #[tokio::test]
    async fn renderer_worker_reports_navigation_errors() {
        let (job_tx, job_rx) = mpsc::channel(16);
        let (shutdown_tx, _) = broadcast::channel(4);
        let worker = tokio::spawn(renderer_worker_task(
            Box::new(TestCardRenderer::default()),
            job_rx,
            shutdown_tx.subscribe(),
        ));

        let err = request_navigate(&job_tx, "").await.expect_err("empty URL");
        assert!(matches!(err, DaemonError::Renderer(_)));

        // The worker survives a failed job.
        request_navigate(&job_tx, "http://dash.test/a")
            .await
            .expect("navigate after failure");

        let _ = shutdown_tx.send(());
        worker.await.expect("join").expect("worker");
    }

    // ─── Status payload ────────────────────────────────────────────────────

    #[tokio::test]
    async fn status_payload_before_first_sync() {
        let config: SharedConfig = Arc::new(RwLock::new(None));
        let status: SharedStatus = Arc::new(RwLock::new(StatusState::default()));

        let payload = build_status_payload(config, status, 1_000_000).await;

        assert_eq!(payload["running"], json!(true));
        assert_eq!(payload["started_at_unix"], json!(1_000_000u64));
        assert_eq!(payload["synced"], json!(false));
        assert_eq!(payload["last_sync_at"], Value::Null);
        assert_eq!(payload["frames_saved"], json!(0u64));
    }

    #[tokio::test]
    async fn status_payload_reflects_runtime_state() {
        let config: SharedConfig =
            Arc::new(RwLock::new(Some(config_with_screens(&["http://a", "http://b"]))));
        let status: SharedStatus = Arc::new(RwLock::new(StatusState {
            last_sync_at: Some(Utc::now()),
            active_url: Some("http://a".into()),
            frames_saved: 12,
            last_saved_at: Some(Utc::now()),
        }));

        let payload = build_status_payload(config, status, 1_000_000).await;

        assert_eq!(payload["synced"], json!(true));
        assert_eq!(payload["screens"], json!(2));
        assert_eq!(payload["active_url"], json!("http://a"));
        assert_eq!(payload["frames_saved"], json!(12u64));
        assert!(payload["last_sync_at"].is_string());
    }
}
