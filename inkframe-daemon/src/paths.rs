use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DAEMON_LABEL: &str = "dev.inkframe.daemon";
pub const DAEMON_SOCKET: &str = "daemon.sock";

/// Fixed cadence of the frame capture loop.
pub const CAPTURE_INTERVAL: Duration = Duration::from_secs(1);

/// Fixed cadence of the liveness ping timer.
pub const HEALTH_PING_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Retry delay after a failed config fetch.
pub const SYNC_RETRY_BACKOFF: Duration = Duration::from_secs(60);

/// Re-evaluation cadence while no configuration has ever been fetched.
pub const FALLBACK_RECHECK_INTERVAL: Duration = Duration::from_secs(5);

/// Hard ceiling on any single renderer job (navigate or capture).
pub const RENDERER_JOB_TIMEOUT: Duration = Duration::from_secs(30);

pub fn inkframe_root(home: &Path) -> PathBuf {
    home.join(".inkframe")
}

pub fn run_dir(home: &Path) -> PathBuf {
    inkframe_root(home).join("run")
}

pub fn socket_path(home: &Path) -> PathBuf {
    run_dir(home).join(DAEMON_SOCKET)
}
