//! Inkframe daemon runtime: serialized renderer worker plus config sync,
//! health ping, screen evaluation, frame capture, and control-socket tasks.

mod error;
pub mod paths;
pub mod protocol;
pub mod remote;
mod runtime;

pub use error::DaemonError;
pub use protocol::{
    request_status, request_stop, send_request, DaemonRequest, DaemonResponse,
};
pub use remote::{ConfigClient, FetchError, HealthClient, PingError, PresenceClient};
pub use runtime::{run, start_blocking, SharedConfig, SharedStatus, StatusState};
