//! HTTP clients for the external endpoints: config fetch, health ping,
//! presence lookups.
//!
//! Every client carries its own `ureq` agent with a hard timeout, so a
//! hung endpoint can never stall a daemon loop past the deadline. All
//! calls are blocking and run under `spawn_blocking` from the runtime.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use thiserror::Error;
use ureq::{Agent, AgentBuilder};

use inkframe_core::types::DisplayConfig;
use inkframe_scheduler::{LookupError, PresenceLookup};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// All errors that can arise fetching the display configuration.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failure or non-success HTTP status.
    #[error("config fetch failed: {0}")]
    Http(#[source] Box<ureq::Error>),

    /// The endpoint answered but the body is not a valid config document.
    #[error("invalid config document: {0}")]
    Decode(#[source] std::io::Error),
}

/// All errors that can arise pinging the health endpoint.
#[derive(Debug, Error)]
pub enum PingError {
    #[error("health ping failed: {0}")]
    Http(#[source] Box<ureq::Error>),
}

// ---------------------------------------------------------------------------
// Config endpoint
// ---------------------------------------------------------------------------

/// Client for the remote configuration document.
pub struct ConfigClient {
    agent: Agent,
    url: String,
}

impl ConfigClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            agent: agent_with_timeout(timeout),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch and decode the current [`DisplayConfig`].
    pub fn fetch(&self) -> Result<DisplayConfig, FetchError> {
        let response = self
            .agent
            .get(&self.url)
            .call()
            .map_err(|e| FetchError::Http(Box::new(e)))?;
        response
            .into_json::<DisplayConfig>()
            .map_err(FetchError::Decode)
    }
}

// ---------------------------------------------------------------------------
// Health endpoint
// ---------------------------------------------------------------------------

/// Client for the liveness endpoint.
pub struct HealthClient {
    agent: Agent,
    url: String,
}

impl HealthClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            agent: agent_with_timeout(timeout),
            url: url.into(),
        }
    }

    /// Announce liveness, carrying the last successful sync time if any.
    /// The response body is ignored beyond success/failure.
    pub fn ping(&self, last_sync: Option<DateTime<Utc>>) -> Result<(), PingError> {
        let url = health_url_with_timestamp(&self.url, last_sync);
        self.agent
            .get(&url)
            .call()
            .map_err(|e| PingError::Http(Box::new(e)))?;
        Ok(())
    }
}

/// Append `lastupdated=<RFC 3339>` to `base`, respecting any query string
/// already present.
pub fn health_url_with_timestamp(base: &str, last_sync: Option<DateTime<Utc>>) -> String {
    match last_sync {
        None => base.to_owned(),
        Some(ts) => {
            let separator = if base.contains('?') { '&' } else { '?' };
            let stamp = ts.to_rfc3339_opts(SecondsFormat::Secs, true);
            format!(
                "{base}{separator}lastupdated={}",
                encode_query_component(&stamp)
            )
        }
    }
}

fn encode_query_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Presence endpoint
// ---------------------------------------------------------------------------

/// Presence lookups against a Home-Assistant-style states API.
pub struct PresenceClient {
    agent: Agent,
    base_url: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StateDocument {
    state: String,
}

impl PresenceClient {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            agent: agent_with_timeout(timeout),
            base_url: base_url.into(),
            token,
        }
    }
}

impl PresenceLookup for PresenceClient {
    fn state_of(&self, entity: &str) -> Result<String, LookupError> {
        let Some(token) = &self.token else {
            return Err(LookupError::MissingCredential);
        };

        let url = format!("{}/api/states/{entity}", self.base_url.trim_end_matches('/'));
        let response = self
            .agent
            .get(&url)
            .set("Authorization", &format!("Bearer {token}"))
            .call()
            .map_err(|e| LookupError::Lookup(e.to_string()))?;
        let doc: StateDocument = response
            .into_json()
            .map_err(|e| LookupError::Lookup(e.to_string()))?;
        Ok(doc.state)
    }
}

fn agent_with_timeout(timeout: Duration) -> Agent {
    AgentBuilder::new().timeout(timeout).build()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
