use std::path::PathBuf;
use std::time::Duration;

use crate::cf::service::DEFAULT_SERVICE_KEY_NAME;
use crate::tunnel::port_waiter::DEFAULT_POLL_INTERVAL;

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the cf CLI's `.cf/config.json`.
    pub cf_home: PathBuf,
    pub cf_binary: String,
    /// Name of the service key issued for every database instance.
    pub service_key_name: String,
    pub http_timeout: Duration,
    /// Retries for transient HTTP failures. Applied by the transport only.
    pub http_retries: u32,
    /// Fixed backoff between connection attempts while waiting for a tunnel.
    pub port_poll_interval: Duration,
    /// Upper bound on tunnel readiness. `None` waits forever.
    pub tunnel_timeout: Option<Duration>,
    /// Set via CF_TRACE. Logs every control-plane request and response.
    pub trace_requests: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cf_home: dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")),
            cf_binary: "cf".into(),
            service_key_name: DEFAULT_SERVICE_KEY_NAME.into(),
            http_timeout: Duration::from_secs(30),
            http_retries: 2,
            port_poll_interval: DEFAULT_POLL_INTERVAL,
            tunnel_timeout: None,
            trace_requests: false,
        }
    }
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let defaults = Config::default();

    let cf_home = match std::env::var("CF_HOME") {
        Ok(home) if !home.is_empty() => PathBuf::from(home),
        _ => match dirs::home_dir() {
            Some(home) => home,
            None => anyhow::bail!("unable to determine home directory, set CF_HOME"),
        },
    };

    Ok(Config {
        cf_home,
        cf_binary: non_empty(std::env::var("CF_MYSQL_CF_BINARY").ok())
            .unwrap_or(defaults.cf_binary),
        service_key_name: non_empty(std::env::var("CF_MYSQL_SERVICE_KEY_NAME").ok())
            .unwrap_or(defaults.service_key_name),
        http_timeout: std::env::var("CF_MYSQL_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.http_timeout),
        http_retries: std::env::var("CF_MYSQL_HTTP_RETRIES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.http_retries),
        port_poll_interval: std::env::var("CF_MYSQL_PORT_POLL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.port_poll_interval),
        tunnel_timeout: std::env::var("CF_MYSQL_TUNNEL_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs),
        trace_requests: trace_enabled(std::env::var("CF_TRACE").ok().as_deref()),
    })
}

/// An exported but empty variable counts as unset.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// cf CLI semantics: any value except "false" turns tracing on. A path value
/// would redirect the trace to a file there; we always log to stderr.
fn trace_enabled(value: Option<&str>) -> bool {
    match value {
        None | Some("") => false,
        Some(v) => !v.eq_ignore_ascii_case("false"),
    }
}
