use anyhow::{bail, Context, Result};
use graphruntime::RuntimeConfig;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Server settings, read from the environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    pub projects_dir: PathBuf,
    /// Idle time after which the log stream sends a keep-alive comment
    pub log_keepalive: Duration,
    /// Age after which a submitted but unattached run is dropped
    pub session_ttl: Duration,
    pub event_buffer_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            projects_dir: PathBuf::from("projects"),
            log_keepalive: Duration::from_secs(15),
            session_ttl: Duration::from_secs(600),
            event_buffer_size: RuntimeConfig::default().event_buffer_size,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            bind_address: lookup("BIND_ADDRESS").unwrap_or(defaults.bind_address),
            projects_dir: lookup("PROJECTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.projects_dir),
            log_keepalive: parse_positive(&lookup, "LOG_KEEPALIVE_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.log_keepalive),
            session_ttl: parse(&lookup, "SESSION_TTL_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.session_ttl),
            event_buffer_size: parse_positive(&lookup, "EVENT_BUFFER_SIZE")?
                .unwrap_or(defaults.event_buffer_size),
        })
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            event_buffer_size: self.event_buffer_size,
            session_ttl: self.session_ttl,
            ..RuntimeConfig::default()
        }
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("invalid {}: {:?}", key, raw))
        })
        .transpose()
}

/// Like `parse`, but zero is rejected
fn parse_positive<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr + Default + PartialEq,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = parse::<T>(lookup, key)?;
    if value.as_ref().is_some_and(|v| *v == T::default()) {
        bail!("{} must be at least 1", key);
    }
    Ok(value)
}
