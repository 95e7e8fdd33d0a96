use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use serde::Deserialize;

/// Queue slots per worker.
const BACKLOG_PER_WORKER: usize = 8;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub static_files: StaticFilesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub worker_count: usize,
    pub poll_interval_ms: u64,
    pub shutdown_timeout_secs: u64,
    pub read_chunk_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    pub root: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:9000".to_string(),
            worker_count: 16,
            poll_interval_ms: 1000,
            shutdown_timeout_secs: 30,
            read_chunk_size: 16_384,
        }
    }
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("www"),
        }
    }
}

impl ServerConfig {
    /// Connections that may wait for a worker before accepting blocks.
    pub fn queue_capacity(&self) -> usize {
        self.worker_count.saturating_mul(BACKLOG_PER_WORKER)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        self.listen_addr
            .parse()
            .with_context(|| format!("invalid listen address {:?}", self.listen_addr))
    }
}

impl Config {
    /// Loads configuration from the process environment.
    ///
    /// `WICKET_CONFIG` names an optional YAML file; `LISTEN` and `WORKERS`
    /// override the listen address and worker count.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(|key| std::env::var(key).ok())
    }

    /// Like [`Config::load`], reading variables through `lookup`.
    pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut cfg = match lookup("WICKET_CONFIG") {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Some(addr) = lookup("LISTEN") {
            cfg.server.listen_addr = addr;
        }
        if let Some(workers) = lookup("WORKERS") {
            cfg.server.worker_count = workers
                .parse()
                .with_context(|| format!("invalid WORKERS value {workers:?}"))?;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> anyhow::Result<Self> {
        let cfg: Config = serde_yaml::from_str(text).context("failed to parse config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.worker_count == 0 {
            bail!("worker_count must be at least 1");
        }
        // The capacity doubles as the listen backlog, which is a u32.
        let capacity = self.server.worker_count.checked_mul(BACKLOG_PER_WORKER);
        if capacity.is_none_or(|c| u32::try_from(c).is_err()) {
            bail!("worker_count {} is too large", self.server.worker_count);
        }
        if self.server.read_chunk_size == 0 {
            bail!("read_chunk_size must be at least 1");
        }
        self.server.socket_addr()?;
        Ok(())
    }
}
