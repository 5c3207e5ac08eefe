//! ==============================================================================
//! config.rs - Runtime Configuration Loader
//! ==============================================================================
//!
//! purpose:
//!     defines the schema for `monitor.toml`.
//!     loads configuration from file or falls back to defaults.
//!     command line / environment overrides are applied on top by main.rs.
//!
//! structure:
//!     - UpstreamConfig: Where the temperature service lives, request timeout.
//!     - ServerConfig: Where the dashboard is served.
//!     - DashboardConfig: Page behaviour (auto refresh).
//!     - LoggingConfig: Default log level.
//!
//! ==============================================================================

use anyhow::{bail, Context};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MonitorConfig {
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    /// 0 disables the meta refresh
    pub refresh_seconds: u64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

impl MonitorConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        Self::parse(&content).with_context(|| format!("Failed to parse config {}", path.display()))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: MonitorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// First config file found in the conventional locations, if any
    pub fn locate() -> Option<PathBuf> {
        let paths = [
            PathBuf::from("config").join("monitor.toml"),
            PathBuf::from("..").join("config").join("monitor.toml"),
        ];

        paths.into_iter().find(|path| path.exists())
    }

    /// Load the explicit path, else the first file found, else defaults
    pub fn load_or_default(explicit: Option<&Path>) -> anyhow::Result<(Self, Option<PathBuf>)> {
        match explicit.map(Path::to_path_buf).or_else(Self::locate) {
            Some(path) => Ok((Self::load(&path)?, Some(path))),
            None => Ok((Self::default(), None)),
        }
    }

    /// Command line and environment values win over the file
    pub fn apply_overrides(&mut self, base_url: Option<String>, listen_addr: Option<SocketAddr>) -> anyhow::Result<()> {
        if let Some(base_url) = base_url {
            self.upstream.base_url = base_url;
        }
        if let Some(listen_addr) = listen_addr {
            self.server.listen_addr = listen_addr;
        }
        self.validate()
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.upstream.base_url.trim().is_empty() {
            bail!("upstream.base_url must not be empty");
        }
        if self.upstream.timeout_seconds == 0 {
            bail!("upstream.timeout_seconds must be at least 1");
        }
        Ok(())
    }
}
