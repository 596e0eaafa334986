//! Cluster connection configuration
//!
//! A config file lists one `[[clusters]]` table per named cluster:
//!
//! ```toml
//! print_banner = true
//!
//! [[clusters]]
//! name = "primary"
//! hosts = ["10.0.0.1:9200", "10.0.0.2:9200"]
//! username = "elastic"
//! password = "changeme"
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Top-level configuration consumed by the registry and the CLI
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EsConfig {
    /// Print the startup banner
    #[serde(default = "default_true")]
    pub print_banner: bool,

    /// One entry per named cluster
    #[serde(default)]
    pub clusters: Vec<ClusterConnectionConfig>,
}

fn default_true() -> bool {
    true
}

impl Default for EsConfig {
    fn default() -> Self {
        Self {
            print_banner: true,
            clusters: Vec::new(),
        }
    }
}

impl EsConfig {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Connection parameters for a single cluster
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClusterConnectionConfig {
    /// Unique cluster name used for lookups
    pub name: String,

    /// Node addresses, `host:port` or full URLs
    #[serde(default)]
    pub hosts: Vec<String>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Connection timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Socket (read) timeout in milliseconds
    #[serde(default = "default_socket_timeout")]
    pub socket_timeout_ms: u64,

    /// How long an idle pooled connection is kept for reuse, in milliseconds.
    /// The HTTP client has no pool-checkout timeout, so this also bounds
    /// keep-alive reuse between requests.
    #[serde(default = "default_connection_request_timeout")]
    pub connection_request_timeout_ms: u64,
}

fn default_connect_timeout() -> u64 {
    5000
}

fn default_socket_timeout() -> u64 {
    60000
}

fn default_connection_request_timeout() -> u64 {
    5000
}

impl ClusterConnectionConfig {
    pub fn new(name: impl Into<String>, hosts: Vec<String>) -> Self {
        Self {
            name: name.into(),
            hosts,
            username: None,
            password: None,
            connect_timeout_ms: default_connect_timeout(),
            socket_timeout_ms: default_socket_timeout(),
            connection_request_timeout_ms: default_connection_request_timeout(),
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn socket_timeout(&self) -> Duration {
        Duration::from_millis(self.socket_timeout_ms)
    }

    pub fn connection_request_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_request_timeout_ms)
    }

    /// Username and password, only when both are non-blank
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let username = self.username.as_deref().map(str::trim).filter(|u| !u.is_empty())?;
        let password = self.password.as_deref().filter(|p| !p.trim().is_empty())?;
        Some((username, password))
    }

    /// Validate the config and return the usable node URLs.
    ///
    /// Hosts are trimmed and blank entries dropped. A cluster with no usable
    /// host left is rejected.
    pub fn validate(&self) -> Result<Vec<Url>> {
        if self.name.trim().is_empty() {
            return Err(Error::Config("cluster name must not be empty".to_string()));
        }

        for (field, value) in [
            ("connect_timeout_ms", self.connect_timeout_ms),
            ("socket_timeout_ms", self.socket_timeout_ms),
            ("connection_request_timeout_ms", self.connection_request_timeout_ms),
        ] {
            if value == 0 {
                return Err(Error::Config(format!(
                    "{} must be greater than zero for cluster '{}'",
                    field, self.name
                )));
            }
        }

        let urls = self
            .hosts
            .iter()
            .map(|h| h.trim())
            .filter(|h| !h.is_empty())
            .map(parse_host)
            .collect::<Result<Vec<_>>>()?;

        if urls.is_empty() {
            return Err(Error::Config(format!(
                "No valid hosts found in configuration for cluster '{}': {:?}",
                self.name, self.hosts
            )));
        }

        Ok(urls)
    }
}

/// Parse a host entry, defaulting to plain HTTP when no scheme is given
pub fn parse_host(host: &str) -> Result<Url> {
    let url = if host.contains("://") {
        Url::parse(host)?
    } else {
        Url::parse(&format!("http://{}", host))?
    };

    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(Error::Config(format!("Host '{}' is not a valid node address", host)));
    }

    Ok(url)
}
