//! Registry of live cluster connections
//!
//! The registry is built once from configuration and then shared read-only.
//! A cluster whose handle cannot be built is logged and left out; it never
//! aborts initialization of the others.

use crate::client::ConnectionHandle;
use crate::config::ClusterConnectionConfig;
use crate::error::{Error, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Owns one [`ConnectionHandle`] per configured cluster name
#[derive(Debug, Default)]
pub struct ClientRegistry {
    handles: RwLock<HashMap<String, Arc<ConnectionHandle>>>,
}

impl ClientRegistry {
    /// Build handles for every usable config
    pub fn initialize(configs: &[ClusterConnectionConfig]) -> Self {
        if configs.is_empty() {
            warn!("No search cluster configuration found");
        }

        let mut handles = HashMap::with_capacity(configs.len());
        for config in configs {
            if handles.contains_key(&config.name) {
                warn!(
                    cluster = %config.name,
                    "Duplicate cluster name in configuration, keeping the first definition"
                );
                continue;
            }

            info!(cluster = %config.name, hosts = ?config.hosts, "Initializing cluster client");
            match ConnectionHandle::connect(config) {
                Ok(handle) => {
                    info!(
                        cluster = %config.name,
                        nodes = handle.nodes().len(),
                        authenticated = handle.is_authenticated(),
                        "Cluster client initialized"
                    );
                    handles.insert(config.name.clone(), Arc::new(handle));
                }
                Err(e) => {
                    error!(
                        cluster = %config.name,
                        hosts = ?config.hosts,
                        error_type = e.error_type(),
                        "Failed to initialize cluster client: {}",
                        e
                    );
                }
            }
        }

        Self {
            handles: RwLock::new(handles),
        }
    }

    /// Handle for `cluster`, or [`Error::ClusterNotFound`]
    pub fn lookup(&self, cluster: &str) -> Result<Arc<ConnectionHandle>> {
        self.handles
            .read()
            .get(cluster)
            .cloned()
            .ok_or_else(|| Error::ClusterNotFound(cluster.to_string()))
    }

    /// Snapshot of registered cluster names, in no particular order
    pub fn cluster_names(&self) -> Vec<String> {
        self.handles.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.handles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.read().is_empty()
    }

    /// Liveness probe. Unknown clusters and transport failures report `false`.
    pub async fn ping(&self, cluster: &str) -> bool {
        let result = match self.lookup(cluster) {
            Ok(handle) => handle.ping().await,
            Err(e) => Err(e),
        };

        match result {
            Ok(alive) => alive,
            Err(e) => {
                error!(
                    cluster = %cluster,
                    error_type = e.error_type(),
                    "Failed to ping cluster: {}",
                    e
                );
                false
            }
        }
    }

    /// Close every handle and empty the registry. Close failures are logged
    /// and do not stop the remaining handles from closing.
    pub fn shutdown(&self) {
        let drained: Vec<(String, Arc<ConnectionHandle>)> = self.handles.write().drain().collect();
        if drained.is_empty() {
            return;
        }

        let count = drained.len();
        for (name, handle) in drained {
            if let Err(e) = handle.close() {
                error!(cluster = %name, "Error closing cluster client: {}", e);
            }
        }
        info!(count, "All cluster clients have been closed");
    }
}
