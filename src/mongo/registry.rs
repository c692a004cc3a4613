//! Connection-string-keyed cache of pooled MongoDB clients.
//!
//! Keys are exact strings; two differently formatted URIs for the same
//! server get separate entries. Creation is serialized per key through a
//! slot lock, so concurrent first acquires for one URI produce a single
//! physical client.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::Client;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::ApiError;

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_pool_size: u32,
    pub min_pool_size: u32,
    pub server_selection_timeout: Duration,
    pub app_name: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_pool_size: 10,
            min_pool_size: 2,
            server_selection_timeout: Duration::from_secs(5),
            app_name: "mongoscope".to_string(),
        }
    }
}

/// A cached entry as reported to the administrative connection list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    pub uri: String,
    pub connected_at: DateTime<Utc>,
}

struct Entry {
    client: Client,
    connected_at: DateTime<Utc>,
    /// Identifies this physical client so a failed probe evicts exactly the
    /// handle it probed, not a replacement some other task installed.
    generation: u64,
}

/// Per-URI slot. The outer map only hands out the Arc; all connect/evict
/// work happens under the slot's own lock so creation is single-flight.
type Slot = Arc<Mutex<Option<Entry>>>;

pub struct ClientRegistry {
    config: PoolConfig,
    slots: Mutex<HashMap<String, Slot>>,
    created: AtomicU64,
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    pub fn with_config(config: PoolConfig) -> Self {
        Self {
            config,
            slots: Mutex::new(HashMap::new()),
            created: AtomicU64::new(0),
        }
    }

    /// Return a live client for `uri`, reusing the cached handle when its
    /// liveness probe still answers. The slot lock guards creation and
    /// replacement only; the probe runs with the lock released, so
    /// concurrent requests for the same URI do not serialize behind a ping
    /// round trip. Creation failures are returned and never cached.
    pub async fn acquire(&self, uri: &str) -> Result<Client, ApiError> {
        validate_uri(uri)?;

        let slot = self.slot(uri).await;

        // Snapshot the cached handle, then drop the lock before probing.
        let cached = {
            let guard = slot.lock().await;
            guard
                .as_ref()
                .map(|entry| (entry.client.clone(), entry.generation))
        };

        match cached {
            Some((client, generation)) => {
                if ping(&client).await.is_ok() {
                    return Ok(client);
                }
                tracing::warn!(uri, "cached client failed liveness probe, reconnecting");
                let mut guard = slot.lock().await;
                // Another task may have replaced the dead handle while the
                // probe ran; evict only the exact client that failed.
                if guard.as_ref().map(|entry| entry.generation) == Some(generation) {
                    if let Some(stale) = guard.take() {
                        stale.client.shutdown().await;
                    }
                }
                self.connect_locked(uri, &mut guard).await
            }
            None => {
                // First use: creation is single-flight under the slot lock.
                let mut guard = slot.lock().await;
                self.connect_locked(uri, &mut guard).await
            }
        }
    }

    /// Reuse whatever the slot holds by now, otherwise connect and cache.
    /// Callers hold the slot lock, which is what makes creation
    /// single-flight per key.
    async fn connect_locked(
        &self,
        uri: &str,
        slot: &mut Option<Entry>,
    ) -> Result<Client, ApiError> {
        if let Some(entry) = slot.as_ref() {
            return Ok(entry.client.clone());
        }
        let entry = self.connect(uri).await?;
        let client = entry.client.clone();
        *slot = Some(entry);
        Ok(client)
    }

    /// Close and evict the cached handle for `uri`. Returns whether a live
    /// handle was actually torn down.
    pub async fn release(&self, uri: &str) -> bool {
        let slot = { self.slots.lock().await.get(uri).cloned() };
        let Some(slot) = slot else {
            return false;
        };
        let mut guard = slot.lock().await;
        match guard.take() {
            Some(entry) => {
                entry.client.shutdown().await;
                tracing::info!(uri, "connection released");
                true
            }
            None => false,
        }
    }

    /// Snapshot of live entries for the administrative connection list.
    pub async fn connections(&self) -> Vec<ConnectionInfo> {
        let slots: Vec<(String, Slot)> = {
            let map = self.slots.lock().await;
            map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
        };
        let mut out = Vec::new();
        for (uri, slot) in slots {
            let guard = slot.lock().await;
            if let Some(entry) = guard.as_ref() {
                out.push(ConnectionInfo {
                    uri,
                    connected_at: entry.connected_at,
                });
            }
        }
        out.sort_by(|a, b| a.uri.cmp(&b.uri));
        out
    }

    /// How many physical clients this registry has created. Stays flat while
    /// a healthy handle is being reused.
    pub fn connections_created(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }

    async fn slot(&self, uri: &str) -> Slot {
        let mut slots = self.slots.lock().await;
        slots.entry(uri.to_string()).or_default().clone()
    }

    async fn connect(&self, uri: &str) -> Result<Entry, ApiError> {
        let mut options = ClientOptions::parse(uri)
            .await
            .map_err(|e| ApiError::Connection(e.to_string()))?;
        options.app_name = Some(self.config.app_name.clone());
        options.max_pool_size = Some(self.config.max_pool_size);
        options.min_pool_size = Some(self.config.min_pool_size);
        options.server_selection_timeout = Some(self.config.server_selection_timeout);

        let client =
            Client::with_options(options).map_err(|e| ApiError::Connection(e.to_string()))?;
        ping(&client)
            .await
            .map_err(|e| ApiError::Connection(e.to_string()))?;

        let generation = self.created.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(uri, "connection established");
        Ok(Entry {
            client,
            connected_at: Utc::now(),
            generation,
        })
    }
}

/// Connection strings must carry a MongoDB scheme; checked before any I/O.
pub fn validate_uri(uri: &str) -> Result<(), ApiError> {
    if uri.starts_with("mongodb://") || uri.starts_with("mongodb+srv://") {
        Ok(())
    } else {
        Err(ApiError::Validation(
            "connection string must start with mongodb:// or mongodb+srv://".to_string(),
        ))
    }
}

async fn ping(client: &Client) -> mongodb::error::Result<()> {
    client
        .database("admin")
        .run_command(doc! { "ping": 1 }, None)
        .await
        .map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pool_config_matches_contract() {
        let config = PoolConfig::default();
        assert_eq!(config.max_pool_size, 10);
        assert_eq!(config.min_pool_size, 2);
        assert_eq!(config.server_selection_timeout, Duration::from_secs(5));
    }

    #[test]
    fn uri_scheme_is_enforced() {
        assert!(validate_uri("mongodb://localhost:27017").is_ok());
        assert!(validate_uri("mongodb+srv://cluster.example.net").is_ok());
        assert!(matches!(
            validate_uri("http://localhost:27017"),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(validate_uri(""), Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn bad_scheme_is_rejected_without_io() {
        let registry = ClientRegistry::new();
        let err = registry.acquire("postgres://localhost").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(registry.connections_created(), 0);
    }

    #[tokio::test]
    async fn release_of_unknown_key_is_a_noop() {
        let registry = ClientRegistry::new();
        assert!(!registry.release("mongodb://localhost:27017").await);
    }

    #[tokio::test]
    async fn unreachable_host_reports_error_and_caches_nothing() {
        let registry = ClientRegistry::with_config(PoolConfig {
            server_selection_timeout: Duration::from_millis(300),
            ..PoolConfig::default()
        });
        let err = registry.acquire("mongodb://127.0.0.1:1").await.unwrap_err();
        match err {
            ApiError::Connection(message) => assert!(!message.is_empty()),
            other => panic!("expected connection error, got {other:?}"),
        }
        assert_eq!(registry.connections_created(), 0);
        assert!(registry.connections().await.is_empty());
    }

    #[tokio::test]
    async fn failed_creation_is_retried_not_served_from_cache() {
        let registry = ClientRegistry::with_config(PoolConfig {
            server_selection_timeout: Duration::from_millis(300),
            ..PoolConfig::default()
        });
        for _ in 0..2 {
            let err = registry.acquire("mongodb://127.0.0.1:1").await.unwrap_err();
            assert!(matches!(err, ApiError::Connection(_)));
        }
        assert_eq!(registry.connections_created(), 0);
        assert!(registry.connections().await.is_empty());
    }
}
