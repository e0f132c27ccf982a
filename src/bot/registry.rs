use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;

/// A host is online if it was seen within this many minutes (inclusive).
pub const ONLINE_WINDOW_MINUTES: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRecord {
    pub id: String,
    pub display_name: String,
    pub last_seen: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostStatus {
    Online,
    Offline,
}

impl HostRecord {
    pub fn status(&self, now: DateTime<Utc>) -> HostStatus {
        if now - self.last_seen <= Duration::minutes(ONLINE_WINDOW_MINUTES) {
            HostStatus::Online
        } else {
            HostStatus::Offline
        }
    }
}

/// Known hosts keyed by id. Entries are never removed; only their status ages.
#[derive(Debug, Default)]
pub struct ComputerRegistry {
    hosts: RwLock<HashMap<String, HostRecord>>,
}

impl ComputerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or refresh a host entry.
    pub async fn register(&self, id: &str, name: &str) {
        self.register_at(id, name, Utc::now()).await;
    }

    /// Refresh `last_seen` of an existing host. Unknown ids are ignored.
    pub async fn touch(&self, id: &str) -> bool {
        self.touch_at(id, Utc::now()).await
    }

    pub(crate) async fn register_at(&self, id: &str, name: &str, now: DateTime<Utc>) {
        let mut hosts = self.hosts.write().await;
        match hosts.get_mut(id) {
            Some(record) => {
                record.display_name = name.to_string();
                record.last_seen = record.last_seen.max(now);
            }
            None => {
                hosts.insert(
                    id.to_string(),
                    HostRecord {
                        id: id.to_string(),
                        display_name: name.to_string(),
                        last_seen: now,
                    },
                );
            }
        }
        debug!("Registered host {} ({})", id, name);
    }

    pub(crate) async fn touch_at(&self, id: &str, now: DateTime<Utc>) -> bool {
        let mut hosts = self.hosts.write().await;
        match hosts.get_mut(id) {
            Some(record) => {
                record.last_seen = record.last_seen.max(now);
                true
            }
            None => false,
        }
    }

    /// Point-in-time copy of all hosts, sorted by id.
    pub async fn snapshot(&self) -> Vec<HostRecord> {
        let mut records: Vec<HostRecord> = self.hosts.read().await.values().cloned().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }
}
