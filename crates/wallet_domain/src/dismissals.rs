use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use tracing::instrument;

use crate::storage::{read_json, write_json, KeyValueStore, DISMISSALS_KEY};

/// Dismissals older than this are dropped by [`DismissalStore::clear_outdated_at`].
pub const DISMISSAL_RETENTION_DAYS: i64 = 90;

/// Reminder key -> unix ms at which it was dismissed.
pub type DismissalMap = BTreeMap<String, i64>;

/// Expiring acknowledgment ledger keyed by opaque reminder keys.
#[derive(Clone)]
pub struct DismissalStore {
    store: Arc<dyn KeyValueStore>,
}

impl DismissalStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Reads the whole ledger. A corrupt payload reads as empty; I/O errors propagate.
    pub fn load(&self) -> Result<DismissalMap> {
        let stored = read_json::<DismissalMap>(self.store.as_ref(), DISMISSALS_KEY)
            .context("failed to read reminder dismissals")?;
        Ok(stored.or_default_logged(DISMISSALS_KEY))
    }

    fn save(&self, map: &DismissalMap) -> Result<()> {
        write_json(self.store.as_ref(), DISMISSALS_KEY, map)
            .context("failed to write reminder dismissals")
    }

    pub fn dismiss(&self, key: &str) -> Result<()> {
        self.dismiss_at(key, Utc::now())
    }

    #[instrument(skip(self))]
    pub fn dismiss_at(&self, key: &str, now: DateTime<Utc>) -> Result<()> {
        let mut map = self.load()?;
        map.insert(key.to_string(), now.timestamp_millis());
        self.save(&map)
    }

    pub fn is_dismissed(&self, key: &str) -> Result<bool> {
        Ok(self.load()?.contains_key(key))
    }

    pub fn clear_outdated(&self) -> Result<usize> {
        self.clear_outdated_at(Utc::now())
    }

    /// Drops entries older than the retention window and returns how many were removed.
    #[instrument(skip(self))]
    pub fn clear_outdated_at(&self, now: DateTime<Utc>) -> Result<usize> {
        let cutoff = (now - Duration::days(DISMISSAL_RETENTION_DAYS)).timestamp_millis();
        let mut map = self.load()?;
        let before = map.len();
        map.retain(|_, dismissed_at| *dismissed_at > cutoff);
        let removed = before - map.len();
        if removed > 0 {
            tracing::debug!(removed, "purged stale reminder dismissals");
        }
        self.save(&map)?;
        Ok(removed)
    }

    #[instrument(skip(self))]
    pub fn reset_all(&self) -> Result<()> {
        self.save(&DismissalMap::new())
    }
}
