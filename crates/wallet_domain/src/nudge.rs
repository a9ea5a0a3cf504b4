use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};

use crate::storage::{KeyValueStore, BILL_NUDGE_KEY};

/// How long a dismissed "add your statement day" prompt stays hidden.
pub const BILL_NUDGE_COOLDOWN_DAYS: i64 = 30;

/// Remembers when the missing-statement-day prompt was last dismissed.
#[derive(Clone)]
pub struct BillNudgeStore {
    store: Arc<dyn KeyValueStore>,
}

impl BillNudgeStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn last_dismissed(&self) -> Result<Option<i64>> {
        let raw = self
            .store
            .get(BILL_NUDGE_KEY)
            .context("failed to read bill nudge state")?;
        Ok(raw.and_then(|value| value.trim().parse::<i64>().ok()))
    }

    pub fn should_show(&self, now: DateTime<Utc>) -> Result<bool> {
        let cooldown = Duration::days(BILL_NUDGE_COOLDOWN_DAYS).num_milliseconds();
        Ok(match self.last_dismissed()? {
            Some(at) if at > 0 => now.timestamp_millis() - at > cooldown,
            _ => true,
        })
    }

    pub fn dismiss(&self, now: DateTime<Utc>) -> Result<()> {
        self.store
            .set(BILL_NUDGE_KEY, &now.timestamp_millis().to_string())
            .context("failed to persist bill nudge dismissal")
    }

    pub fn reset(&self) -> Result<()> {
        self.store
            .remove(BILL_NUDGE_KEY)
            .context("failed to reset bill nudge")
    }
}
