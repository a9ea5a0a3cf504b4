use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;

use crate::storage::{read_json, write_json, KeyValueStore, Stored, GLOBAL_REMINDERS_KEY};

/// Personal monthly reminder not attached to any card ("pay rent").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GlobalCustomReminder {
    pub id: String,
    pub day_of_month: i32,
    pub label: String,
    pub title: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReminderDraftError {
    #[error("day must be between 1 and 31")]
    DayOutOfRange,
    #[error("title is required")]
    MissingTitle,
    #[error("reminder text is required")]
    MissingLabel,
}

impl GlobalCustomReminder {
    pub fn new(
        day_of_month: i32,
        label: impl Into<String>,
        title: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: format!("global-{}", now.timestamp_millis()),
            day_of_month,
            label: label.into(),
            title: title.into(),
        }
    }

    /// Decodes one persisted entry, rejecting anything without a label, a title and a finite day.
    fn from_stored(entry: &Value) -> Option<Self> {
        let object = entry.as_object()?;
        let text = |field: &str| {
            object
                .get(field)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };
        let day = object
            .get("dayOfMonth")
            .and_then(Value::as_f64)
            .filter(|day| day.is_finite())?;
        let id = match object.get("id") {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => return None,
        };
        Some(Self {
            id,
            day_of_month: day.trunc().clamp(i32::MIN as f64, i32::MAX as f64) as i32,
            label: text("label")?,
            title: text("title")?,
        })
    }
}

/// Checks user input for a new or edited global reminder.
pub fn validate_draft(day: i32, title: &str, label: &str) -> Result<(), ReminderDraftError> {
    if !(1..=31).contains(&day) {
        return Err(ReminderDraftError::DayOutOfRange);
    }
    if title.trim().is_empty() {
        return Err(ReminderDraftError::MissingTitle);
    }
    if label.trim().is_empty() {
        return Err(ReminderDraftError::MissingLabel);
    }
    Ok(())
}

/// Replaces the entry with the same id, or appends.
pub fn upsert(list: &mut Vec<GlobalCustomReminder>, reminder: GlobalCustomReminder) {
    match list.iter_mut().find(|existing| existing.id == reminder.id) {
        Some(existing) => *existing = reminder,
        None => list.push(reminder),
    }
}

pub fn remove(list: &mut Vec<GlobalCustomReminder>, id: &str) -> bool {
    let before = list.len();
    list.retain(|reminder| reminder.id != id);
    list.len() != before
}

#[derive(Clone)]
pub struct GlobalReminderStore {
    store: Arc<dyn KeyValueStore>,
}

impl GlobalReminderStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Returns the valid persisted reminders; malformed entries are skipped.
    #[instrument(skip(self))]
    pub fn list(&self) -> Result<Vec<GlobalCustomReminder>> {
        let stored = read_json::<Value>(self.store.as_ref(), GLOBAL_REMINDERS_KEY)
            .context("failed to read global reminders")?;
        let entries = match stored {
            Stored::Value(Value::Array(entries)) => entries,
            Stored::Value(other) => {
                tracing::warn!(kind = ?other, "global reminders payload is not a list");
                return Ok(Vec::new());
            }
            Stored::Missing => return Ok(Vec::new()),
            Stored::Corrupt(err) => {
                tracing::warn!(%err, "discarding unreadable global reminders");
                return Ok(Vec::new());
            }
        };
        let total = entries.len();
        let reminders: Vec<GlobalCustomReminder> = entries
            .iter()
            .filter_map(GlobalCustomReminder::from_stored)
            .collect();
        if reminders.len() < total {
            tracing::warn!(
                skipped = total - reminders.len(),
                "ignoring malformed global reminders"
            );
        }
        Ok(reminders)
    }

    #[instrument(skip(self, reminders), fields(count = reminders.len()))]
    pub fn replace_all(&self, reminders: &[GlobalCustomReminder]) -> Result<()> {
        write_json(self.store.as_ref(), GLOBAL_REMINDERS_KEY, reminders)
            .context("failed to write global reminders")
    }
}
