use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::reminders::ReminderTypes;
use crate::storage::{read_json, write_json, KeyValueStore, PREFERENCES_KEY};

pub const DEFAULT_REMINDER_WINDOW_DAYS: u32 = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct AppPreferences {
    pub reminder_window_days: u32,
    pub reminder_types: ReminderTypes,
}

impl Default for AppPreferences {
    fn default() -> Self {
        Self {
            reminder_window_days: DEFAULT_REMINDER_WINDOW_DAYS,
            reminder_types: ReminderTypes::default(),
        }
    }
}

#[derive(Clone)]
pub struct PreferencesStore {
    store: Arc<dyn KeyValueStore>,
}

impl PreferencesStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Stored preferences merged over the defaults.
    pub fn load(&self) -> Result<AppPreferences> {
        let stored = read_json::<AppPreferences>(self.store.as_ref(), PREFERENCES_KEY)
            .context("failed to read preferences")?;
        Ok(stored.or_default_logged(PREFERENCES_KEY))
    }

    #[instrument(skip(self, apply))]
    pub fn update(&self, apply: impl FnOnce(&mut AppPreferences)) -> Result<AppPreferences> {
        let mut prefs = self.load()?;
        apply(&mut prefs);
        write_json(self.store.as_ref(), PREFERENCES_KEY, &prefs)
            .context("unable to save preferences")?;
        Ok(prefs)
    }
}
