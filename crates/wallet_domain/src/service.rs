use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::instrument;

use crate::{
    card::Card,
    cards::{self, CardSource, CardStore},
    custom::{GlobalCustomReminder, GlobalReminderStore},
    dismissals::DismissalStore,
    nudge::BillNudgeStore,
    preferences::{AppPreferences, PreferencesStore},
    reminders::{self, CardReminder, ReminderTypes},
    storage::KeyValueStore,
};

/// Everything the reminders screen renders after a refresh.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReminderFeed {
    pub reminders: Vec<CardReminder>,
    pub window_days: u32,
    pub missing_bill_cards: Vec<Card>,
    pub show_missing_bill_nudge: bool,
}

/// Entry point for the UI layer: reminder aggregation plus the stores it depends on.
pub struct WalletService {
    cards: Arc<dyn CardSource>,
    dismissals: DismissalStore,
    globals: GlobalReminderStore,
    preferences: PreferencesStore,
    nudge: BillNudgeStore,
}

pub struct WalletServiceBuilder {
    store: Option<Arc<dyn KeyValueStore>>,
    cards: Option<Arc<dyn CardSource>>,
}

impl WalletServiceBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            cards: None,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Overrides where cards come from; defaults to a [`CardStore`] on the same backend.
    pub fn with_card_source(mut self, cards: Arc<dyn CardSource>) -> Self {
        self.cards = Some(cards);
        self
    }

    pub fn build(self) -> Result<WalletService> {
        let store = self
            .store
            .ok_or_else(|| anyhow!("wallet service needs a key-value store"))?;
        let cards = self
            .cards
            .unwrap_or_else(|| Arc::new(CardStore::new(store.clone())));
        Ok(WalletService {
            cards,
            dismissals: DismissalStore::new(store.clone()),
            globals: GlobalReminderStore::new(store.clone()),
            preferences: PreferencesStore::new(store.clone()),
            nudge: BillNudgeStore::new(store),
        })
    }
}

impl Default for WalletServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WalletService {
    pub fn builder() -> WalletServiceBuilder {
        WalletServiceBuilder::new()
    }

    /// Aggregates reminders for `cards`, reading the dismissal ledger once.
    pub fn active_reminders(
        &self,
        cards: &[Card],
        window_days: u32,
        today: NaiveDate,
        enabled: &ReminderTypes,
        globals: &[GlobalCustomReminder],
    ) -> Result<Vec<CardReminder>> {
        let dismissals = self.dismissals.load()?;
        Ok(reminders::collect_reminders(
            cards,
            window_days,
            today,
            enabled,
            globals,
            &dismissals,
        ))
    }

    pub fn dismiss_reminder(&self, key: &str) -> Result<()> {
        self.dismissals.dismiss(key)
    }

    pub fn dismiss_reminder_at(&self, key: &str, now: DateTime<Utc>) -> Result<()> {
        self.dismissals.dismiss_at(key, now)
    }

    pub fn clear_outdated_dismissals(&self) -> Result<usize> {
        self.dismissals.clear_outdated()
    }

    pub fn clear_outdated_dismissals_at(&self, now: DateTime<Utc>) -> Result<usize> {
        self.dismissals.clear_outdated_at(now)
    }

    pub fn reset_all_dismissals(&self) -> Result<()> {
        self.dismissals.reset_all()
    }

    pub fn global_custom_reminders(&self) -> Result<Vec<GlobalCustomReminder>> {
        self.globals.list()
    }

    pub fn set_global_custom_reminders(&self, reminders: &[GlobalCustomReminder]) -> Result<()> {
        self.globals.replace_all(reminders)
    }

    pub fn preferences(&self) -> Result<AppPreferences> {
        self.preferences.load()
    }

    pub fn update_preferences(
        &self,
        apply: impl FnOnce(&mut AppPreferences),
    ) -> Result<AppPreferences> {
        self.preferences.update(apply)
    }

    pub fn dismiss_bill_nudge(&self, now: DateTime<Utc>) -> Result<()> {
        self.nudge.dismiss(now)
    }

    pub fn reset_bill_nudge(&self) -> Result<()> {
        self.nudge.reset()
    }

    /// Runs the refresh sequence of the reminders screen: purge stale dismissals, then load cards,
    /// preferences and global reminders and aggregate them for `today`.
    #[instrument(skip(self))]
    pub fn load_feed(&self, today: NaiveDate, now: DateTime<Utc>) -> Result<ReminderFeed> {
        self.dismissals.clear_outdated_at(now)?;
        let cards = self.cards.list_cards()?;
        let prefs = self.preferences.load()?;
        let globals = self.globals.list()?;

        let missing_bill_cards = cards::missing_bill_cards(&cards);
        let show_missing_bill_nudge =
            !missing_bill_cards.is_empty() && self.nudge.should_show(now)?;

        let reminders = self.active_reminders(
            &cards,
            prefs.reminder_window_days,
            today,
            &prefs.reminder_types,
            &globals,
        )?;
        tracing::debug!(count = reminders.len(), "reminder feed refreshed");

        Ok(ReminderFeed {
            reminders,
            window_days: prefs.reminder_window_days,
            missing_bill_cards,
            show_missing_bill_nudge,
        })
    }
}
