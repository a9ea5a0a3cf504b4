use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::instrument;

use crate::card::Card;
use crate::storage::{read_json, write_json, KeyValueStore, Stored, CARDS_KEY};

/// Read access to the card collection, as needed by the reminder feed.
pub trait CardSource: Send + Sync {
    fn list_cards(&self) -> Result<Vec<Card>>;
}

impl CardSource for Vec<Card> {
    fn list_cards(&self) -> Result<Vec<Card>> {
        Ok(self.clone())
    }
}

/// Card collection persisted as a single JSON list.
#[derive(Clone)]
pub struct CardStore {
    store: Arc<dyn KeyValueStore>,
}

impl CardStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Stored cards in saved order. Entries that do not decode as a card are skipped so one bad
    /// record never hides the others.
    pub fn list(&self) -> Result<Vec<Card>> {
        let entries = match read_json::<Vec<Value>>(self.store.as_ref(), CARDS_KEY)
            .context("failed to load cards")?
        {
            Stored::Missing => return Ok(Vec::new()),
            Stored::Corrupt(err) => {
                return Err(anyhow!(err).context("stored cards are unreadable"))
            }
            Stored::Value(entries) => entries,
        };
        let total = entries.len();
        let cards: Vec<Card> = entries
            .into_iter()
            .filter_map(|entry| serde_json::from_value::<Card>(entry).ok())
            .map(Card::normalized)
            .collect();
        if cards.len() < total {
            tracing::warn!(
                skipped = total - cards.len(),
                "skipping stored cards that could not be decoded"
            );
        }
        Ok(cards)
    }

    #[instrument(skip(self, cards), fields(count = cards.len()))]
    pub fn set_all(&self, cards: &[Card]) -> Result<()> {
        write_json(self.store.as_ref(), CARDS_KEY, cards).context("failed to persist cards")
    }

    /// Inserts or replaces by id.
    pub fn save(&self, card: Card) -> Result<()> {
        let mut cards = self.list()?;
        match cards.iter_mut().find(|existing| existing.id == card.id) {
            Some(existing) => *existing = card,
            None => cards.push(card),
        }
        self.set_all(&cards)
    }

    #[instrument(skip(self, apply))]
    pub fn update(&self, id: &str, apply: impl FnOnce(&mut Card)) -> Result<Card> {
        let mut cards = self.list()?;
        let card = cards
            .iter_mut()
            .find(|card| card.id == id)
            .ok_or_else(|| anyhow!("card not found: {id}"))?;
        apply(card);
        let updated = card.clone();
        self.set_all(&cards)?;
        Ok(updated)
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        let mut cards = self.list()?;
        cards.retain(|card| card.id != id);
        self.set_all(&cards)
    }

    #[instrument(skip(self))]
    pub fn delete_all(&self) -> Result<()> {
        self.store
            .remove(CARDS_KEY)
            .context("failed to delete cards")
    }

    pub fn increment_usage(&self, id: &str, now: DateTime<Utc>) -> Result<Card> {
        self.update(id, |card| {
            card.usage_count += 1;
            card.last_used_at = now.timestamp_millis();
        })
    }

    pub fn toggle_pin(&self, id: &str) -> Result<Card> {
        self.update(id, |card| card.is_pinned = !card.is_pinned)
    }

    /// Opts a card out of every reminder; re-enabled from the card editor.
    pub fn skip_reminders(&self, id: &str) -> Result<Card> {
        self.update(id, |card| card.skip_reminders = true)
    }
}

impl CardSource for CardStore {
    fn list_cards(&self) -> Result<Vec<Card>> {
        self.list()
    }
}

/// Pinned cards first (most recently used first), then by usage and recency.
pub fn sort_cards(cards: &[Card]) -> Vec<Card> {
    let (mut pinned, mut unpinned): (Vec<Card>, Vec<Card>) =
        cards.iter().cloned().partition(|card| card.is_pinned);
    pinned.sort_by(|a, b| b.last_used_at.cmp(&a.last_used_at));
    unpinned.sort_by(|a, b| {
        b.usage_count
            .cmp(&a.usage_count)
            .then_with(|| b.last_used_at.cmp(&a.last_used_at))
    });
    pinned.extend(unpinned);
    pinned
}

/// Case-insensitive match of every query term against bank and cardholder name.
pub fn filter_cards(cards: &[Card], query: &str) -> Vec<Card> {
    let terms: Vec<String> = query
        .split_whitespace()
        .map(|term| term.to_lowercase())
        .collect();
    if terms.is_empty() {
        return cards.to_vec();
    }
    cards
        .iter()
        .filter(|card| {
            let haystack = format!("{} {}", card.bank_name, card.cardholder_name).to_lowercase();
            terms.iter().all(|term| haystack.contains(term.as_str()))
        })
        .cloned()
        .collect()
}

/// Credit cards that cannot get billing reminders because no statement day is set.
pub fn missing_bill_cards(cards: &[Card]) -> Vec<Card> {
    cards
        .iter()
        .filter(|card| card.is_credit() && card.bill_generation_day.is_none())
        .cloned()
        .collect()
}
