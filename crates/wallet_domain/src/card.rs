use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum CardType {
    #[default]
    Credit,
    Debit,
}

/// Recurring reminder attached to a single card.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CardCustomReminder {
    pub id: String,
    pub day_of_month: i32,
    pub label: String,
}

/// A stored payment card. Only the scheduling fields are interpreted by this crate; the rest is
/// carried through unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    #[serde(default)]
    pub card_number: String,
    #[serde(default)]
    pub cvv: String,
    #[serde(default)]
    pub expiry_date: String,
    #[serde(default)]
    pub bank_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_variant: Option<String>,
    #[serde(default)]
    pub cardholder_name: String,
    #[serde(default)]
    pub card_type: CardType,
    #[serde(default, deserialize_with = "lenient_whole_number")]
    pub bill_generation_day: Option<i32>,
    #[serde(default, deserialize_with = "lenient_whole_number")]
    pub billing_period_days: Option<u32>,
    /// Older records stored the billing period under this name.
    #[serde(
        default,
        rename = "billDueDay",
        skip_serializing,
        deserialize_with = "lenient_whole_number"
    )]
    legacy_bill_due_day: Option<u32>,
    #[serde(default)]
    pub skip_reminders: bool,
    #[serde(default, deserialize_with = "lenient_reminders")]
    pub custom_reminders: Vec<CardCustomReminder>,
    #[serde(default)]
    pub usage_count: u64,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub last_used_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Card {
    pub fn new(id: impl Into<String>, card_type: CardType) -> Self {
        Self {
            id: id.into(),
            card_type,
            ..Self::default()
        }
    }

    pub fn is_credit(&self) -> bool {
        self.card_type == CardType::Credit
    }

    /// Whether billing-derived reminders can be produced for this card at all.
    pub fn participates_in_billing(&self) -> bool {
        !self.skip_reminders && self.is_credit() && self.bill_generation_day.is_some()
    }

    /// Applies legacy-field migration after loading from storage.
    pub fn normalized(mut self) -> Self {
        if self.billing_period_days.is_none() {
            self.billing_period_days = self.legacy_bill_due_day.take();
        }
        self.legacy_bill_due_day = None;
        self
    }
}

/// Scheduling numbers that are not whole, in range values (strings, fractions, negative periods)
/// read as unset, leaving the card without the reminders that depend on them.
fn lenient_whole_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: TryFrom<i64>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_i64)
        .and_then(|number| T::try_from(number).ok()))
}

fn lenient_reminders<'de, D>(deserializer: D) -> Result<Vec<CardCustomReminder>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let Some(serde_json::Value::Array(entries)) = raw else {
        return Ok(Vec::new());
    };
    Ok(entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect())
}
