//! Reminder feed: statement, due, renewal and custom events for every card plus the personal
//! (global) reminders, windowed against the lookahead, filtered by dismissals and ordered by date.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{
    billing,
    card::Card,
    custom::GlobalCustomReminder,
    dismissals::DismissalMap,
};

/// Days after an event during which it still shows up as overdue.
pub const OVERDUE_GRACE_DAYS: i64 = 7;

/// Key segment used in place of a card id for global reminders.
pub const GLOBAL_OWNER: &str = "global";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ReminderReason {
    Statement,
    Due,
    Renewal,
    Custom,
}

impl ReminderReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderReason::Statement => "statement",
            ReminderReason::Due => "due",
            ReminderReason::Renewal => "renewal",
            ReminderReason::Custom => "custom",
        }
    }
}

/// Which reasons the user wants to hear about.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReminderTypes {
    pub statement: bool,
    pub due: bool,
    pub renewal: bool,
    pub custom: bool,
}

impl Default for ReminderTypes {
    fn default() -> Self {
        Self {
            statement: true,
            due: true,
            renewal: true,
            custom: true,
        }
    }
}

impl ReminderTypes {
    pub fn is_enabled(&self, reason: ReminderReason) -> bool {
        match reason {
            ReminderReason::Statement => self.statement,
            ReminderReason::Due => self.due,
            ReminderReason::Renewal => self.renewal,
            ReminderReason::Custom => self.custom,
        }
    }
}

/// What a reminder is about.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ReminderTarget {
    Card(Box<Card>),
    Global,
}

impl ReminderTarget {
    /// Identifier used when building reminder keys.
    pub fn owner_id(&self) -> &str {
        match self {
            ReminderTarget::Card(card) => &card.id,
            ReminderTarget::Global => GLOBAL_OWNER,
        }
    }

    pub fn card(&self) -> Option<&Card> {
        match self {
            ReminderTarget::Card(card) => Some(card.as_ref()),
            ReminderTarget::Global => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CardReminder {
    pub key: String,
    pub target: ReminderTarget,
    pub reason: ReminderReason,
    pub target_date: NaiveDate,
    /// Unix ms of the midnight starting `target_date`.
    pub target_timestamp: i64,
    pub days_until: i64,
    pub label: String,
    pub sublabel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl CardReminder {
    pub fn is_overdue(&self) -> bool {
        self.days_until < 0
    }

    /// `In 3 days`, `In 1 day`, `Overdue - 2 days`.
    pub fn status_text(&self) -> String {
        let days = self.days_until.abs();
        let unit = if days == 1 { "day" } else { "days" };
        if self.is_overdue() {
            format!("Overdue - {days} {unit}")
        } else {
            format!("In {days} {unit}")
        }
    }
}

/// Deterministic identity of one occurrence of one event.
pub fn reminder_key(
    owner_id: &str,
    reason: ReminderReason,
    target_timestamp: i64,
    custom_id: Option<&str>,
) -> String {
    match custom_id {
        Some(custom_id) => format!(
            "{owner_id}_{}_{target_timestamp}_{custom_id}",
            reason.as_str()
        ),
        None => format!("{owner_id}_{}_{target_timestamp}", reason.as_str()),
    }
}

/// True when `days_until` is inside the lookahead or the overdue grace period.
pub fn within_window(days_until: i64, window_days: u32) -> bool {
    if days_until >= 0 {
        days_until <= i64::from(window_days)
    } else {
        -days_until <= OVERDUE_GRACE_DAYS
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    reason: ReminderReason,
    date: NaiveDate,
    custom_id: Option<String>,
    title: Option<String>,
    note: Option<String>,
}

impl Candidate {
    fn new(reason: ReminderReason, date: NaiveDate) -> Self {
        Self {
            reason,
            date,
            custom_id: None,
            title: None,
            note: None,
        }
    }

    fn custom(date: NaiveDate, id: &str, title: &str, note: Option<&str>) -> Self {
        Self {
            reason: ReminderReason::Custom,
            date,
            custom_id: Some(id.to_string()),
            title: Some(title.to_string()),
            note: note.map(str::to_string),
        }
    }

    fn into_reminder(self, target: ReminderTarget, key: String, today: NaiveDate) -> CardReminder {
        let when = billing::short_date(self.date);
        let (label, sublabel) = match self.reason {
            ReminderReason::Statement => {
                ("Statement coming up".to_string(), format!("Statement on {when}"))
            }
            ReminderReason::Due => ("Payment may be due".to_string(), format!("Due by {when}")),
            ReminderReason::Renewal => {
                ("Card renewal coming up".to_string(), format!("Renew by {when}"))
            }
            ReminderReason::Custom => (
                self.title.unwrap_or_else(|| "Reminder".to_string()),
                format!("Reminder on {when}"),
            ),
        };
        CardReminder {
            key,
            target,
            reason: self.reason,
            target_date: self.date,
            target_timestamp: billing::timestamp_ms(self.date),
            days_until: billing::days_until(self.date, today),
            label,
            sublabel,
            custom_id: self.custom_id,
            note: self.note,
        }
    }
}

/// Upcoming and just-passed occurrences of every event a card can produce.
fn card_candidates(card: &Card, today: NaiveDate) -> Vec<Candidate> {
    if !card.participates_in_billing() {
        return Vec::new();
    }
    let Some(bill_day) = card.bill_generation_day else {
        return Vec::new();
    };

    let mut candidates = vec![
        Candidate::new(
            ReminderReason::Statement,
            billing::previous_statement_date(bill_day, today),
        ),
        Candidate::new(
            ReminderReason::Statement,
            billing::next_statement_date(bill_day, today),
        ),
    ];

    if let Some(period) = card.billing_period_days {
        candidates.push(Candidate::new(
            ReminderReason::Due,
            billing::previous_due_date(bill_day, today, Some(period)),
        ));
        candidates.push(Candidate::new(
            ReminderReason::Due,
            billing::due_date(bill_day, today, Some(period)),
        ));
    }

    match billing::extract_expiry_month(&card.expiry_date) {
        Some(month) => {
            candidates.push(Candidate::new(
                ReminderReason::Renewal,
                billing::previous_renewal_date(bill_day, month, today),
            ));
            candidates.push(Candidate::new(
                ReminderReason::Renewal,
                billing::next_renewal_date(bill_day, month, today),
            ));
        }
        None => {
            tracing::debug!(card_id = %card.id, "no renewal reminder, expiry not parseable");
        }
    }

    for custom in &card.custom_reminders {
        for date in this_and_next_month(custom.day_of_month, today) {
            candidates.push(Candidate::custom(date, &custom.id, &custom.label, None));
        }
    }

    candidates
}

/// Occurrences of a monthly custom day in the current and the following month.
fn this_and_next_month(day: i32, today: NaiveDate) -> [NaiveDate; 2] {
    let month = today.month0() as i32;
    [month, month + 1].map(|month| billing::clamp_day_to_month(today.year(), month, day))
}

fn global_candidates(reminder: &GlobalCustomReminder, today: NaiveDate) -> Vec<Candidate> {
    this_and_next_month(reminder.day_of_month, today)
        .into_iter()
        .map(|date| Candidate::custom(date, &reminder.id, &reminder.title, Some(&reminder.label)))
        .collect()
}

/// Builds the chronological reminder feed. Pure: identical inputs give identical output.
pub fn collect_reminders(
    cards: &[Card],
    window_days: u32,
    today: NaiveDate,
    enabled: &ReminderTypes,
    globals: &[GlobalCustomReminder],
    dismissals: &DismissalMap,
) -> Vec<CardReminder> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut reminders = Vec::new();

    let mut accept = |target: &ReminderTarget, candidate: Candidate| {
        if !enabled.is_enabled(candidate.reason) {
            return;
        }
        if !within_window(billing::days_until(candidate.date, today), window_days) {
            return;
        }
        let key = reminder_key(
            target.owner_id(),
            candidate.reason,
            billing::timestamp_ms(candidate.date),
            candidate.custom_id.as_deref(),
        );
        if dismissals.contains_key(&key) || !seen.insert(key.clone()) {
            return;
        }
        reminders.push(candidate.into_reminder(target.clone(), key, today));
    };

    for card in cards {
        let target = ReminderTarget::Card(Box::new(card.clone()));
        for candidate in card_candidates(card, today) {
            accept(&target, candidate);
        }
    }

    for global in globals {
        for candidate in global_candidates(global, today) {
            accept(&ReminderTarget::Global, candidate);
        }
    }

    // Stable: same-day events keep card order, then globals.
    reminders.sort_by_key(|reminder| reminder.target_date);
    reminders
}
