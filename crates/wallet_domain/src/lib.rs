pub mod billing;
pub mod card;
pub mod cards;
pub mod custom;
pub mod dismissals;
pub mod format;
pub mod nudge;
pub mod preferences;
pub mod reminders;
pub mod service;
pub mod status;
pub mod storage;

pub use crate::reminders::{CardReminder, ReminderReason, ReminderTarget, ReminderTypes};
pub use crate::service::{ReminderFeed, WalletService, WalletServiceBuilder};
pub use crate::status::bill_status_message;
