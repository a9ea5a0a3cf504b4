use chrono::NaiveDate;

use crate::billing::{self, DEFAULT_BILLING_PERIOD_DAYS};

/// One-line billing summary shown on a credit card.
pub fn bill_status_message(
    bill_day: i32,
    billing_period_days: Option<u32>,
    today: NaiveDate,
) -> String {
    let next_statement = billing::next_statement_date(bill_day, today);
    let days_until_statement = billing::days_until(next_statement, today);
    if days_until_statement == 0 {
        return "Next bill today".to_string();
    }

    let due = billing::due_date(bill_day, today, billing_period_days);
    let days_until_due = billing::days_until(due, today);
    if (0..=i64::from(DEFAULT_BILLING_PERIOD_DAYS)).contains(&days_until_due) {
        return format!("Bill may be due by {}", billing::short_date(due));
    }

    format!("Next bill in {days_until_statement} days")
}
