//! Calendar arithmetic for billing cycles.
//!
//! Every date handed out here is a plain calendar day. Day-of-month inputs are clamped into the
//! target month before a date is built, so February and 30-day months never produce an invalid
//! date and an out-of-range day degrades to the first or last day of the month.

use chrono::{Datelike, Days, NaiveDate, NaiveTime};

/// Days between statement generation and payment due date when a card does not say.
pub const DEFAULT_BILLING_PERIOD_DAYS: u32 = 15;
/// Length of one calendar day in Unix milliseconds.
pub const DAY_IN_MS: i64 = 24 * 60 * 60 * 1000;

/// Gregorian leap-year rule.
fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in `month` (1-based) of `year`.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 31,
    }
}

/// Folds an unbounded zero-based month index into `(year, month)` with a 1-based month, so
/// `-1` is December of the previous year and `12` is January of the next.
fn normalize_month(year: i32, month_index: i32) -> (i32, u32) {
    let year = year.saturating_add(month_index.div_euclid(12));
    let month = month_index.rem_euclid(12) as u32 + 1;
    (year, month)
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(if year < 0 {
        NaiveDate::MIN
    } else {
        NaiveDate::MAX
    })
}

fn month_index(date: NaiveDate) -> i32 {
    date.month0() as i32
}

fn add_days(date: NaiveDate, days: u32) -> NaiveDate {
    date.checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MAX)
}

/// The date for `day` in the given zero-based month, clamped to `[1, last day of month]`.
pub fn clamp_day_to_month(year: i32, month_index: i32, day: i32) -> NaiveDate {
    let (year, month) = normalize_month(year, month_index);
    let last = days_in_month(year, month) as i32;
    ymd(year, month, day.clamp(1, last) as u32)
}

/// Occurrence of a monthly `day` on or after `today`.
pub fn next_monthly_occurrence(day: i32, today: NaiveDate) -> NaiveDate {
    let current = clamp_day_to_month(today.year(), month_index(today), day);
    if current >= today {
        current
    } else {
        clamp_day_to_month(today.year(), month_index(today) + 1, day)
    }
}

/// Most recent occurrence of a monthly `day` strictly before `today`.
pub fn previous_monthly_occurrence(day: i32, today: NaiveDate) -> NaiveDate {
    let current = clamp_day_to_month(today.year(), month_index(today), day);
    if current < today {
        current
    } else {
        clamp_day_to_month(today.year(), month_index(today) - 1, day)
    }
}

pub fn next_statement_date(bill_day: i32, today: NaiveDate) -> NaiveDate {
    next_monthly_occurrence(bill_day, today)
}

pub fn previous_statement_date(bill_day: i32, today: NaiveDate) -> NaiveDate {
    previous_monthly_occurrence(bill_day, today)
}

/// Statement generated on or before `today`, i.e. the one that opened the current cycle.
pub fn last_statement_on_or_before(bill_day: i32, today: NaiveDate) -> NaiveDate {
    let current = clamp_day_to_month(today.year(), month_index(today), bill_day);
    if current <= today {
        current
    } else {
        clamp_day_to_month(today.year(), month_index(today) - 1, bill_day)
    }
}

/// Due date produced by a single statement.
pub fn due_date_for_statement(statement: NaiveDate, billing_period_days: Option<u32>) -> NaiveDate {
    add_days(
        statement,
        billing_period_days.unwrap_or(DEFAULT_BILLING_PERIOD_DAYS),
    )
}

/// Payment due date for the current cycle, or the next cycle's once the current one has passed.
pub fn due_date(bill_day: i32, today: NaiveDate, billing_period_days: Option<u32>) -> NaiveDate {
    let last_statement = last_statement_on_or_before(bill_day, today);
    let due = due_date_for_statement(last_statement, billing_period_days);
    if due >= today {
        return due;
    }
    let next_statement = clamp_day_to_month(
        last_statement.year(),
        month_index(last_statement) + 1,
        bill_day,
    );
    due_date_for_statement(next_statement, billing_period_days)
}

/// Most recent due date strictly before `today`.
///
/// That is the due date of the latest statement generated at least `period + 1` days ago. When
/// the period reaches back past the calendar range, [`NaiveDate::MIN`] stands in.
pub fn previous_due_date(
    bill_day: i32,
    today: NaiveDate,
    billing_period_days: Option<u32>,
) -> NaiveDate {
    let period = billing_period_days.unwrap_or(DEFAULT_BILLING_PERIOD_DAYS);
    let Some(latest_statement_day) = today.checked_sub_days(Days::new(u64::from(period) + 1))
    else {
        return NaiveDate::MIN;
    };
    let statement = last_statement_on_or_before(bill_day, latest_statement_day);
    due_date_for_statement(statement, Some(period))
}

/// Parses an `MM/YY` (or `MMYY`) expiry into a zero-based month index.
pub fn extract_expiry_month(expiry: &str) -> Option<u32> {
    let trimmed = expiry.trim();
    let (month, year) = match trimmed.split_once('/') {
        Some((month, year)) => (month, year),
        None if trimmed.len() == 4 && trimmed.is_char_boundary(2) => trimmed.split_at(2),
        None => return None,
    };
    if month.len() != 2
        || year.len() != 2
        || !month.chars().chain(year.chars()).all(|c| c.is_ascii_digit())
    {
        return None;
    }
    let month: u32 = month.parse().ok()?;
    (1..=12).contains(&month).then(|| month - 1)
}

/// Renewal notice in the expiry month, anchored to the statement day.
pub fn next_renewal_date(bill_day: i32, expiry_month_index: u32, today: NaiveDate) -> NaiveDate {
    let this_year = clamp_day_to_month(today.year(), expiry_month_index as i32, bill_day);
    if this_year >= today {
        this_year
    } else {
        clamp_day_to_month(today.year() + 1, expiry_month_index as i32, bill_day)
    }
}

pub fn previous_renewal_date(
    bill_day: i32,
    expiry_month_index: u32,
    today: NaiveDate,
) -> NaiveDate {
    let this_year = clamp_day_to_month(today.year(), expiry_month_index as i32, bill_day);
    if this_year < today {
        this_year
    } else {
        clamp_day_to_month(today.year() - 1, expiry_month_index as i32, bill_day)
    }
}

/// Whole days from `today` until `target`; negative when `target` has passed.
pub fn days_until(target: NaiveDate, today: NaiveDate) -> i64 {
    (target - today).num_days()
}

/// Unix milliseconds of the (UTC) midnight that starts `date`.
pub fn timestamp_ms(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}

/// Short `Jul 15` style label.
pub fn short_date(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn clamps_into_short_months() {
        assert_eq!(clamp_day_to_month(2024, 1, 31), date(2024, 2, 29));
        assert_eq!(clamp_day_to_month(2023, 1, 31), date(2023, 2, 28));
        assert_eq!(clamp_day_to_month(2024, 3, 31), date(2024, 4, 30));
        assert_eq!(clamp_day_to_month(2024, 0, 0), date(2024, 1, 1));
        assert_eq!(clamp_day_to_month(2024, 0, 45), date(2024, 1, 31));
    }

    #[test]
    fn month_index_overflow_rolls_the_year() {
        assert_eq!(clamp_day_to_month(2024, -1, 15), date(2023, 12, 15));
        assert_eq!(clamp_day_to_month(2024, 12, 15), date(2025, 1, 15));
        assert_eq!(clamp_day_to_month(2024, -13, 31), date(2022, 12, 31));
    }

    #[test]
    fn next_statement_is_today_or_later() {
        let today = date(2024, 7, 15);
        assert_eq!(next_statement_date(15, today), today);
        assert_eq!(next_statement_date(14, today), date(2024, 8, 14));
        assert_eq!(next_statement_date(31, date(2024, 1, 31)), date(2024, 1, 31));
        assert_eq!(next_statement_date(31, date(2024, 2, 10)), date(2024, 2, 29));
        assert_eq!(next_statement_date(5, date(2024, 12, 20)), date(2025, 1, 5));
    }

    #[test]
    fn previous_statement_is_strictly_before_today() {
        assert_eq!(previous_statement_date(15, date(2024, 7, 15)), date(2024, 6, 15));
        assert_eq!(previous_statement_date(10, date(2024, 7, 15)), date(2024, 7, 10));
        assert_eq!(previous_statement_date(31, date(2024, 3, 5)), date(2024, 2, 29));
    }

    #[test]
    fn due_date_prefers_current_cycle_until_it_passes() {
        // Statement Feb 1 + 20 days = Feb 21, already passed on Feb 25.
        assert_eq!(due_date(1, date(2024, 2, 25), Some(20)), date(2024, 3, 21));
        // Statement Jul 1 + 15 = Jul 16, still ahead on Jul 10.
        assert_eq!(due_date(1, date(2024, 7, 10), None), date(2024, 7, 16));
        // Statement not yet generated this month; the June cycle is still open.
        assert_eq!(due_date(20, date(2024, 7, 2), None), date(2024, 7, 5));
        assert_eq!(due_date(1, date(2024, 7, 16), None), date(2024, 7, 16));
    }

    #[test]
    fn february_follows_the_gregorian_rule() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(2024, 4), 30);
    }

    #[test]
    fn previous_due_date_is_most_recent_passed_due() {
        assert_eq!(previous_due_date(1, date(2024, 2, 25), Some(20)), date(2024, 2, 21));
        assert_eq!(previous_due_date(1, date(2024, 7, 16), None), date(2024, 6, 16));
        assert_eq!(previous_due_date(20, date(2024, 7, 2), Some(45)), date(2024, 6, 4));
    }

    #[test]
    fn long_billing_periods_resolve_without_scanning() {
        // Statement May 15 2023 + 400 days; the June 2023 statement is due Jul 19 2024.
        assert_eq!(previous_due_date(15, date(2024, 7, 2), Some(400)), date(2024, 6, 18));
        assert_eq!(previous_due_date(15, date(2024, 7, 2), Some(u32::MAX)), NaiveDate::MIN);
        assert_eq!(due_date(15, date(2024, 7, 2), Some(u32::MAX)), NaiveDate::MAX);
    }

    #[test]
    fn expiry_month_parsing() {
        assert_eq!(extract_expiry_month("08/27"), Some(7));
        assert_eq!(extract_expiry_month("1229"), Some(11));
        assert_eq!(extract_expiry_month(" 01/30 "), Some(0));
        assert_eq!(extract_expiry_month("13/27"), None);
        assert_eq!(extract_expiry_month("00/27"), None);
        assert_eq!(extract_expiry_month("8/27"), None);
        assert_eq!(extract_expiry_month("ab/cd"), None);
        assert_eq!(extract_expiry_month(""), None);
        assert_eq!(extract_expiry_month("08/2027"), None);
    }

    #[test]
    fn renewal_rolls_to_next_year_once_passed() {
        let today = date(2024, 9, 10);
        assert_eq!(next_renewal_date(5, 8, today), date(2025, 9, 5));
        assert_eq!(next_renewal_date(15, 8, today), date(2024, 9, 15));
        assert_eq!(previous_renewal_date(5, 8, today), date(2024, 9, 5));
        assert_eq!(previous_renewal_date(15, 8, today), date(2023, 9, 15));
        assert_eq!(next_renewal_date(30, 1, date(2024, 3, 1)), date(2025, 2, 28));
    }

    #[test]
    fn day_differences_are_whole_days() {
        assert_eq!(days_until(date(2024, 7, 15), date(2024, 7, 12)), 3);
        assert_eq!(days_until(date(2024, 3, 31), date(2024, 3, 30)), 1);
        assert_eq!(days_until(date(2024, 2, 21), date(2024, 2, 25)), -4);
    }

    #[test]
    fn timestamps_are_midnight_aligned() {
        let ms = timestamp_ms(date(2024, 7, 15));
        assert_eq!(ms % DAY_IN_MS, 0);
        assert_eq!(timestamp_ms(date(2024, 7, 16)) - ms, DAY_IN_MS);
        assert_eq!(short_date(date(2024, 7, 5)), "Jul 5");
    }

    fn arb_date() -> impl Strategy<Value = NaiveDate> {
        (2000i32..2100, 1u32..=12, 1u32..=31).prop_map(|(y, m, d)| {
            let d = d.min(days_in_month(y, m));
            NaiveDate::from_ymd_opt(y, m, d).unwrap()
        })
    }

    proptest! {
        #[test]
        fn clamp_stays_inside_the_month(year in 1900i32..2200, month in 0i32..12, day in 1i32..=31) {
            let clamped = clamp_day_to_month(year, month, day);
            prop_assert_eq!(clamped.year(), year);
            prop_assert_eq!(clamped.month0() as i32, month);
            let last = days_in_month(year, month as u32 + 1) as i32;
            if day > last {
                prop_assert_eq!(clamped.day() as i32, last);
            } else {
                prop_assert_eq!(clamped.day() as i32, day);
            }
        }

        #[test]
        fn next_statement_never_in_the_past(day in 1i32..=31, today in arb_date()) {
            let next = next_statement_date(day, today);
            prop_assert!(next >= today);
            prop_assert!(days_until(next, today) <= 31);
            prop_assert!(previous_statement_date(day, today) < today);
        }

        #[test]
        fn due_date_grows_with_period_for_a_fixed_statement(
            day in 1i32..=31,
            today in arb_date(),
            period in 1u32..60,
            extra in 0u32..30,
        ) {
            let statement = last_statement_on_or_before(day, today);
            let shorter = due_date_for_statement(statement, Some(period));
            let longer = due_date_for_statement(statement, Some(period + extra));
            prop_assert!(longer >= shorter);
        }

        #[test]
        fn due_date_is_never_behind_today(day in 1i32..=31, today in arb_date(), period in 0u32..2000) {
            prop_assert!(due_date(day, today, Some(period)) >= today);
            let previous = previous_due_date(day, today, Some(period));
            prop_assert!(previous < today);
            // The statement after the one behind `previous` is not yet due.
            let statement = previous - Days::new(u64::from(period));
            let next_statement = next_statement_date(day, statement + Days::new(1));
            prop_assert!(due_date_for_statement(next_statement, Some(period)) >= today);
        }
    }
}
