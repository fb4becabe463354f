//! Reminder date expressions.
//!
//! A `#reminder-<expr>` tag schedules a reminder. Supported expressions:
//! `YYYY-MM-DD`, `YYYY-MM` (first of the month), `YYYY` (January 1st), and
//! the yearly template `every-<month>-<day>` resolved to the next
//! occurrence after `from`.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};

use crate::{ObjectError, Result};

/// Resolve a reminder expression to its trigger date.
pub fn next_reminder_date(expr: &str, from: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let invalid = || ObjectError::InvalidReminder(expr.to_string());

    if let Some(rest) = expr.strip_prefix("every-") {
        let mut parts = rest.splitn(2, '-');
        let month: u32 = parts.next().and_then(|s| s.parse().ok()).ok_or_else(invalid)?;
        let day: u32 = parts.next().and_then(|s| s.parse().ok()).ok_or_else(invalid)?;
        let this_year =
            NaiveDate::from_ymd_opt(from.year(), month, day).ok_or_else(invalid)?;
        let date = if this_year > from.date_naive() {
            this_year
        } else {
            NaiveDate::from_ymd_opt(from.year() + 1, month, day).ok_or_else(invalid)?
        };
        return to_utc(date).ok_or_else(invalid);
    }

    let parts: Vec<&str> = expr.split('-').collect();
    let date = match parts.as_slice() {
        [y, m, d] => NaiveDate::from_ymd_opt(
            y.parse().map_err(|_| invalid())?,
            m.parse().map_err(|_| invalid())?,
            d.parse().map_err(|_| invalid())?,
        ),
        [y, m] => NaiveDate::from_ymd_opt(
            y.parse().map_err(|_| invalid())?,
            m.parse().map_err(|_| invalid())?,
            1,
        ),
        [y] => NaiveDate::from_ymd_opt(y.parse().map_err(|_| invalid())?, 1, 1),
        _ => None,
    };
    date.and_then(to_utc).ok_or_else(invalid)
}

fn to_utc(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| Utc.from_utc_datetime(&dt))
}
