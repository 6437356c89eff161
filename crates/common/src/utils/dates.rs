//! Calendar helpers shared by the HTTP layer and the service layer.
//!
//! Subscription periods travel as `MM-YYYY` (day is always the 1st), while
//! aggregation bounds travel as ISO `YYYY-MM-DD`. Both are kept strict: no
//! unpadded months, no two-digit years.

use chrono::{Datelike, NaiveDate};
use thiserror::Error;

pub const MONTH_YEAR_FORMAT: &str = "MM-YYYY";
pub const ISO_DATE_FORMAT: &str = "YYYY-MM-DD";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid date {input:?} (expected {expected})")]
pub struct DateParseError {
    pub input: String,
    pub expected: &'static str,
}

impl DateParseError {
    fn new(input: &str, expected: &'static str) -> Self {
        Self { input: input.to_string(), expected }
    }
}

/// Parse `MM-YYYY` into the first day of that month.
pub fn parse_month_year(s: &str) -> Result<NaiveDate, DateParseError> {
    let err = || DateParseError::new(s, MONTH_YEAR_FORMAT);
    let (month, year) = s.split_once('-').ok_or_else(err)?;
    if month.len() != 2 || year.len() != 4 || !all_digits(month) || !all_digits(year) {
        return Err(err());
    }
    let month: u32 = month.parse().map_err(|_| err())?;
    let year: i32 = year.parse().map_err(|_| err())?;
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(err)
}

/// Render a date as `MM-YYYY`; the day component is dropped.
pub fn format_month_year(date: NaiveDate) -> String {
    format!("{:02}-{:04}", date.month(), date.year())
}

/// Parse a strict ISO calendar date `YYYY-MM-DD`.
pub fn parse_iso_date(s: &str) -> Result<NaiveDate, DateParseError> {
    let err = || DateParseError::new(s, ISO_DATE_FORMAT);
    let bytes = s.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return Err(err());
    }
    if !all_digits(&s[0..4]) || !all_digits(&s[5..7]) || !all_digits(&s[8..10]) {
        return Err(err());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| err())
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
