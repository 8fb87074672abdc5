use std::ops::RangeInclusive;

use chrono::{Datelike, Months, NaiveDate};

use crate::error::{ValidationError, Validator};

pub(crate) const MONTHS: RangeInclusive<u32> = 1..=12;
pub(crate) const YEARS: RangeInclusive<i32> = 1000..=9999;
/// Bounds for both coverage months and averaging months.
pub(crate) const COVERAGE_MONTHS: RangeInclusive<u32> = 1..=24;

/// Half-open calendar range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    pub(crate) fn start(&self) -> NaiveDate {
        self.start
    }

    /// Inclusive last day of the window.
    pub(crate) fn last_day(&self) -> NaiveDate {
        self.end.pred_opt().unwrap_or(self.start)
    }

    /// First and last day as `YYYY-MM-DD` text for the stored date column,
    /// both inclusive. The exclusive end of a 9999 window would render as
    /// `+10000-01-01` and sort before every stored date.
    pub(crate) fn sql_bounds(&self) -> (String, String) {
        (
            self.start.format("%Y-%m-%d").to_string(),
            self.last_day().format("%Y-%m-%d").to_string(),
        )
    }
}

impl std::fmt::Display for DateWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.start, self.last_day())
    }
}

/// Every day of `month`/`year`.
pub(crate) fn month_window(month: u32, year: i32) -> Result<DateWindow, ValidationError> {
    let mut v = Validator::default();
    check_month(&mut v, month);
    check_year(&mut v, year);
    v.finish()?;

    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| ValidationError::single("month", "not a calendar month"))?;
    let end = start
        .checked_add_months(Months::new(1))
        .ok_or_else(|| ValidationError::single("year", "out of range"))?;
    Ok(DateWindow { start, end })
}

/// January 1st through December 31st of `year`.
pub(crate) fn year_window(year: i32) -> Result<DateWindow, ValidationError> {
    let mut v = Validator::default();
    check_year(&mut v, year);
    v.finish()?;

    let start = NaiveDate::from_ymd_opt(year, 1, 1)
        .ok_or_else(|| ValidationError::single("year", "out of range"))?;
    let end = start
        .checked_add_months(Months::new(12))
        .ok_or_else(|| ValidationError::single("year", "out of range"))?;
    Ok(DateWindow { start, end })
}

/// The `months` complete calendar months before the month containing `today`.
/// The month containing `today` is never part of the window.
pub(crate) fn trailing_months(
    months: u32,
    today: NaiveDate,
    field: &'static str,
) -> Result<DateWindow, ValidationError> {
    if !COVERAGE_MONTHS.contains(&months) {
        return Err(ValidationError::single(field, range_message(&COVERAGE_MONTHS)));
    }
    let end = first_of_month(today);
    let start = end
        .checked_sub_months(Months::new(months))
        .ok_or_else(|| ValidationError::single(field, "reaches before the supported calendar"))?;
    Ok(DateWindow { start, end })
}

/// Parses a `YYYY-MM` month key into the window for that month.
pub(crate) fn month_key_window(key: &str, field: &'static str) -> Result<DateWindow, ValidationError> {
    let parsed = NaiveDate::parse_from_str(&format!("{}-01", key.trim()), "%Y-%m-%d")
        .map_err(|_| ValidationError::single(field, "expected a month in YYYY-MM format"))?;
    month_window(parsed.month(), parsed.year())
        .map_err(|err| ValidationError::single(field, err.to_string()))
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    // Day 1 exists in every month.
    date.with_day(1).unwrap_or(date)
}

fn check_month(v: &mut Validator, month: u32) {
    v.check(MONTHS.contains(&month), "month", &range_message(&MONTHS));
}

fn check_year(v: &mut Validator, year: i32) {
    v.check(YEARS.contains(&year), "year", &range_message(&YEARS));
}

pub(crate) fn range_message<T: std::fmt::Display>(range: &RangeInclusive<T>) -> String {
    format!(
        "must be an integer between {} and {}",
        range.start(),
        range.end()
    )
}
