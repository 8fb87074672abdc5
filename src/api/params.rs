//! Query-string parsing. Every parameter arrives as raw text so that a bad
//! value becomes a field-level validation message instead of a bare
//! extractor rejection.

use std::fmt::Display;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::Deserialize;

use crate::aggregate::{
    self, range_message, CategoryScope, DateWindow, COVERAGE_MONTHS, DEFAULT_AVERAGE_MONTHS,
    DEFAULT_FUND_MONTHS, MONTHS, YEARS,
};
use crate::error::{ValidationError, Validator};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct MonthQuery {
    pub(crate) month: Option<String>,
    pub(crate) year: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct YearQuery {
    pub(crate) year: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FundQuery {
    pub(crate) fund_months: Option<String>,
    pub(crate) essentials_only: Option<String>,
    pub(crate) average_months: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListQuery {
    /// Format: "YYYY-MM"
    pub(crate) month: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FundParams {
    pub(crate) fund_months: u32,
    pub(crate) average_months: u32,
    pub(crate) scope: CategoryScope,
}

pub(crate) fn month_window(q: &MonthQuery) -> Result<DateWindow, ValidationError> {
    let mut v = Validator::default();
    let month = int_in(&mut v, "month", q.month.as_deref(), None, MONTHS);
    let year = int_in(&mut v, "year", q.year.as_deref(), None, YEARS);
    v.finish()?;
    match (month, year) {
        (Some(month), Some(year)) => aggregate::month_window(month, year),
        _ => Err(ValidationError::single("month", "is required")),
    }
}

pub(crate) fn year_window(q: &YearQuery) -> Result<DateWindow, ValidationError> {
    let mut v = Validator::default();
    let year = int_in(&mut v, "year", q.year.as_deref(), None, YEARS);
    v.finish()?;
    match year {
        Some(year) => aggregate::year_window(year),
        None => Err(ValidationError::single("year", "is required")),
    }
}

pub(crate) fn fund_params(q: &FundQuery) -> Result<FundParams, ValidationError> {
    let mut v = Validator::default();
    let fund_months = int_in(
        &mut v,
        "fundMonths",
        q.fund_months.as_deref(),
        Some(DEFAULT_FUND_MONTHS),
        COVERAGE_MONTHS,
    );
    let average_months = int_in(
        &mut v,
        "averageMonths",
        q.average_months.as_deref(),
        Some(DEFAULT_AVERAGE_MONTHS),
        COVERAGE_MONTHS,
    );
    let essentials_only = flag(&mut v, "essentialsOnly", q.essentials_only.as_deref(), true);
    v.finish()?;
    match (fund_months, average_months, essentials_only) {
        (Some(fund_months), Some(average_months), Some(essentials_only)) => Ok(FundParams {
            fund_months,
            average_months,
            scope: CategoryScope::from_essentials_only(essentials_only),
        }),
        _ => Err(ValidationError::single("fundMonths", "is required")),
    }
}

pub(crate) fn list_window(q: &ListQuery) -> Result<Option<DateWindow>, ValidationError> {
    q.month
        .as_deref()
        .filter(|m| !m.trim().is_empty())
        .map(|m| aggregate::month_key_window(m, "month"))
        .transpose()
}

/// Parses an integer field and checks it against `range`. Missing fields take
/// `default`, or are rejected when there is none.
fn int_in<T>(
    v: &mut Validator,
    field: &'static str,
    raw: Option<&str>,
    default: Option<T>,
    range: RangeInclusive<T>,
) -> Option<T>
where
    T: FromStr + PartialOrd + Display + Copy,
{
    let value = match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => {
            if default.is_none() {
                v.reject(field, "is required");
            }
            return default;
        }
        Some(raw) => match raw.parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                v.reject(field, range_message(&range));
                return None;
            }
        },
    };
    if !range.contains(&value) {
        v.reject(field, range_message(&range));
        return None;
    }
    Some(value)
}

fn flag(v: &mut Validator, field: &'static str, raw: Option<&str>, default: bool) -> Option<bool> {
    match raw.map(|s| s.trim().to_lowercase()).as_deref() {
        None | Some("") => Some(default),
        Some("true" | "1" | "yes") => Some(true),
        Some("false" | "0" | "no") => Some(false),
        Some(_) => {
            v.reject(field, "must be true or false");
            None
        }
    }
}
