use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// A sum or product left the range `Decimal` can represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("expense amounts exceed the supported range")]
pub(crate) struct AmountOverflow;

/// Sum of one user's expenses for one calendar month. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MonthlyTotal {
    /// Format: "YYYY-MM"
    pub(crate) month: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub(crate) total_amount: Decimal,
}

/// The calendar-month bucket a date falls into.
pub(crate) fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Buckets `(date, amount)` rows by calendar month, oldest month first.
/// Months whose total is not positive are dropped.
pub(crate) fn group_by_month(
    rows: &[(NaiveDate, Decimal)],
) -> Result<Vec<MonthlyTotal>, AmountOverflow> {
    let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();
    for (date, amount) in rows {
        let total = totals.entry(month_key(*date)).or_insert(Decimal::ZERO);
        *total = total.checked_add(*amount).ok_or(AmountOverflow)?;
    }

    Ok(totals
        .into_iter()
        .filter(|(_, total)| *total > Decimal::ZERO)
        .map(|(month, total_amount)| MonthlyTotal {
            month,
            total_amount,
        })
        .collect())
}

pub(crate) fn sum_amounts(rows: &[(NaiveDate, Decimal)]) -> Result<Decimal, AmountOverflow> {
    rows.iter()
        .try_fold(Decimal::ZERO, |sum, (_, amount)| sum.checked_add(*amount))
        .ok_or(AmountOverflow)
}
