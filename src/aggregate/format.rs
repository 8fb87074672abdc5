use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use super::{MonthlyTotal, Projection};

/// Rounds a money value to cents, halves away from zero.
pub(crate) fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Format a decimal amount with thousand separators and 2 decimal places.
/// e.g. `1234567.89` → `"$1,234,567.89"`
pub(crate) fn format_amount(val: Decimal) -> String {
    let rounded = round_money(val);
    let abs = rounded.abs();
    let formatted = format!("{abs:.2}");
    let mut parts = formatted.split('.');
    let int_part = parts.next().unwrap_or("0");
    let dec_part = parts.next().unwrap_or("00");

    let with_commas: String = int_part
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or(""))
        .collect::<Vec<_>>()
        .join(",");

    if rounded < Decimal::ZERO {
        format!("-${with_commas}.{dec_part}")
    } else {
        format!("${with_commas}.{dec_part}")
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct Data<T> {
    pub(crate) data: T,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MonthTotal {
    #[serde(with = "rust_decimal::serde::float")]
    pub(crate) total_expenses_for_month: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct YearTotal {
    #[serde(with = "rust_decimal::serde::float")]
    pub(crate) total_expenses_for_year: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MonthlyTotals {
    pub(crate) total_expenses_by_month: Vec<MonthlyTotal>,
    #[serde(with = "rust_decimal::serde::float")]
    pub(crate) average_total_amount: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EmergencyFund {
    #[serde(with = "rust_decimal::serde::float")]
    pub(crate) average_total_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub(crate) emergency_fund: Decimal,
}

pub(crate) fn month_total(total: Decimal) -> Data<MonthTotal> {
    Data {
        data: MonthTotal {
            total_expenses_for_month: round_money(total),
        },
    }
}

pub(crate) fn year_total(total: Decimal) -> Data<YearTotal> {
    Data {
        data: YearTotal {
            total_expenses_for_year: round_money(total),
        },
    }
}

pub(crate) fn monthly_totals(totals: Vec<MonthlyTotal>, average: Decimal) -> MonthlyTotals {
    MonthlyTotals {
        total_expenses_by_month: totals
            .into_iter()
            .map(|t| MonthlyTotal {
                total_amount: round_money(t.total_amount),
                month: t.month,
            })
            .collect(),
        average_total_amount: round_money(average),
    }
}

pub(crate) fn emergency_fund(projection: Projection) -> Data<EmergencyFund> {
    Data {
        data: EmergencyFund {
            average_total_amount: round_money(projection.average),
            emergency_fund: round_money(projection.target),
        },
    }
}
