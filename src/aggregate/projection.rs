use rust_decimal::Decimal;

use super::{AmountOverflow, MonthlyTotal};

pub(crate) const DEFAULT_FUND_MONTHS: u32 = 6;
pub(crate) const DEFAULT_AVERAGE_MONTHS: u32 = 12;

/// Unrounded monthly average and the fund target derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Projection {
    pub(crate) average: Decimal,
    pub(crate) target: Decimal,
}

/// Mean of the monthly totals, or zero when there are none.
pub(crate) fn average(totals: &[MonthlyTotal]) -> Result<Decimal, AmountOverflow> {
    if totals.is_empty() {
        return Ok(Decimal::ZERO);
    }
    let sum = totals
        .iter()
        .try_fold(Decimal::ZERO, |sum, t| sum.checked_add(t.total_amount))
        .ok_or(AmountOverflow)?;
    sum.checked_div(Decimal::from(totals.len()))
        .ok_or(AmountOverflow)
}

pub(crate) fn project(totals: &[MonthlyTotal], fund_months: u32) -> Result<Projection, AmountOverflow> {
    let average = average(totals)?;
    let target = average
        .checked_mul(Decimal::from(fund_months))
        .ok_or(AmountOverflow)?;
    Ok(Projection { average, target })
}
