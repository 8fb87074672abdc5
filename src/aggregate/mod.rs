//! Monthly and yearly expense aggregation and the emergency-fund projection.
//!
//! The pipeline is: pick a [`DateWindow`], read one user's expense rows inside
//! it, bucket them by calendar month, then average and project. Nothing here
//! is cached; every call reads the datastore afresh.

pub(crate) mod format;
mod group;
mod projection;
mod window;

use anyhow::Result;
use rust_decimal::Decimal;

use crate::db::Database;

pub(crate) use group::{group_by_month, sum_amounts, AmountOverflow, MonthlyTotal};
pub(crate) use projection::{
    average, project, Projection, DEFAULT_AVERAGE_MONTHS, DEFAULT_FUND_MONTHS,
};
pub(crate) use window::{
    month_key_window, month_window, range_message, trailing_months, year_window, DateWindow,
    COVERAGE_MONTHS, MONTHS, YEARS,
};

/// Which categories an aggregation sums over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CategoryScope {
    All,
    EssentialOnly,
}

impl CategoryScope {
    pub(crate) fn from_essentials_only(essentials_only: bool) -> Self {
        if essentials_only {
            Self::EssentialOnly
        } else {
            Self::All
        }
    }
}

/// Total spend for one user inside `window`, unrounded.
pub(crate) fn window_total(db: &Database, user_id: &str, window: DateWindow) -> Result<Decimal> {
    let rows = db.get_expense_amounts(user_id, window, CategoryScope::All)?;
    Ok(sum_amounts(&rows)?)
}

/// Per-month totals for one user inside `window`, oldest first.
pub(crate) fn monthly_totals(
    db: &Database,
    user_id: &str,
    window: DateWindow,
    scope: CategoryScope,
) -> Result<Vec<MonthlyTotal>> {
    let rows = db.get_expense_amounts(user_id, window, scope)?;
    Ok(group_by_month(&rows)?)
}

/// Average monthly spend over `window` scaled to `fund_months` of coverage.
pub(crate) fn emergency_fund(
    db: &Database,
    user_id: &str,
    window: DateWindow,
    scope: CategoryScope,
    fund_months: u32,
) -> Result<Projection> {
    let totals = monthly_totals(db, user_id, window, scope)?;
    Ok(project(&totals, fund_months)?)
}
