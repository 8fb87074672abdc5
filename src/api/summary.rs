use axum::{
    extract::{Query, State},
    Json,
};
use tracing::debug;

use super::auth::CallerId;
use super::params::{self, FundQuery, MonthQuery, YearQuery};
use super::AppState;
use crate::aggregate::{
    self,
    format::{self, Data, EmergencyFund, MonthTotal, MonthlyTotals, YearTotal},
    trailing_months, CategoryScope,
};
use crate::error::{AppError, AppResult};

/// Complete months covered by the monthly overview.
const OVERVIEW_MONTHS: u32 = 12;

/// Total spend for one calendar month. A month with no expenses totals 0.
pub(crate) async fn total_for_month(
    State(state): State<AppState>,
    caller: CallerId,
    Query(query): Query<MonthQuery>,
) -> AppResult<Json<Data<MonthTotal>>> {
    let window = params::month_window(&query)?;
    debug!(user = %caller, %window, "total_for_month");

    let total = state
        .with_db(move |db| Ok(aggregate::window_total(db, caller.as_str(), window)?))
        .await?;
    Ok(Json(format::month_total(total)))
}

/// Total spend for one calendar year. A year with no expenses totals 0.
pub(crate) async fn total_for_year(
    State(state): State<AppState>,
    caller: CallerId,
    Query(query): Query<YearQuery>,
) -> AppResult<Json<Data<YearTotal>>> {
    let window = params::year_window(&query)?;
    debug!(user = %caller, %window, "total_for_year");

    let total = state
        .with_db(move |db| Ok(aggregate::window_total(db, caller.as_str(), window)?))
        .await?;
    Ok(Json(format::year_total(total)))
}

/// Per-month totals over the last twelve complete months and their average.
/// Responds 404 when none of those months has spending.
pub(crate) async fn monthly_totals(
    State(state): State<AppState>,
    caller: CallerId,
) -> AppResult<Json<MonthlyTotals>> {
    let window = trailing_months(OVERVIEW_MONTHS, state.today(), "months")?;
    debug!(user = %caller, %window, "monthly_totals");

    let totals = state
        .with_db(move |db| {
            Ok(aggregate::monthly_totals(
                db,
                caller.as_str(),
                window,
                CategoryScope::All,
            )?)
        })
        .await?;
    if totals.is_empty() {
        return Err(AppError::NoData(format!(
            "no expenses recorded between {} and {}",
            window.start(),
            window.last_day()
        )));
    }
    let average = aggregate::average(&totals).map_err(anyhow::Error::from)?;
    Ok(Json(format::monthly_totals(totals, average)))
}

/// Average monthly spend over the trailing `averageMonths` complete months
/// and the fund needed to cover `fundMonths` of it. No data projects zero.
pub(crate) async fn emergency_fund(
    State(state): State<AppState>,
    caller: CallerId,
    Query(query): Query<FundQuery>,
) -> AppResult<Json<Data<EmergencyFund>>> {
    let params = params::fund_params(&query)?;
    let window = trailing_months(params.average_months, state.today(), "averageMonths")?;
    debug!(
        user = %caller,
        %window,
        fund_months = params.fund_months,
        scope = ?params.scope,
        "emergency_fund"
    );

    let projection = state
        .with_db(move |db| {
            Ok(aggregate::emergency_fund(
                db,
                caller.as_str(),
                window,
                params.scope,
                params.fund_months,
            )?)
        })
        .await?;
    Ok(Json(format::emergency_fund(projection)))
}
