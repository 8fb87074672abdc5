use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use super::auth::CallerId;
use super::body::JsonBody;
use super::params::{self, ListQuery};
use super::AppState;
use crate::aggregate::YEARS;
use crate::db::Database;
use crate::error::{AppError, AppResult, ValidationError, Validator};
use crate::models::{Expense, MAX_AMOUNT};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExpenseInput {
    pub(crate) date: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) amount: Option<Decimal>,
    pub(crate) category_id: Option<i64>,
    pub(crate) notes: Option<String>,
}

/// Fields of an expense that passed validation.
struct ValidExpense {
    date: String,
    description: String,
    amount: Decimal,
    category_id: i64,
    notes: String,
}

impl ExpenseInput {
    fn validate(self) -> Result<ValidExpense, ValidationError> {
        let mut v = Validator::default();
        let date = parse_date(&mut v, "date", self.date.as_deref());
        let description = self.description.unwrap_or_default().trim().to_string();
        v.check(!description.is_empty(), "description", "is required");
        let amount = self.amount.unwrap_or(Decimal::NEGATIVE_ONE);
        v.check(valid_amount(amount), "amount", &amount_message());
        v.check(self.category_id.is_some(), "categoryId", "is required");
        v.finish()?;

        match (date, self.category_id) {
            (Some(date), Some(category_id)) => Ok(ValidExpense {
                date: date.to_string(),
                description,
                amount,
                category_id,
                notes: self.notes.unwrap_or_default(),
            }),
            _ => Err(ValidationError::single("date", "is required")),
        }
    }
}

pub(crate) fn valid_amount(amount: Decimal) -> bool {
    (Decimal::ZERO..=MAX_AMOUNT).contains(&amount)
}

pub(crate) fn amount_message() -> String {
    format!("must be a number between 0 and {MAX_AMOUNT}")
}

/// Accepts `YYYY-MM-DD` only, with a four-digit year.
pub(crate) fn parse_date(v: &mut Validator, field: &'static str, raw: Option<&str>) -> Option<NaiveDate> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => {
            v.reject(field, "is required");
            None
        }
        Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) if YEARS.contains(&date.year()) => Some(date),
            _ => {
                v.reject(field, "must be a date in YYYY-MM-DD format");
                None
            }
        },
    }
}

pub(crate) fn ensure_category(db: &Database, category_id: i64) -> AppResult<()> {
    if db.get_category_by_id(category_id)?.is_none() {
        return Err(ValidationError::single("categoryId", "does not match any category").into());
    }
    Ok(())
}

pub(crate) async fn list(
    State(state): State<AppState>,
    caller: CallerId,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Expense>>> {
    let window = params::list_window(&query)?;
    debug!(user = %caller, month = ?query.month, "list expenses");

    let expenses = state
        .with_db(move |db| Ok(db.get_expenses(caller.as_str(), window)?))
        .await?;
    Ok(Json(expenses))
}

pub(crate) async fn show(
    State(state): State<AppState>,
    caller: CallerId,
    Path(id): Path<i64>,
) -> AppResult<Json<Expense>> {
    state
        .with_db(move |db| {
            db.get_expense(caller.as_str(), id)?
                .map(Json)
                .ok_or(AppError::NotFound("expense"))
        })
        .await
}

pub(crate) async fn create(
    State(state): State<AppState>,
    caller: CallerId,
    JsonBody(input): JsonBody<ExpenseInput>,
) -> AppResult<(StatusCode, Json<Expense>)> {
    let valid = input.validate()?;

    let mut expense = Expense::new(
        caller.as_str().to_string(),
        valid.date,
        valid.description,
        valid.amount,
        valid.category_id,
    );
    expense.notes = valid.notes;
    let expense = state
        .with_db(move |db| {
            ensure_category(db, expense.category_id)?;
            expense.id = Some(db.insert_expense(&expense)?);
            Ok(expense)
        })
        .await?;
    debug!(user = %caller, id = ?expense.id, "created expense");
    Ok((StatusCode::CREATED, Json(expense)))
}

pub(crate) async fn update(
    State(state): State<AppState>,
    caller: CallerId,
    Path(id): Path<i64>,
    JsonBody(input): JsonBody<ExpenseInput>,
) -> AppResult<Json<Expense>> {
    let valid = input.validate()?;

    state
        .with_db(move |db| {
            let mut expense = db
                .get_expense(caller.as_str(), id)?
                .ok_or(AppError::NotFound("expense"))?;
            ensure_category(db, valid.category_id)?;
            expense.date = valid.date;
            expense.description = valid.description;
            expense.amount = valid.amount;
            expense.category_id = valid.category_id;
            expense.notes = valid.notes;
            if !db.update_expense(&expense)? {
                return Err(AppError::NotFound("expense"));
            }
            Ok(Json(expense))
        })
        .await
}

pub(crate) async fn remove(
    State(state): State<AppState>,
    caller: CallerId,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    let user = caller.clone();
    state
        .with_db(move |db| {
            if !db.delete_expense(user.as_str(), id)? {
                return Err(AppError::NotFound("expense"));
            }
            Ok(())
        })
        .await?;
    debug!(user = %caller, id, "deleted expense");
    Ok(StatusCode::NO_CONTENT)
}
