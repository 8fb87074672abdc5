use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use super::auth::CallerId;
use super::body::JsonBody;
use super::expenses::{amount_message, ensure_category, parse_date, valid_amount};
use super::AppState;
use crate::error::{AppError, AppResult, ValidationError, Validator};
use crate::models::{Frequency, RecurringExpense};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RecurringInput {
    pub(crate) description: Option<String>,
    pub(crate) amount: Option<Decimal>,
    pub(crate) category_id: Option<i64>,
    pub(crate) frequency: Option<String>,
    pub(crate) start_date: Option<String>,
    pub(crate) end_date: Option<String>,
}

impl RecurringInput {
    fn into_recurring(self, user_id: &str) -> Result<RecurringExpense, ValidationError> {
        let mut v = Validator::default();
        let description = self.description.unwrap_or_default().trim().to_string();
        v.check(!description.is_empty(), "description", "is required");
        v.check(self.amount.is_some_and(valid_amount), "amount", &amount_message());
        v.check(self.category_id.is_some(), "categoryId", "is required");
        let frequency = self.frequency.as_deref().and_then(Frequency::parse);
        if frequency.is_none() {
            let allowed: Vec<&str> = Frequency::all().iter().map(Frequency::as_str).collect();
            v.reject("frequency", format!("must be one of {}", allowed.join(", ")));
        }
        let start = parse_date(&mut v, "startDate", self.start_date.as_deref());
        let end = match self.end_date.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => parse_date(&mut v, "endDate", Some(raw)),
            None => None,
        };
        if let (Some(start), Some(end)) = (start, end) {
            v.check(end >= start, "endDate", "must not be before startDate");
        }
        v.finish()?;

        match (self.amount, self.category_id, frequency, start) {
            (Some(amount), Some(category_id), Some(frequency), Some(start)) => {
                let mut recurring = RecurringExpense::new(
                    user_id.to_string(),
                    description,
                    amount,
                    category_id,
                    frequency,
                    start.to_string(),
                );
                recurring.end_date = end.map(|d| d.to_string());
                Ok(recurring)
            }
            _ => Err(ValidationError::single("amount", "is required")),
        }
    }
}

pub(crate) async fn list(
    State(state): State<AppState>,
    caller: CallerId,
) -> AppResult<Json<Vec<RecurringExpense>>> {
    let recurring = state
        .with_db(move |db| Ok(db.get_recurring(caller.as_str())?))
        .await?;
    Ok(Json(recurring))
}

pub(crate) async fn create(
    State(state): State<AppState>,
    caller: CallerId,
    JsonBody(input): JsonBody<RecurringInput>,
) -> AppResult<(StatusCode, Json<RecurringExpense>)> {
    let mut recurring = input.into_recurring(caller.as_str())?;

    let recurring = state
        .with_db(move |db| {
            ensure_category(db, recurring.category_id)?;
            recurring.id = Some(db.insert_recurring(&recurring)?);
            Ok(recurring)
        })
        .await?;
    debug!(user = %caller, id = ?recurring.id, "created recurring expense");
    Ok((StatusCode::CREATED, Json(recurring)))
}

pub(crate) async fn remove(
    State(state): State<AppState>,
    caller: CallerId,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state
        .with_db(move |db| {
            if !db.delete_recurring(caller.as_str(), id)? {
                return Err(AppError::NotFound("recurring expense"));
            }
            Ok(StatusCode::NO_CONTENT)
        })
        .await
}
