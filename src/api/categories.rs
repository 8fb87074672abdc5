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
use super::expenses::{amount_message, valid_amount};
use super::AppState;
use crate::error::{AppError, AppResult, ValidationError, Validator};
use crate::models::Category;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CategoryInput {
    pub(crate) name: Option<String>,
    pub(crate) essential: Option<bool>,
    pub(crate) budget_cap: Option<Decimal>,
    pub(crate) color_code: Option<String>,
}

impl CategoryInput {
    fn into_category(self) -> Result<Category, ValidationError> {
        let mut v = Validator::default();
        let name = self.name.unwrap_or_default().trim().to_string();
        v.check(!name.is_empty(), "name", "is required");
        v.check(name.chars().count() <= 64, "name", "must be at most 64 characters");
        v.check(
            self.budget_cap.map_or(true, valid_amount),
            "budgetCap",
            &amount_message(),
        );
        v.finish()?;

        let mut category = Category::new(name, self.essential.unwrap_or(false));
        category.budget_cap = self.budget_cap;
        category.color_code = self.color_code.unwrap_or_default();
        Ok(category)
    }
}

pub(crate) async fn list(
    State(state): State<AppState>,
    _caller: CallerId,
) -> AppResult<Json<Vec<Category>>> {
    let categories = state.with_db(|db| Ok(db.get_categories()?)).await?;
    Ok(Json(categories))
}

pub(crate) async fn create(
    State(state): State<AppState>,
    caller: CallerId,
    JsonBody(input): JsonBody<CategoryInput>,
) -> AppResult<(StatusCode, Json<Category>)> {
    let category = input.into_category()?;

    let category = state
        .with_db(move |db| {
            let mut category = category;
            if db.get_category_by_name(&category.name)?.is_some() {
                return Err(ValidationError::single("name", "already exists").into());
            }
            category.id = Some(db.insert_category(&category)?);
            Ok(category)
        })
        .await?;
    debug!(user = %caller, name = %category.name, "created category");
    Ok((StatusCode::CREATED, Json(category)))
}

pub(crate) async fn update(
    State(state): State<AppState>,
    _caller: CallerId,
    Path(id): Path<i64>,
    JsonBody(input): JsonBody<CategoryInput>,
) -> AppResult<Json<Category>> {
    let mut category = input.into_category()?;
    category.id = Some(id);

    state
        .with_db(move |db| {
            if db.get_category_by_id(id)?.is_none() {
                return Err(AppError::NotFound("category"));
            }
            if let Some(existing) = db.get_category_by_name(&category.name)? {
                if existing.id != Some(id) {
                    return Err(ValidationError::single("name", "already exists").into());
                }
            }
            if !db.update_category(&category)? {
                return Err(AppError::NotFound("category"));
            }
            Ok(Json(category))
        })
        .await
}

/// Categories still referenced by an expense or recurring expense stay put.
pub(crate) async fn remove(
    State(state): State<AppState>,
    caller: CallerId,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state
        .with_db(move |db| {
            if db.get_category_by_id(id)?.is_none() {
                return Err(AppError::NotFound("category"));
            }
            if db.category_in_use(id)? {
                return Err(
                    ValidationError::single("id", "category is still used by expenses").into(),
                );
            }
            db.delete_category(id)?;
            Ok(())
        })
        .await?;
    debug!(user = %caller, id, "deleted category");
    Ok(StatusCode::NO_CONTENT)
}
