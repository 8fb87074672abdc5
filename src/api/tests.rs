#![allow(clippy::unwrap_used, clippy::panic)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::*;
use crate::error::AppResult;
use crate::models::Expense;

fn april_15th() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, 15).unwrap()
}

fn seed(db: &Database, user: &str, date: &str, amount: Decimal, category: &str) {
    let cat = db.get_category_by_name(category).unwrap().unwrap();
    db.insert_expense(&Expense::new(
        user.into(),
        date.into(),
        "seed".into(),
        amount,
        cat.id.unwrap(),
    ))
    .unwrap();
}

fn app_with(setup: impl FnOnce(&Database)) -> Router {
    let db = Database::open_in_memory().unwrap();
    setup(&db);
    router(AppState::with_clock(db, april_15th))
}

async fn send(app: Router, method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(auth::USER_HEADER, user);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    (status, value)
}

async fn get(app: Router, uri: &str, user: &str) -> (StatusCode, Value) {
    send(app, "GET", uri, Some(user), None).await
}

// ── Identity ──────────────────────────────────────────────────

#[tokio::test]
async fn test_health_needs_no_identity() {
    let (status, body) = send(app_with(|_| {}), "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".into()));
}

#[tokio::test]
async fn test_missing_identity_is_401() {
    let (status, body) = send(
        app_with(|_| {}),
        "GET",
        "/api/expenses/emergency-fund",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = send(app_with(|_| {}), "GET", "/api/expenses", Some("  "), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ── Month / year totals ───────────────────────────────────────

#[tokio::test]
async fn test_total_for_month() {
    let app = app_with(|db| {
        seed(db, "u1", "2024-02-01", dec!(10.10), "Groceries");
        seed(db, "u1", "2024-02-29", dec!(20.205), "Dining Out");
        seed(db, "u1", "2024-03-01", dec!(500), "Groceries");
        seed(db, "u2", "2024-02-10", dec!(999), "Groceries");
    });
    let (status, body) = get(app, "/api/expenses/total/month?month=2&year=2024", "u1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "data": { "totalExpensesForMonth": 30.31 } }));
}

#[tokio::test]
async fn test_total_for_empty_month_is_zero() {
    let (status, body) = get(
        app_with(|_| {}),
        "/api/expenses/total/month?month=7&year=2023",
        "u1",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalExpensesForMonth"].as_f64(), Some(0.0));
}

#[tokio::test]
async fn test_totals_in_the_last_supported_year() {
    let app = app_with(|db| seed(db, "u1", "9999-12-15", dec!(42), "Groceries"));
    let (status, body) = get(
        app.clone(),
        "/api/expenses/total/month?month=12&year=9999",
        "u1",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalExpensesForMonth"].as_f64(), Some(42.0));

    let (status, body) = get(app, "/api/expenses/total/year?year=9999", "u1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalExpensesForYear"].as_f64(), Some(42.0));
}

#[tokio::test]
async fn test_out_of_range_stored_totals_fail_without_breaking_later_requests() {
    let app = app_with(|db| {
        seed(db, "u1", "2024-02-01", Decimal::MAX, "Groceries");
        seed(db, "u1", "2024-02-02", Decimal::MAX, "Groceries");
        seed(db, "u1", "2023-05-01", dec!(12.50), "Groceries");
    });
    let (status, body) = get(
        app.clone(),
        "/api/expenses/total/month?month=2&year=2024",
        "u1",
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal server error");

    let (status, body) = get(app, "/api/expenses/total/year?year=2023", "u1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalExpensesForYear"].as_f64(), Some(12.5));
}

#[tokio::test]
async fn test_panicked_database_task_does_not_lock_out_later_requests() {
    let state = AppState::with_clock(Database::open_in_memory().unwrap(), april_15th);
    let failed = state
        .with_db(|_| -> AppResult<()> { panic!("task blew up") })
        .await;
    assert_eq!(
        failed.unwrap_err().status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );

    let (status, _) = get(router(state), "/api/expenses/total/year?year=2023", "u1").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_total_for_month_validation() {
    let (status, body) = get(
        app_with(|_| {}),
        "/api/expenses/total/month?month=13&year=99999",
        "u1",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["month", "year"]);

    let (status, body) = get(
        app_with(|_| {}),
        "/api/expenses/total/month?month=abc&year=2024",
        "u1",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "month");
}

#[tokio::test]
async fn test_total_for_year() {
    let app = app_with(|db| {
        seed(db, "u1", "2023-01-01", dec!(1), "Groceries");
        seed(db, "u1", "2023-12-31", dec!(2), "Housing");
        seed(db, "u1", "2024-01-01", dec!(4), "Housing");
    });
    let (status, body) = get(app, "/api/expenses/total/year?year=2023", "u1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalExpensesForYear"].as_f64(), Some(3.0));

    let (status, _) = get(app_with(|_| {}), "/api/expenses/total/year", "u1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ── Trailing months ───────────────────────────────────────────

fn scenario(db: &Database) {
    seed(db, "u1", "2024-01-12", dec!(100.00), "Housing");
    seed(db, "u1", "2024-02-12", dec!(200.00), "Utilities");
    seed(db, "u1", "2024-03-12", dec!(0), "Housing");
    // In-progress month, never averaged.
    seed(db, "u1", "2024-04-01", dec!(10000), "Housing");
}

#[tokio::test]
async fn test_monthly_totals_over_last_twelve_months() {
    let (status, body) = get(app_with(scenario), "/api/expenses/monthly", "u1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "totalExpensesByMonth": [
                { "month": "2024-01", "totalAmount": 100.0 },
                { "month": "2024-02", "totalAmount": 200.0 },
            ],
            "averageTotalAmount": 150.0,
        })
    );
}

#[tokio::test]
async fn test_monthly_totals_without_data_is_404() {
    let (status, body) = get(app_with(scenario), "/api/expenses/monthly", "someone-else").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("no expenses"));
}

#[tokio::test]
async fn test_emergency_fund_scenario() {
    let (status, body) = get(
        app_with(scenario),
        "/api/expenses/emergency-fund?averageMonths=3&fundMonths=6",
        "u1",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "data": { "averageTotalAmount": 150.0, "emergencyFund": 900.0 } })
    );
}

#[tokio::test]
async fn test_emergency_fund_essentials_only_by_default() {
    let app = || {
        app_with(|db| {
            seed(db, "u1", "2024-01-12", dec!(100), "Housing");
            seed(db, "u1", "2024-02-12", dec!(300), "Entertainment");
        })
    };

    let (_, body) = get(app(), "/api/expenses/emergency-fund?fundMonths=1", "u1").await;
    assert_eq!(body["data"]["averageTotalAmount"].as_f64(), Some(100.0));
    assert_eq!(body["data"]["emergencyFund"].as_f64(), Some(100.0));

    let (_, body) = get(
        app(),
        "/api/expenses/emergency-fund?fundMonths=1&essentialsOnly=false",
        "u1",
    )
    .await;
    assert_eq!(body["data"]["averageTotalAmount"].as_f64(), Some(200.0));
}

#[tokio::test]
async fn test_emergency_fund_without_data_is_zero_not_error() {
    let (status, body) = get(app_with(|_| {}), "/api/expenses/emergency-fund", "u1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "data": { "averageTotalAmount": 0.0, "emergencyFund": 0.0 } })
    );
}

#[tokio::test]
async fn test_emergency_fund_validation() {
    let (status, body) = get(
        app_with(|_| {}),
        "/api/expenses/emergency-fund?fundMonths=25&averageMonths=0",
        "u1",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"].as_array().unwrap().len(), 2);
}

// ── Expense CRUD ──────────────────────────────────────────────

async fn housing_id(app: &Router) -> i64 {
    let (_, cats) = get(app.clone(), "/api/categories", "u1").await;
    cats.as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == "Housing")
        .unwrap()["id"]
        .as_i64()
        .unwrap()
}

#[tokio::test]
async fn test_expense_lifecycle() {
    let app = app_with(|_| {});
    let housing = housing_id(&app).await;

    let (status, created) = send(
        app.clone(),
        "POST",
        "/api/expenses",
        Some("u1"),
        Some(json!({
            "date": "2024-03-05",
            "description": "Rent",
            "amount": 1200.5,
            "categoryId": housing,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["amount"].as_f64(), Some(1200.5));
    let id = created["id"].as_i64().unwrap();

    let (status, fetched) = get(app.clone(), &format!("/api/expenses/{id}"), "u1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["description"], "Rent");

    let (status, _) = get(app.clone(), &format!("/api/expenses/{id}"), "u2").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, updated) = send(
        app.clone(),
        "PUT",
        &format!("/api/expenses/{id}"),
        Some("u1"),
        Some(json!({
            "date": "2024-03-06",
            "description": "Rent (March)",
            "amount": "1250.00",
            "categoryId": housing,
            "notes": "late fee",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["amount"].as_f64(), Some(1250.0));
    assert_eq!(updated["notes"], "late fee");

    let (_, listed) = get(app.clone(), "/api/expenses?month=2024-03", "u1").await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    let (_, listed) = get(app.clone(), "/api/expenses?month=2024-02", "u1").await;
    assert!(listed.as_array().unwrap().is_empty());

    let (status, _) = send(app.clone(), "DELETE", &format!("/api/expenses/{id}"), Some("u1"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(app, "DELETE", &format!("/api/expenses/{id}"), Some("u1"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_expense_validation() {
    let app = app_with(|_| {});
    let (status, body) = send(
        app.clone(),
        "POST",
        "/api/expenses",
        Some("u1"),
        Some(json!({ "date": "03/05/2024", "amount": -5, "categoryId": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["date", "description", "amount"]);

    let (status, body) = send(
        app,
        "POST",
        "/api/expenses",
        Some("u1"),
        Some(json!({
            "date": "2024-03-05",
            "description": "Ghost",
            "amount": 1,
            "categoryId": 9999,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "categoryId");
}

#[tokio::test]
async fn test_expense_amount_and_year_limits() {
    let app = app_with(|_| {});
    let (status, body) = send(
        app.clone(),
        "POST",
        "/api/expenses",
        Some("u1"),
        Some(json!({
            "date": "2024-03-05",
            "description": "Yacht",
            "amount": 10_000_000_000u64,
            "categoryId": 1,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "amount");

    let (status, body) = send(
        app,
        "POST",
        "/api/expenses",
        Some("u1"),
        Some(json!({
            "date": "0999-03-05",
            "description": "Relic",
            "amount": 1,
            "categoryId": 1,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "date");
}

#[tokio::test]
async fn test_wrongly_typed_body_is_a_field_error() {
    let app = app_with(|_| {});
    let (status, body) = send(
        app.clone(),
        "POST",
        "/api/expenses",
        Some("u1"),
        Some(json!({
            "date": "2024-03-05",
            "description": "Coffee",
            "amount": "abc",
            "categoryId": 1,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "body");
    assert!(body["errors"][0]["message"]
        .as_str()
        .unwrap()
        .contains("amount"));

    let (status, body) = send(
        app.clone(),
        "PUT",
        "/api/categories/1",
        Some("u1"),
        Some(json!({ "name": "Housing", "essential": "yes" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "body");

    let (status, body) = send(
        app,
        "POST",
        "/api/recurring-expenses",
        Some("u1"),
        Some(json!("not an object")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "body");
}

#[tokio::test]
async fn test_list_expenses_bad_month() {
    let (status, body) = get(app_with(|_| {}), "/api/expenses?month=March", "u1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "month");
}

// ── Categories ────────────────────────────────────────────────

#[tokio::test]
async fn test_category_lifecycle() {
    let app = app_with(|_| {});

    let (status, created) = send(
        app.clone(),
        "POST",
        "/api/categories",
        Some("u1"),
        Some(json!({ "name": "Pets", "essential": true, "budgetCap": 80, "colorCode": "#abcdef" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["essential"], true);
    assert_eq!(created["budgetCap"].as_f64(), Some(80.0));
    let id = created["id"].as_i64().unwrap();

    let (status, body) = send(
        app.clone(),
        "POST",
        "/api/categories",
        Some("u1"),
        Some(json!({ "name": "pets" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["message"], "already exists");

    let (status, updated) = send(
        app.clone(),
        "PUT",
        &format!("/api/categories/{id}"),
        Some("u1"),
        Some(json!({ "name": "Pets", "essential": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["essential"], false);
    assert!(updated["budgetCap"].is_null());

    let (status, _) = send(app.clone(), "DELETE", &format!("/api/categories/{id}"), Some("u1"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(app, "PUT", &format!("/api/categories/{id}"), Some("u1"), Some(json!({ "name": "X" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_category_in_use_cannot_be_deleted() {
    let app = app_with(|db| seed(db, "u1", "2024-01-01", dec!(5), "Housing"));
    let housing = housing_id(&app).await;
    let (status, _) = send(app, "DELETE", &format!("/api/categories/{housing}"), Some("u1"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ── Recurring expenses ────────────────────────────────────────

#[tokio::test]
async fn test_recurring_lifecycle() {
    let app = app_with(|_| {});
    let housing = housing_id(&app).await;

    let (status, created) = send(
        app.clone(),
        "POST",
        "/api/recurring-expenses",
        Some("u1"),
        Some(json!({
            "description": "Rent",
            "amount": 1500,
            "categoryId": housing,
            "frequency": "monthly",
            "startDate": "2024-01-01",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["frequency"], "monthly");
    let id = created["id"].as_i64().unwrap();

    let (_, listed) = get(app.clone(), "/api/recurring-expenses", "u1").await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    let (_, listed) = get(app.clone(), "/api/recurring-expenses", "u2").await;
    assert!(listed.as_array().unwrap().is_empty());

    let (status, _) = send(app, "DELETE", &format!("/api/recurring-expenses/{id}"), Some("u1"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_recurring_validation() {
    let (status, body) = send(
        app_with(|_| {}),
        "POST",
        "/api/recurring-expenses",
        Some("u1"),
        Some(json!({
            "description": "Gym",
            "amount": 30,
            "categoryId": 1,
            "frequency": "fortnightly",
            "startDate": "2024-05-01",
            "endDate": "2024-01-01",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["frequency", "endDate"]);
}
