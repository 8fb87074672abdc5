use rust_decimal::Decimal;
use serde::Serialize;

/// Largest amount a single expense or recurring expense may carry.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: Option<i64>,
    pub user_id: String,
    /// Format: "YYYY-MM-DD"
    pub date: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub category_id: i64,
    pub notes: String,
    #[serde(skip)]
    pub import_hash: String,
    pub created_at: String,
}

impl Expense {
    pub fn new(
        user_id: String,
        date: String,
        description: String,
        amount: Decimal,
        category_id: i64,
    ) -> Self {
        Self {
            id: None,
            user_id,
            date,
            description,
            amount,
            category_id,
            notes: String::new(),
            import_hash: String::new(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
