use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "weekly" | "week" => Some(Self::Weekly),
            "monthly" | "month" => Some(Self::Monthly),
            "yearly" | "annual" | "annually" | "year" => Some(Self::Yearly),
            _ => None,
        }
    }

    pub fn all() -> &'static [Frequency] {
        &[Self::Weekly, Self::Monthly, Self::Yearly]
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringExpense {
    pub id: Option<i64>,
    pub user_id: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub category_id: i64,
    pub frequency: Frequency,
    /// Format: "YYYY-MM-DD"
    pub start_date: String,
    pub end_date: Option<String>,
    pub created_at: String,
}

impl RecurringExpense {
    pub fn new(
        user_id: String,
        description: String,
        amount: Decimal,
        category_id: i64,
        frequency: Frequency,
        start_date: String,
    ) -> Self {
        Self {
            id: None,
            user_id,
            description,
            amount,
            category_id,
            frequency,
            start_date,
            end_date: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
