use anyhow::{Context, Result};
use std::path::Path;

use crate::aggregate::DateWindow;
use crate::db::Database;
use crate::models::Category;

/// Writes one user's expenses (optionally one window of them) to `path`.
/// Returns the number of rows written, excluding the header.
pub(crate) fn export_to_csv(
    db: &Database,
    user_id: &str,
    window: Option<DateWindow>,
    path: &Path,
) -> Result<usize> {
    let expenses = db.get_expenses(user_id, window)?;
    let categories = db.get_categories()?;

    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    wtr.write_record(["id", "date", "description", "category", "amount", "notes"])?;
    for e in &expenses {
        let category = Category::find_by_id(&categories, e.category_id)
            .map(|c| c.name.as_str())
            .unwrap_or("");
        wtr.write_record([
            e.id.map(|id| id.to_string()).unwrap_or_default().as_str(),
            e.date.as_str(),
            e.description.as_str(),
            category,
            format!("{:.2}", e.amount).as_str(),
            e.notes.as_str(),
        ])?;
    }
    wtr.flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(expenses.len())
}
