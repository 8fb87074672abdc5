mod schema;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

use crate::aggregate::{CategoryScope, DateWindow};
use crate::models::*;

const EXPENSE_COLUMNS: &str =
    "id, user_id, date, description, amount, category_id, notes, import_hash, created_at";

const WINDOW_AMOUNTS_SQL: &str = "SELECT e.date, e.amount
     FROM expenses e
     WHERE e.user_id = ?1 AND e.date >= ?2 AND e.date <= ?3
     ORDER BY e.date";

const ESSENTIAL_WINDOW_AMOUNTS_SQL: &str = "SELECT e.date, e.amount
     FROM expenses e JOIN categories c ON e.category_id = c.id
     WHERE e.user_id = ?1 AND e.date >= ?2 AND e.date <= ?3 AND c.essential = 1
     ORDER BY e.date";

pub(crate) struct Database {
    conn: Connection,
}

impl Database {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .context("Failed to set database pragmas")?;
        let mut db = Self { conn };
        db.migrate().context("Database migration failed")?;
        db.seed_default_categories()?;
        tracing::info!(path = %path.display(), "database ready");
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let mut db = Self { conn };
        db.migrate()?;
        db.seed_default_categories()?;
        Ok(db)
    }

    fn migrate(&mut self) -> Result<()> {
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            // Fresh database - apply full schema
            self.conn.execute_batch(schema::SCHEMA_V1)?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                self.conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
        }

        Ok(())
    }

    fn seed_default_categories(&mut self) -> Result<()> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(());
        }

        // (name, essential, color)
        let defaults = [
            ("Childcare", true, "#f59e0b"),
            ("Debt Payments", true, "#b91c1c"),
            ("Dining Out", false, "#fb923c"),
            ("Education", false, "#6366f1"),
            ("Entertainment", false, "#a855f7"),
            ("Gifts & Donations", false, "#ec4899"),
            ("Groceries", true, "#22c55e"),
            ("Health & Medical", true, "#ef4444"),
            ("Housing", true, "#0ea5e9"),
            ("Insurance", true, "#14b8a6"),
            ("Personal Care", false, "#f472b6"),
            ("Shopping", false, "#8b5cf6"),
            ("Subscriptions", false, "#64748b"),
            ("Transportation", true, "#eab308"),
            ("Travel", false, "#06b6d4"),
            ("Uncategorized", false, "#6b7280"),
            ("Utilities", true, "#3b82f6"),
        ];

        let tx = self.conn.transaction()?;
        for (name, essential, color) in &defaults {
            tx.execute(
                "INSERT OR IGNORE INTO categories (name, essential, color_code) VALUES (?1, ?2, ?3)",
                params![name, essential, color],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    // ── Categories ────────────────────────────────────────────

    pub(crate) fn get_categories(&self) -> Result<Vec<Category>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, essential, budget_cap, color_code FROM categories ORDER BY name",
        )?;
        let rows = stmt.query_map([], category_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn get_category_by_id(&self, id: i64) -> Result<Option<Category>> {
        let result = self.conn.query_row(
            "SELECT id, name, essential, budget_cap, color_code FROM categories WHERE id = ?1",
            params![id],
            category_from_row,
        );
        match result {
            Ok(c) => Ok(Some(c)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) fn get_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        let result = self.conn.query_row(
            "SELECT id, name, essential, budget_cap, color_code FROM categories
             WHERE name = ?1 COLLATE NOCASE",
            params![name],
            category_from_row,
        );
        match result {
            Ok(c) => Ok(Some(c)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) fn insert_category(&self, cat: &Category) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO categories (name, essential, budget_cap, color_code) VALUES (?1, ?2, ?3, ?4)",
            params![
                cat.name,
                cat.essential,
                cat.budget_cap.map(|c| c.to_string()),
                cat.color_code,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Returns `false` when no category has the given id.
    pub(crate) fn update_category(&self, cat: &Category) -> Result<bool> {
        let id = cat.id.context("Category has no ID")?;
        let changed = self.conn.execute(
            "UPDATE categories SET name = ?1, essential = ?2, budget_cap = ?3, color_code = ?4
             WHERE id = ?5",
            params![
                cat.name,
                cat.essential,
                cat.budget_cap.map(|c| c.to_string()),
                cat.color_code,
                id,
            ],
        )?;
        Ok(changed > 0)
    }

    /// True when any expense or recurring expense still points at the category.
    pub(crate) fn category_in_use(&self, id: i64) -> Result<bool> {
        Ok(self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM expenses WHERE category_id = ?1)
                 OR EXISTS(SELECT 1 FROM recurring_expenses WHERE category_id = ?1)",
            params![id],
            |row| row.get(0),
        )?)
    }

    pub(crate) fn delete_category(&self, id: i64) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM categories WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    // ── Expenses ──────────────────────────────────────────────

    pub(crate) fn insert_expense(&self, expense: &Expense) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO expenses (user_id, date, description, amount, category_id, notes, import_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                expense.user_id,
                expense.date,
                expense.description,
                expense.amount.to_string(),
                expense.category_id,
                expense.notes,
                expense.import_hash,
                expense.created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Inserts a batch in one transaction, skipping rows whose import hash
    /// the same user already has. Returns how many rows were written.
    pub(crate) fn insert_expenses_batch(&mut self, expenses: &[Expense]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let mut count = 0;
        for expense in expenses {
            if !expense.import_hash.is_empty() {
                let exists: bool = tx.query_row(
                    "SELECT EXISTS(SELECT 1 FROM expenses WHERE user_id = ?1 AND import_hash = ?2)",
                    params![expense.user_id, expense.import_hash],
                    |row| row.get(0),
                )?;
                if exists {
                    continue;
                }
            }
            tx.execute(
                "INSERT INTO expenses (user_id, date, description, amount, category_id, notes, import_hash, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    expense.user_id,
                    expense.date,
                    expense.description,
                    expense.amount.to_string(),
                    expense.category_id,
                    expense.notes,
                    expense.import_hash,
                    expense.created_at,
                ],
            )?;
            count += 1;
        }
        tx.commit()?;
        Ok(count)
    }

    /// A user's expenses, newest first, optionally limited to one window.
    pub(crate) fn get_expenses(
        &self,
        user_id: &str,
        window: Option<DateWindow>,
    ) -> Result<Vec<Expense>> {
        let rows = match window {
            Some(w) => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {EXPENSE_COLUMNS} FROM expenses
                     WHERE user_id = ?1 AND date >= ?2 AND date <= ?3
                     ORDER BY date DESC, id DESC"
                ))?;
                let (first, last) = w.sql_bounds();
                let rows = stmt.query_map(params![user_id, first, last], expense_from_row)?;
                rows.collect::<std::result::Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {EXPENSE_COLUMNS} FROM expenses
                     WHERE user_id = ?1
                     ORDER BY date DESC, id DESC"
                ))?;
                let rows = stmt.query_map(params![user_id], expense_from_row)?;
                rows.collect::<std::result::Result<Vec<_>, _>>()?
            }
        };
        Ok(rows)
    }

    /// Looks up an expense owned by `user_id`; other users' rows are invisible.
    pub(crate) fn get_expense(&self, user_id: &str, id: i64) -> Result<Option<Expense>> {
        let result = self.conn.query_row(
            &format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = ?1 AND user_id = ?2"),
            params![id, user_id],
            expense_from_row,
        );
        match result {
            Ok(e) => Ok(Some(e)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Returns `false` when the expense does not exist for its user.
    pub(crate) fn update_expense(&self, expense: &Expense) -> Result<bool> {
        let id = expense.id.context("Expense has no ID")?;
        let changed = self.conn.execute(
            "UPDATE expenses SET date = ?1, description = ?2, amount = ?3, category_id = ?4, notes = ?5
             WHERE id = ?6 AND user_id = ?7",
            params![
                expense.date,
                expense.description,
                expense.amount.to_string(),
                expense.category_id,
                expense.notes,
                id,
                expense.user_id,
            ],
        )?;
        Ok(changed > 0)
    }

    pub(crate) fn delete_expense(&self, user_id: &str, id: i64) -> Result<bool> {
        let changed = self.conn.execute(
            "DELETE FROM expenses WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        Ok(changed > 0)
    }

    pub(crate) fn get_expense_count(&self, user_id: &str) -> Result<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM expenses WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?)
    }

    // ── Recurring expenses ────────────────────────────────────

    pub(crate) fn insert_recurring(&self, r: &RecurringExpense) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO recurring_expenses (user_id, description, amount, category_id, frequency, start_date, end_date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                r.user_id,
                r.description,
                r.amount.to_string(),
                r.category_id,
                r.frequency.as_str(),
                r.start_date,
                r.end_date,
                r.created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub(crate) fn get_recurring(&self, user_id: &str) -> Result<Vec<RecurringExpense>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, description, amount, category_id, frequency, start_date, end_date, created_at
             FROM recurring_expenses WHERE user_id = ?1
             ORDER BY start_date, id",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            let frequency: String = row.get(5)?;
            Ok(RecurringExpense {
                id: Some(row.get(0)?),
                user_id: row.get(1)?,
                description: row.get(2)?,
                amount: decimal_column(row, 3)?,
                category_id: row.get(4)?,
                frequency: Frequency::parse(&frequency).ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(
                        5,
                        Type::Text,
                        format!("unknown frequency '{frequency}'").into(),
                    )
                })?,
                start_date: row.get(6)?,
                end_date: row.get(7)?,
                created_at: row.get(8)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn delete_recurring(&self, user_id: &str, id: i64) -> Result<bool> {
        let changed = self.conn.execute(
            "DELETE FROM recurring_expenses WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        Ok(changed > 0)
    }

    // ── Aggregation ───────────────────────────────────────────

    /// `(date, amount)` for every expense of `user_id` inside `window`,
    /// restricted to essential categories when `scope` asks for it.
    pub(crate) fn get_expense_amounts(
        &self,
        user_id: &str,
        window: DateWindow,
        scope: CategoryScope,
    ) -> Result<Vec<(NaiveDate, Decimal)>> {
        let sql = match scope {
            CategoryScope::All => WINDOW_AMOUNTS_SQL,
            CategoryScope::EssentialOnly => ESSENTIAL_WINDOW_AMOUNTS_SQL,
        };
        let (first, last) = window.sql_bounds();
        let mut stmt = self.conn.prepare_cached(sql)?;
        let rows = stmt.query_map(
            params![user_id, first, last],
            |row| Ok((date_column(row, 0)?, decimal_column(row, 1)?)),
        )?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to read expenses for {window}"))
    }
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    let budget_cap: Option<String> = row.get(3)?;
    Ok(Category {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        essential: row.get(2)?,
        budget_cap: budget_cap
            .map(|raw| {
                Decimal::from_str(&raw)
                    .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))
            })
            .transpose()?,
        color_code: row.get(4)?,
    })
}

fn expense_from_row(row: &Row<'_>) -> rusqlite::Result<Expense> {
    Ok(Expense {
        id: Some(row.get(0)?),
        user_id: row.get(1)?,
        date: row.get(2)?,
        description: row.get(3)?,
        amount: decimal_column(row, 4)?,
        category_id: row.get(5)?,
        notes: row.get(6)?,
        import_hash: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn decimal_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    Decimal::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
