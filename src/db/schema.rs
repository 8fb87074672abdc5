pub(crate) const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS categories (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL UNIQUE,
    essential   BOOLEAN NOT NULL DEFAULT 0,
    budget_cap  TEXT,
    color_code  TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS expenses (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id      TEXT NOT NULL,
    date         TEXT NOT NULL,
    description  TEXT NOT NULL,
    amount       TEXT NOT NULL,
    category_id  INTEGER NOT NULL REFERENCES categories(id),
    notes        TEXT NOT NULL DEFAULT '',
    import_hash  TEXT NOT NULL DEFAULT '',
    created_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_expenses_user_date ON expenses(user_id, date);
CREATE INDEX IF NOT EXISTS idx_expenses_category ON expenses(category_id);
CREATE UNIQUE INDEX IF NOT EXISTS idx_expenses_hash_unique ON expenses(user_id, import_hash) WHERE import_hash != '';

CREATE TABLE IF NOT EXISTS recurring_expenses (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id      TEXT NOT NULL,
    description  TEXT NOT NULL,
    amount       TEXT NOT NULL,
    category_id  INTEGER NOT NULL REFERENCES categories(id),
    frequency    TEXT NOT NULL,
    start_date   TEXT NOT NULL,
    end_date     TEXT,
    created_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_recurring_user ON recurring_expenses(user_id);
"#;

pub(crate) const CURRENT_VERSION: i32 = 1;

/// Migrations from version N to N+1, applied in order by `Database::migrate`
/// to databases created at an older version. Each entry is (from_version, sql).
/// Empty while the schema is still at version 1; bump `CURRENT_VERSION` and
/// append here when it changes.
pub(crate) const MIGRATIONS: &[(i32, &str)] = &[];
