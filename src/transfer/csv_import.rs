use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use crate::aggregate::YEARS;
use crate::models::{Category, Expense, MAX_AMOUNT};

/// Column layout: date, description, amount, then an optional category name.
const DATE_COLUMN: usize = 0;
const DESCRIPTION_COLUMN: usize = 1;
const AMOUNT_COLUMN: usize = 2;
const CATEGORY_COLUMN: usize = 3;

const FALLBACK_CATEGORY: &str = "Uncategorized";

pub(crate) struct CsvImporter;

impl CsvImporter {
    /// Read the CSV and return headers + all data rows as strings.
    pub(crate) fn read(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>)> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .has_headers(false)
            .from_path(path)
            .context("Failed to open CSV file")?;

        let mut all_rows: Vec<Vec<String>> = Vec::new();
        for result in rdr.records() {
            let record = result.context("Failed to read CSV record")?;
            all_rows.push(record.iter().map(|s| s.to_string()).collect());
        }

        if all_rows.is_empty() {
            anyhow::bail!("CSV file is empty");
        }

        let first_row = &all_rows[0];
        let looks_like_header = first_row.iter().all(|field| {
            let trimmed = field.trim();
            // Headers typically don't parse as dates or numbers
            Decimal::from_str(trimmed.replace(['$', ','], "").trim()).is_err()
                && NaiveDate::parse_from_str(trimmed, "%m/%d/%Y").is_err()
                && NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").is_err()
        });

        if looks_like_header {
            let headers = all_rows.remove(0);
            Ok((headers, all_rows))
        } else {
            let headers: Vec<String> = (0..first_row.len())
                .map(|i| format!("Column {}", i + 1))
                .collect();
            Ok((headers, all_rows))
        }
    }

    /// Turn data rows into expenses owned by `user_id`. Category names are
    /// matched case-insensitively; unknown or blank names fall back to
    /// "Uncategorized". Negative amounts (bank-export debits) become positive.
    pub(crate) fn parse(
        rows: &[Vec<String>],
        user_id: &str,
        categories: &[Category],
    ) -> Result<Vec<Expense>> {
        let fallback = Category::find_by_name(categories, FALLBACK_CATEGORY)
            .and_then(|c| c.id)
            .with_context(|| format!("Missing '{FALLBACK_CATEGORY}' category"))?;

        let mut expenses = Vec::new();
        let mut seen: HashMap<(String, String, Decimal), u32> = HashMap::new();
        for (i, row) in rows.iter().enumerate() {
            let date_str = column(row, DATE_COLUMN);
            if date_str.is_empty() {
                continue;
            }

            let date = parse_date(&date_str)
                .with_context(|| format!("Row {}: failed to parse date '{}'", i + 1, date_str))?;
            let description = column(row, DESCRIPTION_COLUMN);
            let amount = parse_decimal(&column(row, AMOUNT_COLUMN))
                .with_context(|| format!("Row {}: failed to parse amount", i + 1))?
                .abs();
            if amount > MAX_AMOUNT {
                anyhow::bail!("Row {}: amount {} exceeds {}", i + 1, amount, MAX_AMOUNT);
            }
            let category_name = column(row, CATEGORY_COLUMN);
            let category_id = Category::find_by_name(categories, &category_name)
                .and_then(|c| c.id)
                .unwrap_or(fallback);

            let date = date.format("%Y-%m-%d").to_string();
            // Identical rows in one file are distinct purchases; number them.
            let occurrence = seen
                .entry((date.clone(), description.clone(), amount))
                .or_insert(0);
            let hash = compute_hash(*occurrence, &date, &description, &amount);
            *occurrence += 1;
            let mut expense =
                Expense::new(user_id.to_string(), date, description, amount, category_id);
            expense.import_hash = hash;
            expenses.push(expense);
        }

        Ok(expenses)
    }
}

fn column(row: &[String], idx: usize) -> String {
    row.get(idx).map(|s| s.trim().to_string()).unwrap_or_default()
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    for fmt in &["%Y-%m-%d", "%m/%d/%Y", "%m-%d-%Y", "%m/%d/%y", "%d.%m.%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            if !YEARS.contains(&d.year()) {
                anyhow::bail!("Date out of range: {}", s);
            }
            return Ok(d);
        }
    }
    anyhow::bail!("Could not parse date: {}", s)
}

fn parse_decimal(s: &str) -> Result<Decimal> {
    let cleaned = s
        .replace(['$', ','], "")
        .replace('(', "-")
        .replace(')', "")
        .trim()
        .to_string();
    if cleaned.is_empty() {
        return Ok(Decimal::ZERO);
    }
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_str(&cleaned.replace('"', "")))
        .context(format!("Failed to parse '{}' as decimal", s))
}

/// Stable dedup key. FNV-1a stays identical across Rust releases,
/// unlike `DefaultHasher`.
fn compute_hash(occurrence: u32, date: &str, description: &str, amount: &Decimal) -> String {
    let input = format!("{occurrence}|{date}|{description}|{}", amount.normalize());
    let hash = fnv1a(input.as_bytes());
    format!("{hash:016x}")
}

fn fnv1a(data: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for &byte in data {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[cfg(test)]
#[path = "csv_import_tests.rs"]
mod tests;
