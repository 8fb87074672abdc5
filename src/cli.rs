use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::aggregate::{
    self, format::format_amount, month_key_window, trailing_months, CategoryScope,
    DEFAULT_AVERAGE_MONTHS, DEFAULT_FUND_MONTHS,
};
use crate::api::{self, CallerId};
use crate::config::{self, DEFAULT_BIND};
use crate::db::Database;
use crate::transfer::{export_to_csv, CsvImporter};

/// Expense tracking and emergency-fund projection
#[derive(Parser)]
#[command(name = "fundtrack")]
#[command(version, about, long_about = None)]
pub(crate) struct Cli {
    /// SQLite database file (default: platform data directory)
    #[arg(long, global = true, env = "FUNDTRACK_DB")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Listen address
        #[arg(long, env = "FUNDTRACK_BIND", default_value = DEFAULT_BIND)]
        bind: SocketAddr,
    },

    /// Print one month's total and the trailing twelve-month average
    Summary {
        #[arg(long, value_parser = parse_user)]
        user: CallerId,

        /// Month as YYYY-MM (default: current month)
        #[arg(long)]
        month: Option<String>,
    },

    /// Print the emergency-fund projection
    Fund {
        #[arg(long, value_parser = parse_user)]
        user: CallerId,

        /// Months of spending the fund should cover
        #[arg(long, default_value_t = DEFAULT_FUND_MONTHS, value_parser = clap::value_parser!(u32).range(1..=24))]
        fund_months: u32,

        /// Complete months to average over
        #[arg(long, default_value_t = DEFAULT_AVERAGE_MONTHS, value_parser = clap::value_parser!(u32).range(1..=24))]
        average_months: u32,

        /// Count every category, not only essential ones
        #[arg(long)]
        all_categories: bool,
    },

    /// Import expenses from a CSV file (date, description, amount[, category])
    Import {
        file: PathBuf,

        #[arg(long, value_parser = parse_user)]
        user: CallerId,
    },

    /// Export expenses to CSV
    Export {
        /// Output file (default: ~/fundtrack-export[-YYYY-MM].csv)
        path: Option<PathBuf>,

        #[arg(long, value_parser = parse_user)]
        user: CallerId,

        /// Only export this month (YYYY-MM)
        #[arg(long)]
        month: Option<String>,
    },
}

fn parse_user(raw: &str) -> std::result::Result<CallerId, String> {
    CallerId::parse(raw)
        .ok_or_else(|| "must be 1-128 characters with no control characters".to_string())
}

impl Cli {
    pub(crate) fn run(self) -> Result<()> {
        let db_path = config::resolve_db_path(self.db)?;
        let mut db = Database::open(&db_path)?;

        match self.command {
            Commands::Serve { bind } => {
                let runtime = tokio::runtime::Builder::new_multi_thread()
                    .enable_all()
                    .build()
                    .context("Failed to start async runtime")?;
                runtime.block_on(api::serve(db, bind))
            }
            Commands::Summary { user, month } => cli_summary(&db, &user, month),
            Commands::Fund {
                user,
                fund_months,
                average_months,
                all_categories,
            } => cli_fund(&db, &user, fund_months, average_months, !all_categories),
            Commands::Import { file, user } => cli_import(&mut db, &user, &file),
            Commands::Export { path, user, month } => cli_export(&db, &user, path, month),
        }
    }
}

fn current_month() -> String {
    chrono::Local::now().format("%Y-%m").to_string()
}

fn cli_summary(db: &Database, user: &CallerId, month: Option<String>) -> Result<()> {
    let month = month.unwrap_or_else(current_month);
    let window = month_key_window(&month, "month")?;
    let total = aggregate::window_total(db, user.as_str(), window)?;

    let today = chrono::Local::now().date_naive();
    let trailing = trailing_months(DEFAULT_AVERAGE_MONTHS, today, "months")?;
    let totals = aggregate::monthly_totals(db, user.as_str(), trailing, CategoryScope::All)?;

    println!("fundtrack: {user}, {month}");
    println!("{}", "─".repeat(40));
    println!("  Month total:      {}", format_amount(total));
    println!("  Expenses on file: {}", db.get_expense_count(user.as_str())?);
    if totals.is_empty() {
        println!("  12-month average: no expenses since {}", trailing.start());
    } else {
        println!(
            "  12-month average: {} ({} months with spending)",
            format_amount(aggregate::average(&totals)?),
            totals.len()
        );
        println!();
        for t in &totals {
            println!("  {:<10} {:>14}", t.month, format_amount(t.total_amount));
        }
    }
    Ok(())
}

fn cli_fund(
    db: &Database,
    user: &CallerId,
    fund_months: u32,
    average_months: u32,
    essentials_only: bool,
) -> Result<()> {
    let today = chrono::Local::now().date_naive();
    let window = trailing_months(average_months, today, "average-months")?;
    let scope = CategoryScope::from_essentials_only(essentials_only);
    let projection = aggregate::emergency_fund(db, user.as_str(), window, scope, fund_months)?;

    let basis = if essentials_only {
        "essential spending"
    } else {
        "all spending"
    };
    println!("Emergency fund for {user} ({basis}, {window})");
    println!("{}", "─".repeat(40));
    println!("  Average monthly:  {}", format_amount(projection.average));
    println!(
        "  {fund_months}-month target: {}",
        format_amount(projection.target)
    );
    Ok(())
}

fn cli_import(db: &mut Database, user: &CallerId, file: &Path) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File not found: {}", file.display());
    }

    let (_headers, rows) = CsvImporter::read(file)?;
    let categories = db.get_categories()?;
    let expenses = CsvImporter::parse(&rows, user.as_str(), &categories)?;
    println!("Parsed {} expenses", expenses.len());

    let count = db.insert_expenses_batch(&expenses)?;
    let dupes = expenses.len() - count;
    println!("Imported {count} new expenses ({dupes} duplicates skipped)");
    Ok(())
}

fn cli_export(
    db: &Database,
    user: &CallerId,
    path: Option<PathBuf>,
    month: Option<String>,
) -> Result<()> {
    let window = month
        .as_deref()
        .map(|m| month_key_window(m, "month"))
        .transpose()?;
    let output_path = path.unwrap_or_else(|| default_export_path(month.as_deref()));

    let count = export_to_csv(db, user.as_str(), window, &output_path)?;
    if count == 0 {
        println!("No expenses to export");
    } else {
        println!("Exported {count} expenses to {}", output_path.display());
    }
    Ok(())
}

fn default_export_path(month: Option<&str>) -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
    let name = match month {
        Some(m) => format!("fundtrack-export-{m}.csv"),
        None => "fundtrack-export.csv".to_string(),
    };
    Path::new(&home).join(name)
}
