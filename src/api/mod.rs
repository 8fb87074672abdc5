mod auth;
mod body;
mod categories;
mod expenses;
mod params;
mod recurring;
mod summary;

pub(crate) use auth::CallerId;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use axum::{
    routing::{delete, get, put},
    Router,
};
use chrono::NaiveDate;

use crate::db::Database;
use crate::error::{AppError, AppResult};

/// Shared router state. The SQLite connection is the only shared resource.
#[derive(Clone)]
pub(crate) struct AppState {
    db: Arc<Mutex<Database>>,
    today: fn() -> NaiveDate,
}

impl AppState {
    pub(crate) fn new(db: Database) -> Self {
        Self::with_clock(db, local_today)
    }

    pub(crate) fn with_clock(db: Database, today: fn() -> NaiveDate) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            today,
        }
    }

    /// Runs `f` with the connection on the blocking thread pool. A request
    /// that panicked while holding the lock does not lock out later ones.
    pub(crate) async fn with_db<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut Database) -> AppResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let mut guard = db.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut guard)
        })
        .await
        .map_err(|err| AppError::Datastore(anyhow::anyhow!("database task failed: {err}")))?
    }

    pub(crate) fn today(&self) -> NaiveDate {
        (self.today)()
    }
}

fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(api_routes())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/expenses", get(expenses::list).post(expenses::create))
        .route("/api/expenses/total/month", get(summary::total_for_month))
        .route("/api/expenses/total/year", get(summary::total_for_year))
        .route("/api/expenses/monthly", get(summary::monthly_totals))
        .route("/api/expenses/emergency-fund", get(summary::emergency_fund))
        .route(
            "/api/expenses/{id}",
            get(expenses::show)
                .put(expenses::update)
                .delete(expenses::remove),
        )
        .route(
            "/api/categories",
            get(categories::list).post(categories::create),
        )
        .route(
            "/api/categories/{id}",
            put(categories::update).delete(categories::remove),
        )
        .route(
            "/api/recurring-expenses",
            get(recurring::list).post(recurring::create),
        )
        .route("/api/recurring-expenses/{id}", delete(recurring::remove))
}

pub(crate) async fn serve(db: Database, bind: SocketAddr) -> Result<()> {
    let app = router(AppState::new(db));

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    tracing::info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for ctrl-c: {err}");
        return;
    }
    tracing::info!("shutting down");
}

#[cfg(test)]
mod tests;
