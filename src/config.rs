use anyhow::{Context, Result};
use std::path::PathBuf;

pub(crate) const DEFAULT_BIND: &str = "127.0.0.1:3000";
const DB_FILE: &str = "fundtrack.db";

/// The database path: the explicit override if given, else `fundtrack.db`
/// in the platform data directory (created if missing).
pub(crate) fn resolve_db_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    let proj_dirs = directories::ProjectDirs::from("com", "fundtrack", "fundtrack")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    Ok(data_dir.join(DB_FILE))
}
