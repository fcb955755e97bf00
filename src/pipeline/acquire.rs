// src/pipeline/acquire.rs

//! Acquisition pass: login, stream retrieval, archival.

use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::{Config, RawEntry};
use crate::services::{Session, StreamFetcher};
use crate::storage::EntryArchive;

/// Authenticate the session according to the login config.
///
/// A rejected login is fatal; the caller aborts the run. With login
/// disabled the run proceeds unauthenticated, which is only useful
/// together with replay input.
pub async fn run_login(session: &Session, config: &Config) -> Result<()> {
    if !config.login.enabled {
        log::warn!("Login disabled; fetching and downloads will likely fail");
        return Ok(());
    }

    if !config.login.credentials.is_complete() {
        return Err(AppError::login(
            "login credentials are not fully configured",
        ));
    }

    if session.login(&config.login.credentials).await? {
        log::info!("Login succeeded");
        Ok(())
    } else {
        Err(AppError::login("portal rejected the login request"))
    }
}

/// Retrieve all currently available raw entries and archive them.
///
/// Any fetch failure fails the whole pass; nothing partial is archived.
pub async fn run_acquire(session: &Session, config: &Config) -> Result<Vec<RawEntry>> {
    let fetcher = StreamFetcher::new(
        session,
        Duration::from_millis(config.fetch.poll_interval_ms),
    );
    let entries = fetcher.fetch_all().await?;

    if entries.is_empty() {
        log::info!("No alerts available");
        return Ok(entries);
    }

    let archive = EntryArchive::new(&config.archive.data_dir);
    let path = archive.save(&entries).await?;
    log::info!(
        "Archived {} raw entries to {}",
        entries.len(),
        path.display()
    );

    Ok(entries)
}
