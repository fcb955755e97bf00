// src/services/stream.rs

//! Stream pagination and deduplication.
//!
//! The portal serves alerts as a paginated, append-style stream that may
//! re-deliver already-seen entries once the reader catches up. The fetcher
//! walks pages until either the server reports no more data or an entry ID
//! repeats, and guarantees the returned entries are unique and in
//! first-seen order.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{RawEntry, StreamPage};
use crate::services::Session;

/// Paginated source of stream pages. Implemented by [`Session`] for the
/// live portal; tests script their own pages.
#[async_trait]
pub trait StreamSource {
    /// One-time view-open call, required before polling.
    async fn open_view(&self) -> Result<()>;

    /// Fetch one page. `retrieve_only` is false for the first page and
    /// true for continuations.
    async fn fetch_page(&self, retrieve_only: bool) -> Result<StreamPage>;
}

#[async_trait]
impl StreamSource for Session {
    async fn open_view(&self) -> Result<()> {
        self.open_stream_view().await
    }

    async fn fetch_page(&self, retrieve_only: bool) -> Result<StreamPage> {
        self.fetch_stream_page(retrieve_only).await
    }
}

/// Drives one full retrieval pass over the alert stream.
pub struct StreamFetcher<'a, S: StreamSource> {
    source: &'a S,
    poll_interval: Duration,
}

impl<'a, S: StreamSource> StreamFetcher<'a, S> {
    /// Create a fetcher with the given inter-poll delay.
    pub fn new(source: &'a S, poll_interval: Duration) -> Self {
        Self {
            source,
            poll_interval,
        }
    }

    /// Retrieve all currently available entries.
    ///
    /// Terminates when the server's more-data flag goes false or when an
    /// entry ID repeats. A repeated ID ends the pass immediately; the
    /// remainder of that page is discarded even if it holds unseen IDs,
    /// matching the portal's observed re-delivery cycle.
    ///
    /// Any page fetch failure (including the first) fails the whole pass;
    /// the caller must discard partial results rather than treat them as
    /// complete.
    pub async fn fetch_all(&self) -> Result<Vec<RawEntry>> {
        self.source.open_view().await?;

        let mut seen: HashSet<String> = HashSet::new();
        let mut collected: Vec<RawEntry> = Vec::new();

        let mut page = self.source.fetch_page(false).await?;
        loop {
            let StreamPage { entries, more_data } = page;
            log::info!("Fetched {} alert(s)", entries.len());

            let mut duplicate = false;
            for entry in entries {
                if seen.insert(entry.id.clone()) {
                    collected.push(entry);
                } else {
                    duplicate = true;
                    break;
                }
            }

            if duplicate {
                log::warn!("Duplicate entry ID detected, ending retrieval");
                break;
            }
            if !more_data {
                break;
            }

            tokio::time::sleep(self.poll_interval).await;
            page = self.source.fetch_page(true).await?;
        }

        Ok(collected)
    }
}
