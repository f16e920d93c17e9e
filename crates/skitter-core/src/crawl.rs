use chrono::Utc;

use crate::error::AppError;
use crate::queue::DedupTracker;
use crate::store::TaskStore;
use crate::traits::{FetchedPage, Fetcher};

/// One crawl step: fetch → record visit → register discovered URLs.
///
/// Generic over all external dependencies via traits, enabling dependency
/// injection and testability without real HTTP or Redis calls.
///
/// Discovered URLs are inserted into the dedup set and the durable URL
/// audit table only — no follow-up task or ready-queue entry is created
/// for them. Follow-up scheduling of discovered links is an extension
/// point, not a current guarantee.
pub struct CrawlService<F, D, S>
where
    F: Fetcher,
    D: DedupTracker,
    S: TaskStore,
{
    fetcher: F,
    tracker: D,
    store: S,
}

impl<F, D, S> CrawlService<F, D, S>
where
    F: Fetcher,
    D: DedupTracker,
    S: TaskStore,
{
    pub fn new(fetcher: F, tracker: D, store: S) -> Self {
        Self {
            fetcher,
            tracker,
            store,
        }
    }

    /// Run one crawl step for a URL.
    ///
    /// 1. Fetch the page
    /// 2. Mark the URL visited (timestamped)
    /// 3. Mark each discovered link in the dedup set and the durable
    ///    URL table
    pub async fn crawl(&self, url: &str) -> Result<FetchedPage, AppError> {
        tracing::info!(%url, "Crawling");
        let page = self.fetcher.fetch(url).await?;
        tracing::debug!(%url, bytes = page.content.len(), links = page.links.len(), "Fetched");

        self.tracker.mark_visited(url, Utc::now()).await?;

        for link in &page.links {
            // Blind insert: membership is not checked first. The set
            // insert is idempotent, the durable record is ON CONFLICT
            // DO NOTHING, so repeats are harmless.
            self.tracker.mark_discovered(link).await?;
            self.store.record_url(link).await?;
        }

        if !page.links.is_empty() {
            tracing::info!(%url, count = page.links.len(), "Registered discovered URLs");
        }

        Ok(page)
    }
}
