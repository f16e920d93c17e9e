use std::future::Future;

use crate::error::AppError;

/// A fetched page: the raw content plus the URLs discovered in it.
#[derive(Debug, Clone, Default)]
pub struct FetchedPage {
    pub content: String,
    pub links: Vec<String>,
}

impl FetchedPage {
    pub fn new(content: impl Into<String>, links: Vec<String>) -> Self {
        Self {
            content: content.into(),
            links,
        }
    }
}

/// Fetches a page and extracts the links it contains.
///
/// The crawl step treats `content` as opaque; it only forwards `links`
/// to the dedup tracker and the durable store.
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchedPage, AppError>> + Send;
}
