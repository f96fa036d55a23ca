use async_trait::async_trait;
use thiserror::Error;

/// Failure to retrieve or read the source page; aborts the whole run
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("invalid page URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

/// Anything that can hand back the HTML of a page.
/// The blog scraper fetches over HTTP; tests serve fixtures from memory.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_html(&self, url: &str) -> Result<String, ScrapeError>;

    /// Get the name of the page source
    fn source_name(&self) -> &'static str;
}
