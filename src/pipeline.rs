//! One run: fetch the page, pull vendor links, resolve IDs, probe each
//! property in page order.

use crate::models::{AvailabilityStatus, LinkRecord, VerificationResult};
use crate::prober::Prober;
use crate::resolver::{resolve, Resolution};
use crate::scrapers::{extract_vendor_links, PageSource, ScrapeError};
use crate::vendor::ApiError;
use thiserror::Error;
use tracing::{error, info, warn};

pub const EXTRACTION_FAILURE: &str = "Could not extract property ID";

/// Process exit codes
pub const EXIT_OK: u8 = 0;
pub const EXIT_PROPERTY_ERRORS: u8 = 1;
pub const EXIT_PAGE_FETCH: u8 = 2;
pub const EXIT_AUTH: u8 = 3;
pub const EXIT_SETUP: u8 = 4;

/// Failures that end a run without a report
#[derive(Debug, Error)]
pub enum RunError {
    #[error("could not fetch source page: {0}")]
    PageFetch(#[from] ScrapeError),

    #[error("vendor rejected credentials after {processed} link(s): {source}")]
    Auth { processed: usize, source: ApiError },
}

impl RunError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::PageFetch(_) => EXIT_PAGE_FETCH,
            Self::Auth { .. } => EXIT_AUTH,
        }
    }
}

/// Every discovered link's result, in page order
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub page_url: String,
    pub results: Vec<VerificationResult>,
}

impl RunReport {
    pub fn count(&self, status: AvailabilityStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    pub fn has_errors(&self) -> bool {
        self.count(AvailabilityStatus::Error) > 0
    }

    /// Results that fail the run: errors, plus unavailable ones when `strict`
    pub fn failing(&self, strict: bool) -> usize {
        let unavailable = if strict {
            self.count(AvailabilityStatus::Unavailable)
        } else {
            0
        };
        self.count(AvailabilityStatus::Error) + unavailable
    }

    pub fn exit_code(&self, strict: bool) -> u8 {
        if self.failing(strict) > 0 {
            EXIT_PROPERTY_ERRORS
        } else {
            EXIT_OK
        }
    }
}

pub struct Verifier<'a> {
    pages: &'a dyn PageSource,
    prober: Prober<'a>,
    vendor_domain: String,
}

impl<'a> Verifier<'a> {
    pub fn new(pages: &'a dyn PageSource, prober: Prober<'a>, vendor_domain: impl Into<String>) -> Self {
        Self {
            pages,
            prober,
            vendor_domain: vendor_domain.into(),
        }
    }

    pub async fn run(&mut self, page_url: &str) -> Result<RunReport, RunError> {
        let html = self.pages.fetch_html(page_url).await.map_err(|e| {
            error!("Failed to fetch blog content via {}: {}", self.pages.source_name(), e);
            e
        })?;

        let links = extract_vendor_links(&html, page_url, &self.vendor_domain);
        if links.is_empty() {
            warn!("No vendor links found on {}", page_url);
        }

        let results = self.verify_links(&links).await?;
        Ok(RunReport {
            page_url: page_url.to_string(),
            results,
        })
    }

    /// Resolves and probes links one at a time; aborts only on rejected credentials
    pub async fn verify_links(&mut self, links: &[LinkRecord]) -> Result<Vec<VerificationResult>, RunError> {
        let currency = self.prober.settings().currency.clone();
        let mut results = Vec::with_capacity(links.len());

        for (i, link) in links.iter().enumerate() {
            info!("[{}/{}] Processing: {}", i + 1, links.len(), link.hyperlink_text);
            info!("URL: {}", link.raw_url);

            let result = match resolve(&link.raw_url) {
                Resolution::Resolved { id, .. } => match self.prober.probe(link, id).await {
                    Ok(result) => result,
                    Err(source) => {
                        error!("Aborting run: {}", source);
                        return Err(RunError::Auth {
                            processed: results.len(),
                            source,
                        });
                    }
                },
                Resolution::Unresolved { url } => {
                    warn!("Skipping - could not extract property ID");
                    VerificationResult::errored(
                        link,
                        None,
                        &currency,
                        Vec::new(),
                        format!("{} from URL: {}", EXTRACTION_FAILURE, url),
                    )
                }
            };
            results.push(result);
        }

        Ok(results)
    }
}
