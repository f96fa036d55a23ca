use crate::models::LinkRecord;
use crate::scrapers::traits::{PageSource, ScrapeError};
use crate::scrapers::types::ScrapeOptions;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Fetches blog posts over HTTP with browser-like headers
pub struct BlogScraper {
    client: Client,
}

impl BlogScraper {
    pub fn with_options(options: ScrapeOptions) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_secs))
            .user_agent(options.user_agent.as_str())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageSource for BlogScraper {
    async fn fetch_html(&self, url: &str) -> Result<String, ScrapeError> {
        let parsed = Url::parse(url).map_err(|e| ScrapeError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        info!("Fetching blog content from: {}", parsed);

        let response = self
            .client
            .get(parsed)
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
            .send()
            .await
            .map_err(|e| ScrapeError::Fetch {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            warn!("{} returned status: {}", url, response.status());
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let html = response.text().await.map_err(|e| ScrapeError::Fetch {
            url: url.to_string(),
            reason: format!("failed to read response body: {}", e),
        })?;

        debug!("Downloaded {} bytes of HTML", html.len());
        Ok(html)
    }

    fn source_name(&self) -> &'static str {
        "blog"
    }
}

/// Collects every anchor whose target lives on `vendor_domain`, in document order.
/// Relative hrefs are resolved against `page_url`; duplicates are kept.
pub fn extract_vendor_links(html: &str, page_url: &str, vendor_domain: &str) -> Vec<LinkRecord> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let base = Url::parse(page_url).ok();
    let domain = vendor_domain.trim().trim_start_matches('.').to_lowercase();

    let mut links = Vec::new();
    for anchor in document.select(&selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let href = href.trim();

        let target = match &base {
            Some(base) => base.join(href),
            None => Url::parse(href),
        };
        let Ok(target) = target else {
            debug!("Skipping unparseable href: {}", href);
            continue;
        };

        if !is_vendor_host(&target, &domain) {
            continue;
        }

        let text = anchor.text().collect::<Vec<_>>().join(" ");
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");

        // absolute hrefs are kept as written; relative ones need the joined form
        let raw_url = if Url::parse(href).is_ok() {
            href.to_string()
        } else {
            target.to_string()
        };

        links.push(LinkRecord {
            raw_url,
            hyperlink_text: if text.is_empty() { "N/A".to_string() } else { text },
            source_page_url: page_url.to_string(),
        });
    }

    info!("Found {} vendor link(s) on {}", links.len(), page_url);
    links
}

fn is_vendor_host(url: &Url, domain: &str) -> bool {
    if domain.is_empty() {
        return false;
    }
    match url.host_str() {
        Some(host) => {
            let host = host.to_lowercase();
            host == domain || host.ends_with(&format!(".{}", domain))
        }
        None => false,
    }
}
