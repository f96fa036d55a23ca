pub mod blog;
pub mod traits;
pub mod types;

pub use blog::{extract_vendor_links, BlogScraper};
pub use traits::{PageSource, ScrapeError};
pub use types::ScrapeOptions;
