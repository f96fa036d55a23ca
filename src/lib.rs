//! Hotel Link Verifier
//!
//! Checks the hotel affiliate links in a blog post: finds the vendor links,
//! works out which property each one points at, asks the vendor whether it can
//! actually be booked, and writes CSV/JSON reports plus an HTML dashboard.

pub mod config;
pub mod dashboard;
pub mod models;
pub mod pipeline;
pub mod prober;
pub mod report;
pub mod resolver;
pub mod scrapers;
pub mod search;
pub mod vendor;

pub use models::*;
