pub mod apis;
pub mod common;
pub mod config;
pub mod logging;
pub mod observability;

// Use cases and the ports they drive, plus their transport adapters
pub mod app;
pub mod infra;

pub use app::catalog_use_case::CatalogResolver;
pub use app::crawl_use_case::CrawlUseCase;
pub use app::detail_use_case::DetailExtractor;
pub use common::error::{CrawlerError, Result};
pub use common::types::{Category, DateRange, ListingId, PerformanceRecord};
