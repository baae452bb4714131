pub mod catalog_use_case;
pub mod crawl_use_case;
pub mod detail_use_case;
pub mod ports;
pub mod retry;
