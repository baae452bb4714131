//! Counters for the crawler.
//!
//! Recording goes through the `metrics` facade; without an installed recorder
//! every call is a no-op, so library users opt in by installing their own.

use std::fmt;

/// All metric names used by the crawler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    CatalogRequestsSuccess,
    CatalogRequestsError,
    CatalogListingsFound,
    DetailExtractSuccess,
    DetailExtractError,
    DetailOverlayDismissed,
    SessionsOpened,
    SessionsClosed,
    RetryAttempts,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::CatalogRequestsSuccess => "crawler_catalog_requests_success_total",
            MetricName::CatalogRequestsError => "crawler_catalog_requests_error_total",
            MetricName::CatalogListingsFound => "crawler_catalog_listings_found_total",
            MetricName::DetailExtractSuccess => "crawler_detail_extract_success_total",
            MetricName::DetailExtractError => "crawler_detail_extract_error_total",
            MetricName::DetailOverlayDismissed => "crawler_detail_overlay_dismissed_total",
            MetricName::SessionsOpened => "crawler_sessions_opened_total",
            MetricName::SessionsClosed => "crawler_sessions_closed_total",
            MetricName::RetryAttempts => "crawler_retry_attempts_total",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub mod catalog {
    use super::MetricName;

    pub fn request_success() {
        ::metrics::counter!(MetricName::CatalogRequestsSuccess.as_str()).increment(1);
    }

    pub fn request_error() {
        ::metrics::counter!(MetricName::CatalogRequestsError.as_str()).increment(1);
    }

    pub fn listings_found(count: usize) {
        ::metrics::counter!(MetricName::CatalogListingsFound.as_str()).increment(count as u64);
    }
}

pub mod detail {
    use super::MetricName;

    pub fn extract_success() {
        ::metrics::counter!(MetricName::DetailExtractSuccess.as_str()).increment(1);
    }

    pub fn extract_error(kind: &'static str) {
        ::metrics::counter!(MetricName::DetailExtractError.as_str(), "kind" => kind).increment(1);
    }

    pub fn overlay_dismissed() {
        ::metrics::counter!(MetricName::DetailOverlayDismissed.as_str()).increment(1);
    }

    pub fn session_opened() {
        ::metrics::counter!(MetricName::SessionsOpened.as_str()).increment(1);
    }

    pub fn session_closed() {
        ::metrics::counter!(MetricName::SessionsClosed.as_str()).increment(1);
    }
}

pub fn retry_attempt(label: &'static str) {
    ::metrics::counter!(MetricName::RetryAttempts.as_str(), "operation" => label).increment(1);
}
