use crate::apis::interpark::{build_catalog_url, extract_listing_ids};
use crate::app::ports::HttpClientPort;
use crate::app::retry::{with_retry, RetryPolicy};
use crate::common::error::{CrawlerError, Result};
use crate::common::types::{Category, ListingId};
use crate::config::CrawlerConfig;
use crate::observability::metrics;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Resolves the listings playing on a date from the catalog page
pub struct CatalogResolver {
    http: Arc<dyn HttpClientPort>,
    base_url: String,
    retry: RetryPolicy,
}

impl CatalogResolver {
    pub fn new(http: Arc<dyn HttpClientPort>, base_url: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            retry,
        }
    }

    pub fn from_config(http: Arc<dyn HttpClientPort>, config: &CrawlerConfig) -> Self {
        Self::new(http, config.catalog.base_url.clone(), RetryPolicy::from(&config.retry))
    }

    /// Identifiers of every catalog anchor with a single `GoodsCode`, in page order.
    ///
    /// Duplicates are kept. An empty page is not an error.
    #[instrument(skip(self, category), fields(category = %category))]
    pub async fn resolve(&self, date: NaiveDate, category: Category) -> Result<Vec<ListingId>> {
        let url = build_catalog_url(&self.base_url, category, date);
        let url = url.as_str();
        let body = with_retry(self.retry, "catalog_fetch", move || self.fetch(url)).await?;

        let ids = extract_listing_ids(&body);
        metrics::catalog::listings_found(ids.len());
        info!("Resolved {} listings for {} on {}", ids.len(), category, date);
        Ok(ids)
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        debug!(url, "Fetching catalog page");
        let resp = match self.http.get(url).await {
            Ok(resp) => resp,
            Err(e) => {
                metrics::catalog::request_error();
                return Err(e);
            }
        };

        if !resp.is_success() {
            metrics::catalog::request_error();
            return Err(CrawlerError::Transport(format!(
                "Catalog request returned status {}",
                resp.status
            )));
        }

        metrics::catalog::request_success();
        Ok(resp.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::HttpGetResult;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Replays canned responses and records requested URLs
    struct ScriptedHttp {
        responses: Mutex<Vec<Result<HttpGetResult>>>,
        requested: Mutex<Vec<String>>,
    }

    impl ScriptedHttp {
        fn new(responses: Vec<Result<HttpGetResult>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses),
                requested: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl HttpClientPort for ScriptedHttp {
        async fn get(&self, url: &str) -> Result<HttpGetResult> {
            self.requested.lock().unwrap().push(url.to_string());
            self.responses.lock().unwrap().remove(0)
        }
    }

    fn page(status: u16, body: &str) -> Result<HttpGetResult> {
        Ok(HttpGetResult {
            status,
            body: body.to_string(),
        })
    }

    fn retry(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            backoff: Duration::from_millis(1),
        }
    }

    fn june_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[tokio::test]
    async fn test_resolve_builds_query_and_extracts_ids() {
        let http = ScriptedHttp::new(vec![page(
            200,
            r#"<a href="/Info.asp?GoodsCode=24000001">x</a><a href="/Info.asp?GoodsCode=24000002">y</a>"#,
        )]);
        let resolver = CatalogResolver::new(http.clone(), "http://catalog.test/TPCalendar.asp", retry(1));

        let ids = resolver.resolve(june_first(), Category::Concert).await.unwrap();

        assert_eq!(ids, vec![ListingId::new("24000001"), ListingId::new("24000002")]);
        let requested = http.requested.lock().unwrap();
        assert_eq!(requested.len(), 1);
        assert!(requested[0].contains("KindOfGoods=01003&KindOfFlag=P&PlayDate=20240601"));
    }

    #[tokio::test]
    async fn test_resolve_empty_page_is_ok() {
        let http = ScriptedHttp::new(vec![page(200, "<html><body></body></html>")]);
        let resolver = CatalogResolver::new(http, "http://catalog.test", retry(1));

        let ids = resolver.resolve(june_first(), Category::Musical).await.unwrap();
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_retries_server_errors() {
        let http = ScriptedHttp::new(vec![
            page(503, "busy"),
            page(200, r#"<a href="?GoodsCode=7">x</a>"#),
        ]);
        let resolver = CatalogResolver::new(http.clone(), "http://catalog.test", retry(3));

        let ids = resolver.resolve(june_first(), Category::Musical).await.unwrap();
        assert_eq!(ids, vec![ListingId::new("7")]);
        assert_eq!(http.requested.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_resolve_surfaces_transport_error() {
        let http = ScriptedHttp::new(vec![Err(CrawlerError::Transport("dns".into()))]);
        let resolver = CatalogResolver::new(http, "http://catalog.test", retry(1));

        let err = resolver.resolve(june_first(), Category::Concert).await.unwrap_err();
        assert!(err.is_transient());
    }
}
