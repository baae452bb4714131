#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use ticket_crawler::app::detail_use_case::DetailTimeouts;
use ticket_crawler::app::ports::{HttpClientPort, HttpGetResult};
use ticket_crawler::app::retry::RetryPolicy;
use ticket_crawler::Result;

pub const CATALOG_URL: &str = "http://catalog.test/tiki/special/TPCalendar.asp";
pub const DETAIL_URL: &str = "http://detail.test/goods";

pub const CATALOG_PAGE: &str = include_str!("../fixtures/catalog.html");
pub const DETAIL_PAGE: &str = include_str!("../fixtures/detail.html");
pub const DETAIL_OVERLAY_PAGE: &str = include_str!("../fixtures/detail_overlay.html");
pub const DETAIL_NO_PERIOD_PAGE: &str = include_str!("../fixtures/detail_no_period.html");
pub const DETAIL_SINGLE_DAY_PAGE: &str = include_str!("../fixtures/detail_single_day.html");
pub const DETAIL_NO_PLACE_POPUP_PAGE: &str = include_str!("../fixtures/detail_no_place_popup.html");

/// Serves fixture pages by URL prefix; anything else is a 404.
#[derive(Default)]
pub struct FixtureHttp {
    pages: HashMap<String, &'static str>,
    requested: Mutex<Vec<String>>,
}

impl FixtureHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url_prefix: impl Into<String>, body: &'static str) -> Self {
        self.pages.insert(url_prefix.into(), body);
        self
    }

    pub fn with_listing(self, id: &str, body: &'static str) -> Self {
        self.with_page(format!("{DETAIL_URL}/{id}"), body)
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClientPort for FixtureHttp {
    async fn get(&self, url: &str) -> Result<HttpGetResult> {
        self.requested.lock().unwrap().push(url.to_string());
        let body = self
            .pages
            .iter()
            .find(|(prefix, _)| url.starts_with(prefix.as_str()))
            .map(|(_, body)| *body);
        Ok(match body {
            Some(body) => HttpGetResult {
                status: 200,
                body: body.to_string(),
            },
            None => HttpGetResult {
                status: 404,
                body: "not found".into(),
            },
        })
    }
}

pub fn shared(http: FixtureHttp) -> Arc<FixtureHttp> {
    Arc::new(http)
}

pub fn fast_timeouts() -> DetailTimeouts {
    DetailTimeouts {
        navigation: Duration::from_millis(500),
        interaction: Duration::from_millis(500),
        popup: Duration::from_millis(500),
    }
}

pub fn quick_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        backoff: Duration::from_millis(1),
    }
}
