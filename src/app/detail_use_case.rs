use crate::apis::interpark::{
    build_detail_url, normalize_poster_url, parse_date_range, parse_region, parse_venue_name,
};
use crate::app::ports::{ElementHandle, RenderSession, SessionFactory};
use crate::app::retry::{with_retry, RetryPolicy};
use crate::common::constants::{
    CASTING_NAME_SELECTOR, OVERLAY_CLOSE_SELECTOR, PERIOD_SELECTOR, PLACE_POPUP_SELECTOR,
    PLACE_POPUP_TEXT_SELECTOR, POSTER_SELECTOR, TITLE_SELECTOR, VENUE_CONTROL_SELECTOR,
};
use crate::common::error::{CrawlerError, ErrorKind, Result};
use crate::common::types::{ListingId, PerformanceRecord};
use crate::config::{CrawlerConfig, DetailConfig};
use crate::observability::metrics;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Per call-site bounds for session operations
#[derive(Debug, Clone, Copy)]
pub struct DetailTimeouts {
    /// Page load until the title is present
    pub navigation: Duration,
    /// Any single lookup, click or read
    pub interaction: Duration,
    /// Place popup appearing after the venue control is clicked
    pub popup: Duration,
}

impl From<&DetailConfig> for DetailTimeouts {
    fn from(config: &DetailConfig) -> Self {
        Self {
            navigation: config.navigation_timeout(),
            interaction: config.interaction_timeout(),
            popup: config.popup_timeout(),
        }
    }
}

/// Extracts a [`PerformanceRecord`] from a listing's rendered detail page.
///
/// Every attempt opens its own session and closes it before returning,
/// whether or not the extraction succeeded.
pub struct DetailExtractor {
    sessions: Arc<dyn SessionFactory>,
    base_url: String,
    timeouts: DetailTimeouts,
    retry: RetryPolicy,
}

impl DetailExtractor {
    pub fn new(
        sessions: Arc<dyn SessionFactory>,
        base_url: impl Into<String>,
        timeouts: DetailTimeouts,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            sessions,
            base_url: base_url.into(),
            timeouts,
            retry,
        }
    }

    pub fn from_config(sessions: Arc<dyn SessionFactory>, config: &CrawlerConfig) -> Self {
        Self::new(
            sessions,
            config.detail.base_url.clone(),
            DetailTimeouts::from(&config.detail),
            RetryPolicy::from(&config.retry),
        )
    }

    /// Extracts the record for `id`. Transient failures are retried with a fresh session.
    #[instrument(skip(self, id), fields(listing = %id))]
    pub async fn extract(&self, id: &ListingId) -> Result<PerformanceRecord> {
        let result = with_retry(self.retry, "detail_extract", move || self.extract_once(id)).await;
        match &result {
            Ok(record) => {
                metrics::detail::extract_success();
                info!(title = %record.title, "Extracted listing");
            }
            Err(e) => {
                metrics::detail::extract_error(match e.kind() {
                    ErrorKind::Transport => "transport",
                    ErrorKind::Structure => "structure",
                    ErrorKind::Usage => "usage",
                });
                warn!(error = %e, "Listing extraction failed");
            }
        }
        result
    }

    async fn extract_once(&self, id: &ListingId) -> Result<PerformanceRecord> {
        // Left unbounded: dropping a half-finished open can strand a remote browser.
        // Factories bound it themselves (the WebDriver client's command timeout).
        let mut session = self.sessions.open().await?;
        metrics::detail::session_opened();

        let outcome = self.extract_from(session.as_mut(), id).await;

        // Teardown runs on every path; a failed close never discards a finished record
        match bounded(self.timeouts.interaction, "closing session", session.close()).await {
            Ok(()) => debug!("Session closed"),
            Err(e) => warn!(error = %e, "Failed to close session cleanly"),
        }
        metrics::detail::session_closed();

        outcome
    }

    async fn extract_from(
        &self,
        session: &mut dyn RenderSession,
        id: &ListingId,
    ) -> Result<PerformanceRecord> {
        let url = build_detail_url(&self.base_url, id);
        let nav = self.timeouts.navigation;
        bounded(nav, "navigation", session.navigate(&url)).await?;
        self.wait_present(session, TITLE_SELECTOR, nav, "page render")
            .await?;

        if self.dismiss_overlay(session).await {
            metrics::detail::overlay_dismissed();
        }

        let title = self.required_text(session, TITLE_SELECTOR).await?;
        let poster = self.required(session, POSTER_SELECTOR).await?;
        let poster_src = self
            .interact("reading poster", session.attribute(&poster, "src"))
            .await?;

        let venue_control = self.required(session, VENUE_CONTROL_SELECTOR).await?;
        let venue_text = self
            .interact("reading venue", session.text(&venue_control))
            .await?;
        let venue_name = parse_venue_name(&venue_text)?;

        let cast_names = self.cast_names(session).await?;
        let region = self.region(session, &venue_control).await?;

        let period = self.required_text(session, PERIOD_SELECTOR).await?;
        let date_range = parse_date_range(&period)?;

        Ok(PerformanceRecord {
            title,
            poster_url: normalize_poster_url(poster_src),
            venue_name,
            region,
            cast_names,
            date_range,
        })
    }

    /// Closes the promotional overlay if one is showing. Returns whether a close was performed.
    ///
    /// Never fails: the overlay is absent on most listings.
    pub async fn dismiss_overlay(&self, session: &mut dyn RenderSession) -> bool {
        let control = match self.interact("finding overlay", session.find(OVERLAY_CLOSE_SELECTOR)).await {
            Ok(Some(control)) => control,
            Ok(None) => {
                debug!("No overlay to dismiss");
                return false;
            }
            Err(e) => {
                debug!(error = %e, "Overlay lookup failed, continuing");
                return false;
            }
        };

        match self.interact("dismissing overlay", session.click(&control)).await {
            Ok(()) => {
                debug!("Dismissed overlay");
                true
            }
            Err(e) => {
                debug!(error = %e, "Overlay click failed, continuing");
                false
            }
        }
    }

    async fn cast_names(&self, session: &mut dyn RenderSession) -> Result<Vec<String>> {
        let elements = self
            .interact("finding cast", session.find_all(CASTING_NAME_SELECTOR))
            .await?;
        let mut names = Vec::with_capacity(elements.len());
        for element in &elements {
            let name = self.interact("reading cast", session.text(element)).await?;
            let name = name.trim();
            if !name.is_empty() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    /// Opens the place popup from the venue control and reads its leading word.
    async fn region(
        &self,
        session: &mut dyn RenderSession,
        venue_control: &ElementHandle,
    ) -> Result<String> {
        self.interact("opening place popup", session.click(venue_control))
            .await?;
        let popup = self
            .wait_present(session, PLACE_POPUP_SELECTOR, self.timeouts.popup, "place popup")
            .await?;
        let span = self
            .interact(
                "finding place text",
                session.find_within(&popup, PLACE_POPUP_TEXT_SELECTOR),
            )
            .await?
            .ok_or_else(|| {
                CrawlerError::missing(&format!("{PLACE_POPUP_SELECTOR} {PLACE_POPUP_TEXT_SELECTOR}"))
            })?;
        let text = self.interact("reading place text", session.text(&span)).await?;
        parse_region(&text)
    }

    /// Waits up to `limit` for `selector`. An absent element is `MissingElement`;
    /// `Timeout` is kept for a lookup command that itself stalls.
    async fn wait_present(
        &self,
        session: &mut dyn RenderSession,
        selector: &str,
        limit: Duration,
        operation: &str,
    ) -> Result<ElementHandle> {
        bounded(
            limit + self.timeouts.interaction,
            operation,
            session.wait_for(selector, limit),
        )
        .await
    }

    async fn required(&self, session: &mut dyn RenderSession, selector: &str) -> Result<ElementHandle> {
        self.interact("finding element", session.find(selector))
            .await?
            .ok_or_else(|| CrawlerError::missing(selector))
    }

    async fn required_text(&self, session: &mut dyn RenderSession, selector: &str) -> Result<String> {
        let element = self.required(session, selector).await?;
        self.interact("reading text", session.text(&element)).await
    }

    async fn interact<T>(
        &self,
        operation: &str,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        bounded(self.timeouts.interaction, operation, fut).await
    }
}

/// Runs `fut` with a deadline, mapping expiry to [`CrawlerError::Timeout`].
async fn bounded<T>(
    limit: Duration,
    operation: &str,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(CrawlerError::Timeout {
            operation: operation.to_string(),
            millis: limit.as_millis() as u64,
        }),
    }
}
