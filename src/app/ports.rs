use crate::common::error::{CrawlerError, Result};
use async_trait::async_trait;
use std::time::{Duration, Instant};

/// Interval between presence checks in [`RenderSession::wait_for`]
pub const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

// Catalog-side port
#[async_trait]
pub trait HttpClientPort: Send + Sync {
    /// Plain GET. Non-2xx responses are returned, not turned into errors.
    async fn get(&self, url: &str) -> Result<HttpGetResult>;
}

#[derive(Clone, Debug)]
pub struct HttpGetResult {
    pub status: u16,
    pub body: String,
}

impl HttpGetResult {
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }
}

/// Reference to an element inside one [`RenderSession`]. Only meaningful to the
/// session that produced it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ElementHandle(String);

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

// Detail-side port: a rendered page owned by a single extraction
#[async_trait]
pub trait RenderSession: Send {
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// First element matching `selector`, if any.
    async fn find(&mut self, selector: &str) -> Result<Option<ElementHandle>>;

    /// Every element matching `selector`, in document order.
    async fn find_all(&mut self, selector: &str) -> Result<Vec<ElementHandle>>;

    /// First descendant of `parent` matching `selector`.
    async fn find_within(
        &mut self,
        parent: &ElementHandle,
        selector: &str,
    ) -> Result<Option<ElementHandle>>;

    async fn click(&mut self, element: &ElementHandle) -> Result<()>;

    /// Visible text of the element.
    async fn text(&mut self, element: &ElementHandle) -> Result<String>;

    async fn attribute(&mut self, element: &ElementHandle, name: &str) -> Result<Option<String>>;

    /// Polls until `selector` is present. An element still absent once `timeout`
    /// elapses is [`CrawlerError::MissingElement`]: the page answered, it just
    /// lacks the element.
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<ElementHandle> {
        let started = Instant::now();
        loop {
            if let Some(element) = self.find(selector).await? {
                return Ok(element);
            }
            if started.elapsed() >= timeout {
                return Err(CrawlerError::missing(selector));
            }
            tokio::time::sleep(WAIT_POLL_INTERVAL.min(timeout)).await;
        }
    }

    /// Releases the underlying browser resources. Called exactly once.
    async fn close(&mut self) -> Result<()>;
}

#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn RenderSession>>;
}
