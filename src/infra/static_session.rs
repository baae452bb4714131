//! Render session over a fetched, already rendered document.
//!
//! Nothing executes scripts here: the document is parsed once per call with
//! `scraper` and never changes, so popups must already be in the markup.
//! Useful for saved page snapshots and as the deterministic session in tests.

use crate::app::ports::{ElementHandle, HttpClientPort, RenderSession, SessionFactory};
use crate::common::error::{CrawlerError, Result};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Counters shared by every session a factory opens.
#[derive(Debug, Default)]
pub struct SessionStats {
    opened: AtomicUsize,
    closed: AtomicUsize,
    clicks: AtomicUsize,
}

impl SessionStats {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn clicks(&self) -> usize {
        self.clicks.load(Ordering::SeqCst)
    }

    /// Sessions opened but not yet closed
    pub fn open_sessions(&self) -> usize {
        self.opened().saturating_sub(self.closed())
    }
}

pub struct StaticHtmlSessionFactory {
    http: Arc<dyn HttpClientPort>,
    stats: Arc<SessionStats>,
}

impl StaticHtmlSessionFactory {
    pub fn new(http: Arc<dyn HttpClientPort>) -> Self {
        Self {
            http,
            stats: Arc::new(SessionStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<SessionStats> {
        self.stats.clone()
    }
}

#[async_trait]
impl SessionFactory for StaticHtmlSessionFactory {
    async fn open(&self) -> Result<Box<dyn RenderSession>> {
        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StaticHtmlSession {
            http: self.http.clone(),
            stats: self.stats.clone(),
            source: None,
            handles: Vec::new(),
            closed: false,
        }))
    }
}

/// One step of an element path: the `index`-th match of `selector` below the previous step.
#[derive(Debug, Clone)]
struct Step {
    selector: String,
    index: usize,
}

pub struct StaticHtmlSession {
    http: Arc<dyn HttpClientPort>,
    stats: Arc<SessionStats>,
    source: Option<String>,
    // Handle ids index into this table
    handles: Vec<Vec<Step>>,
    closed: bool,
}

impl StaticHtmlSession {
    fn document(&self) -> Result<Html> {
        if self.closed {
            return Err(CrawlerError::Transport("session is closed".into()));
        }
        let source = self
            .source
            .as_deref()
            .ok_or_else(|| CrawlerError::Transport("no page loaded".into()))?;
        Ok(Html::parse_document(source))
    }

    fn path(&self, handle: &ElementHandle) -> Result<Vec<Step>> {
        handle
            .id()
            .parse::<usize>()
            .ok()
            .and_then(|i| self.handles.get(i))
            .cloned()
            .ok_or_else(|| CrawlerError::Transport(format!("unknown element handle {}", handle.id())))
    }

    fn register(&mut self, path: Vec<Step>) -> ElementHandle {
        self.handles.push(path);
        ElementHandle::new((self.handles.len() - 1).to_string())
    }

    /// Number of matches of `selector` below `parent` (or the whole document).
    fn count_matches(&self, parent: &[Step], selector: &str) -> Result<usize> {
        let document = self.document()?;
        let selector = parse_selector(selector)?;
        let count = match resolve(&document, parent)? {
            Some(element) => element.select(&selector).count(),
            None => 0,
        };
        Ok(count)
    }

    fn with_element<T>(
        &self,
        handle: &ElementHandle,
        f: impl FnOnce(ElementRef<'_>) -> T,
    ) -> Result<T> {
        let path = self.path(handle)?;
        let document = self.document()?;
        let element = resolve(&document, &path)?
            .ok_or_else(|| CrawlerError::MissingElement(describe(&path)))?;
        Ok(f(element))
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| CrawlerError::Config(format!("Invalid selector '{selector}': {e:?}")))
}

fn resolve<'a>(document: &'a Html, path: &[Step]) -> Result<Option<ElementRef<'a>>> {
    let mut current = document.root_element();
    for step in path {
        let selector = parse_selector(&step.selector)?;
        match current.select(&selector).nth(step.index) {
            Some(element) => current = element,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

fn describe(path: &[Step]) -> String {
    path.iter()
        .map(|step| format!("{}[{}]", step.selector, step.index))
        .collect::<Vec<_>>()
        .join(" > ")
}

/// Text content with whitespace runs collapsed, the way a browser reports it.
fn visible_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl RenderSession for StaticHtmlSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        if self.closed {
            return Err(CrawlerError::Transport("session is closed".into()));
        }
        let resp = self.http.get(url).await?;
        if !resp.is_success() {
            return Err(CrawlerError::Transport(format!(
                "GET {url} returned status {}",
                resp.status
            )));
        }
        debug!(url, bytes = resp.body.len(), "Loaded static page");
        self.source = Some(resp.body);
        self.handles.clear();
        Ok(())
    }

    async fn find(&mut self, selector: &str) -> Result<Option<ElementHandle>> {
        if self.count_matches(&[], selector)? == 0 {
            return Ok(None);
        }
        let step = Step {
            selector: selector.to_string(),
            index: 0,
        };
        Ok(Some(self.register(vec![step])))
    }

    async fn find_all(&mut self, selector: &str) -> Result<Vec<ElementHandle>> {
        let count = self.count_matches(&[], selector)?;
        Ok((0..count)
            .map(|index| {
                self.register(vec![Step {
                    selector: selector.to_string(),
                    index,
                }])
            })
            .collect())
    }

    async fn find_within(
        &mut self,
        parent: &ElementHandle,
        selector: &str,
    ) -> Result<Option<ElementHandle>> {
        let mut path = self.path(parent)?;
        if self.count_matches(&path, selector)? == 0 {
            return Ok(None);
        }
        path.push(Step {
            selector: selector.to_string(),
            index: 0,
        });
        Ok(Some(self.register(path)))
    }

    async fn click(&mut self, element: &ElementHandle) -> Result<()> {
        // Only checks the target still exists; the document itself never changes
        self.with_element(element, |_| ())?;
        self.stats.clicks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn text(&mut self, element: &ElementHandle) -> Result<String> {
        self.with_element(element, visible_text)
    }

    async fn attribute(&mut self, element: &ElementHandle, name: &str) -> Result<Option<String>> {
        self.with_element(element, |e| e.value().attr(name).map(str::to_string))
    }

    async fn wait_for(&mut self, selector: &str, _timeout: Duration) -> Result<ElementHandle> {
        // A static document cannot change, so a single check is enough
        self.find(selector)
            .await?
            .ok_or_else(|| CrawlerError::missing(selector))
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Err(CrawlerError::Transport("session already closed".into()));
        }
        self.closed = true;
        self.source = None;
        self.handles.clear();
        self.stats.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::HttpGetResult;

    struct OnePage(&'static str);

    #[async_trait]
    impl HttpClientPort for OnePage {
        async fn get(&self, _url: &str) -> Result<HttpGetResult> {
            Ok(HttpGetResult {
                status: 200,
                body: self.0.to_string(),
            })
        }
    }

    const PAGE: &str = r#"
        <html><body>
          <ul class="cast"><li class="name"> Kim  Min </li><li class="name">Lee</li></ul>
          <div class="popup"><span>Seoul Jung-gu</span><span>other</span></div>
          <img class="poster" src="/p.jpg">
        </body></html>
    "#;

    async fn session() -> (Box<dyn RenderSession>, Arc<SessionStats>) {
        let factory = StaticHtmlSessionFactory::new(Arc::new(OnePage(PAGE)));
        let mut session = factory.open().await.unwrap();
        session.navigate("http://page.test").await.unwrap();
        (session, factory.stats())
    }

    #[tokio::test]
    async fn test_find_all_and_text() {
        let (mut session, _) = session().await;
        let names = session.find_all(".name").await.unwrap();
        assert_eq!(names.len(), 2);
        assert_eq!(session.text(&names[0]).await.unwrap(), "Kim Min");
        assert_eq!(session.text(&names[1]).await.unwrap(), "Lee");
        assert!(session.find(".missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_within_and_attribute() {
        let (mut session, _) = session().await;
        let popup = session.find(".popup").await.unwrap().unwrap();
        let span = session.find_within(&popup, "span").await.unwrap().unwrap();
        assert_eq!(session.text(&span).await.unwrap(), "Seoul Jung-gu");

        let poster = session.find(".poster").await.unwrap().unwrap();
        assert_eq!(session.attribute(&poster, "src").await.unwrap().as_deref(), Some("/p.jpg"));
        assert_eq!(session.attribute(&poster, "alt").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_click_and_close_are_counted() {
        let (mut session, stats) = session().await;
        let popup = session.find(".popup").await.unwrap().unwrap();
        session.click(&popup).await.unwrap();
        assert_eq!(stats.clicks(), 1);

        session.close().await.unwrap();
        assert_eq!(stats.closed(), 1);
        assert_eq!(stats.open_sessions(), 0);
        assert!(session.close().await.is_err());
        assert!(session.find(".popup").await.is_err());
    }

    #[tokio::test]
    async fn test_wait_for_absent_selector_is_missing_element() {
        let (mut session, _) = session().await;
        let err = session
            .wait_for(".never", Duration::from_millis(5))
            .await
            .unwrap_err();
        assert!(matches!(err, CrawlerError::MissingElement(ref selector) if selector == ".never"));
        assert!(!err.is_transient());
    }
}
