//! Render session driving a real browser through the W3C WebDriver protocol
//! (chromedriver, geckodriver or a Selenium grid).

use crate::app::ports::{ElementHandle, RenderSession, SessionFactory};
use crate::common::error::{CrawlerError, Result};
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Key under which WebDriver returns element references
const ELEMENT_KEY: &str = "element-6066-11e4-a52f-4f8b0c2b9d6f";

const NO_SUCH_ELEMENT: &str = "no such element";

pub struct WebDriverSessionFactory {
    client: reqwest::Client,
    endpoint: String,
    headless: bool,
}

impl WebDriverSessionFactory {
    pub fn new(endpoint: &str, headless: bool, command_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(command_timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            headless,
        })
    }

    fn capabilities(&self) -> Value {
        let mut args = vec!["--disable-gpu", "--window-size=1280,2000"];
        if self.headless {
            args.push("--headless=new");
        }
        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": { "args": args }
                }
            }
        })
    }
}

#[async_trait]
impl SessionFactory for WebDriverSessionFactory {
    async fn open(&self) -> Result<Box<dyn RenderSession>> {
        let url = format!("{}/session", self.endpoint);
        let resp = self.client.post(&url).json(&self.capabilities()).send().await?;
        let status = resp.status();
        let payload = resp.json::<Value>().await?;
        if !status.is_success() {
            return Err(wire_error("new session", status, &payload));
        }

        let session_id = payload["value"]["sessionId"]
            .as_str()
            .ok_or_else(|| CrawlerError::Transport("new session response has no sessionId".into()))?
            .to_string();
        info!(session_id = %session_id, "Opened WebDriver session");

        Ok(Box::new(WebDriverSession {
            client: self.client.clone(),
            base: format!("{}/session/{}", self.endpoint, session_id),
            session_id,
            closed: false,
        }))
    }
}

pub struct WebDriverSession {
    client: reqwest::Client,
    base: String,
    session_id: String,
    closed: bool,
}

impl WebDriverSession {
    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<(StatusCode, Value)> {
        if self.closed {
            return Err(CrawlerError::Transport("session is closed".into()));
        }
        let url = format!("{}{}", self.base, path);
        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let resp = request.send().await?;
        let status = resp.status();
        let payload = resp.json::<Value>().await?;
        Ok((status, payload))
    }

    /// Runs a command and returns its `value`, turning protocol errors into transport errors.
    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let (status, mut payload) = self.send(method, path, body).await?;
        if !status.is_success() {
            return Err(wire_error(path, status, &payload));
        }
        Ok(payload.get_mut("value").map(Value::take).unwrap_or(Value::Null))
    }

    /// Element lookup where "no such element" is an answer rather than an error.
    async fn lookup(&self, path: &str, selector: &str) -> Result<Option<ElementHandle>> {
        let body = json!({ "using": "css selector", "value": selector });
        let (status, payload) = self.send(Method::POST, path, Some(body)).await?;
        if payload["value"]["error"].as_str() == Some(NO_SUCH_ELEMENT) {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(wire_error(path, status, &payload));
        }
        element_handle(&payload["value"]).map(Some)
    }
}

fn wire_error(command: &str, status: StatusCode, payload: &Value) -> CrawlerError {
    let error = payload["value"]["error"].as_str().unwrap_or("unknown error");
    let message = payload["value"]["message"].as_str().unwrap_or_default();
    CrawlerError::Transport(format!("WebDriver {command} failed ({status}): {error} {message}"))
}

fn element_handle(value: &Value) -> Result<ElementHandle> {
    value[ELEMENT_KEY]
        .as_str()
        .map(ElementHandle::new)
        .ok_or_else(|| CrawlerError::Transport(format!("malformed element reference: {value}")))
}

#[async_trait]
impl RenderSession for WebDriverSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        debug!(url, "Navigating");
        self.command(Method::POST, "/url", Some(json!({ "url": url })))
            .await
            .map(|_| ())
    }

    async fn find(&mut self, selector: &str) -> Result<Option<ElementHandle>> {
        self.lookup("/element", selector).await
    }

    async fn find_all(&mut self, selector: &str) -> Result<Vec<ElementHandle>> {
        let body = json!({ "using": "css selector", "value": selector });
        let value = self.command(Method::POST, "/elements", Some(body)).await?;
        value
            .as_array()
            .map(|items| items.iter().map(element_handle).collect::<Result<Vec<_>>>())
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn find_within(
        &mut self,
        parent: &ElementHandle,
        selector: &str,
    ) -> Result<Option<ElementHandle>> {
        self.lookup(&format!("/element/{}/element", parent.id()), selector)
            .await
    }

    async fn click(&mut self, element: &ElementHandle) -> Result<()> {
        self.command(Method::POST, &format!("/element/{}/click", element.id()), Some(json!({})))
            .await
            .map(|_| ())
    }

    async fn text(&mut self, element: &ElementHandle) -> Result<String> {
        let value = self
            .command(Method::GET, &format!("/element/{}/text", element.id()), None)
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn attribute(&mut self, element: &ElementHandle, name: &str) -> Result<Option<String>> {
        let value = self
            .command(
                Method::GET,
                &format!("/element/{}/attribute/{}", element.id(), name),
                None,
            )
            .await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn close(&mut self) -> Result<()> {
        let result = self.command(Method::DELETE, "", None).await.map(|_| ());
        // Never retry a delete; the browser is gone or unreachable either way
        self.closed = true;
        info!(session_id = %self.session_id, "Closed WebDriver session");
        result
    }
}

impl Drop for WebDriverSession {
    fn drop(&mut self) {
        if !self.closed {
            warn!(session_id = %self.session_id, "WebDriver session dropped without being closed");
        }
    }
}
