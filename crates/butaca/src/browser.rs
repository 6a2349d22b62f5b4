//! Live seat map over the Chrome DevTools Protocol.
//!
//! [`ChromiumSeatMap`] implements both browser ports on a real Chromium page
//! through `chromiumoxide`. Elements returned by `query_all` are kept in a
//! registry keyed by the handle id, so later calls address the same node.
//!
//! Network responses are recorded by a background listener. A
//! `wait_for_network_response` only matches responses received after the
//! most recent click.

use crate::driver::{
    BrowserActionPort, ClickOptions, ElementHandle, SeatMapSnapshotProvider, PRESSED_ATTRIBUTE,
};
use crate::result::{SeatError, SeatResult};
use crate::wait::{poll_until, DEFAULT_POLL_INTERVAL_MS};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::network::EventResponseReceived;
use chromiumoxide::element::Element;
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// True when the node takes up layout space and is not hidden by style
const IS_RENDERED_JS: &str = "function() { \
    const style = window.getComputedStyle(this); \
    return this.getClientRects().length > 0 \
        && style.visibility !== 'hidden' \
        && style.display !== 'none'; \
}";

fn cdp_error(context: &str, e: impl fmt::Display) -> SeatError {
    SeatError::browser(format!("{context}: {e}"))
}

/// Chromium launch options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Run without a window
    pub headless: bool,
    /// Disable the Chromium sandbox (containers, CI)
    pub no_sandbox: bool,
    /// Path to a Chromium binary
    pub chromium_path: Option<String>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            no_sandbox: false,
            chromium_path: None,
        }
    }
}

impl LaunchOptions {
    /// Show the browser window
    #[must_use]
    pub const fn headed(mut self) -> Self {
        self.headless = false;
        self
    }

    /// Disable the sandbox
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.no_sandbox = true;
        self
    }

    /// Use a specific Chromium binary
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }
}

#[derive(Debug, Default)]
struct ResponseLog {
    urls: Vec<String>,
    mark: usize,
}

/// Seat map on a live Chromium page
pub struct ChromiumSeatMap {
    browser: Mutex<CdpBrowser>,
    page: CdpPage,
    seat_selector: String,
    elements: Mutex<ElementRegistry<i64, Element>>,
    responses: Arc<StdMutex<ResponseLog>>,
    poll_interval: Duration,
    tasks: Vec<tokio::task::JoinHandle<()>>,
}

impl fmt::Debug for ChromiumSeatMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChromiumSeatMap")
            .field("seat_selector", &self.seat_selector)
            .finish_non_exhaustive()
    }
}

impl ChromiumSeatMap {
    /// Launch Chromium and open a blank page.
    ///
    /// `seat_selector` is the CSS selector that lists every seat node.
    pub async fn launch(options: &LaunchOptions, seat_selector: &str) -> SeatResult<Self> {
        let mut builder = CdpConfig::builder();
        if !options.headless {
            builder = builder.with_head();
        }
        if options.no_sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = options.chromium_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|e| cdp_error("invalid browser config", e))?;

        let (browser, mut handler) = CdpBrowser::launch(config)
            .await
            .map_err(|e| cdp_error("failed to launch chromium", e))?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| cdp_error("failed to open page", e))?;

        let responses = Arc::new(StdMutex::new(ResponseLog::default()));
        let mut events = page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(|e| cdp_error("failed to listen for responses", e))?;
        let log = Arc::clone(&responses);
        let listener_task = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Ok(mut log) = log.lock() {
                    log.urls.push(event.response.url.clone());
                }
            }
        });

        Ok(Self {
            browser: Mutex::new(browser),
            page,
            seat_selector: seat_selector.to_string(),
            elements: Mutex::new(ElementRegistry::new()),
            responses,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            tasks: vec![handler_task, listener_task],
        })
    }

    /// Set the poll interval of port-side waits
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Navigate to a URL and wait for the load event
    pub async fn goto(&self, url: &str) -> SeatResult<()> {
        debug!(url, "navigating");
        self.page
            .goto(url)
            .await
            .map_err(|e| cdp_error(&format!("navigation to {url} failed"), e))?;
        self.elements.lock().await.clear();
        Ok(())
    }

    /// Current page URL
    pub async fn current_url(&self) -> SeatResult<Option<String>> {
        self.page
            .url()
            .await
            .map_err(|e| cdp_error("failed to read url", e))
    }

    /// Close the browser
    pub async fn close(self) -> SeatResult<()> {
        let mut browser = self.browser.lock().await;
        if let Err(e) = browser.close().await {
            warn!(error = %e, "browser did not close cleanly");
        }
        for task in &self.tasks {
            task.abort();
        }
        Ok(())
    }

    async fn register(&self, found: Vec<Element>) -> Vec<ElementHandle> {
        let mut elements = self.elements.lock().await;
        found
            .into_iter()
            .map(|element| elements.register(*element.backend_node_id.inner(), element))
            .collect()
    }

    async fn attribute(&self, handle: &ElementHandle, name: &str) -> SeatResult<Option<String>> {
        let elements = self.elements.lock().await;
        let element = elements.get(handle)?;
        element
            .attribute(name)
            .await
            .map_err(|e| cdp_error(&format!("failed to read {name} of {handle}"), e))
    }

    fn responses(&self) -> SeatResult<std::sync::MutexGuard<'_, ResponseLog>> {
        self.responses
            .lock()
            .map_err(|_| SeatError::browser("response log poisoned"))
    }
}

/// Elements addressed by handle id. A DOM node listed again keeps its id,
/// so the registry never grows past the nodes the page has shown.
#[derive(Debug)]
struct ElementRegistry<K, E> {
    elements: HashMap<String, E>,
    ids: HashMap<K, String>,
    next_id: usize,
}

impl<K: Eq + Hash, E> ElementRegistry<K, E> {
    fn new() -> Self {
        Self {
            elements: HashMap::new(),
            ids: HashMap::new(),
            next_id: 0,
        }
    }

    /// Handle for `element`, reusing the id of a node seen before
    fn register(&mut self, node: K, element: E) -> ElementHandle {
        let id = match self.ids.get(&node) {
            Some(id) => id.clone(),
            None => {
                let id = format!("el-{}", self.next_id);
                self.next_id += 1;
                let _ = self.ids.insert(node, id.clone());
                id
            }
        };
        // the newest remote object replaces the stale one
        let _ = self.elements.insert(id.clone(), element);
        ElementHandle::new(id)
    }

    fn get(&self, handle: &ElementHandle) -> SeatResult<&E> {
        self.elements
            .get(handle.id())
            .ok_or_else(|| SeatError::browser(format!("element {handle} is not registered")))
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.elements.len()
    }

    fn clear(&mut self) {
        self.elements.clear();
        self.ids.clear();
    }
}

#[async_trait]
impl BrowserActionPort for ChromiumSeatMap {
    async fn query_all(&self, selector: &str) -> SeatResult<Vec<ElementHandle>> {
        let found = self
            .page
            .find_elements(selector)
            .await
            .map_err(|e| cdp_error(&format!("query {selector:?} failed"), e))?;
        Ok(self.register(found).await)
    }

    async fn click(&self, handle: &ElementHandle, options: ClickOptions) -> SeatResult<()> {
        {
            let mut log = self.responses()?;
            log.mark = log.urls.len();
        }
        let elements = self.elements.lock().await;
        let element = elements.get(handle)?;
        if options.force {
            // no actionability checks: dispatch the DOM click directly
            let _ = element
                .call_js_fn("function() { this.click(); }", false)
                .await
                .map_err(|e| cdp_error(&format!("failed to click {handle}"), e))?;
        } else {
            let _ = element
                .scroll_into_view()
                .await
                .map_err(|e| cdp_error(&format!("{handle} cannot be scrolled into view"), e))?;
            let _ = element
                .click()
                .await
                .map_err(|e| cdp_error(&format!("failed to click {handle}"), e))?;
        }
        Ok(())
    }

    async fn get_attribute(
        &self,
        handle: &ElementHandle,
        name: &str,
    ) -> SeatResult<Option<String>> {
        self.attribute(handle, name).await
    }

    async fn wait_for_attribute(
        &self,
        handle: &ElementHandle,
        name: &str,
        expected: &str,
        timeout: Duration,
    ) -> SeatResult<()> {
        poll_until(
            timeout,
            self.poll_interval,
            format!("{handle} {name}={expected}"),
            || async move {
                self.attribute(handle, name)
                    .await
                    .map(|value| value.as_deref() == Some(expected))
            },
        )
        .await?;
        Ok(())
    }

    async fn wait_for_network_response(
        &self,
        url_substring: &str,
        timeout: Duration,
    ) -> SeatResult<()> {
        poll_until(
            timeout,
            self.poll_interval,
            format!("response matching {url_substring:?}"),
            || async move {
                self.responses().map(|log| {
                    log.urls[log.mark..]
                        .iter()
                        .any(|url| url.contains(url_substring))
                })
            },
        )
        .await?;
        Ok(())
    }

    async fn wait_for_visible(&self, selector: &str, timeout: Duration) -> SeatResult<()> {
        poll_until(
            timeout,
            self.poll_interval,
            format!("{selector} visible"),
            || async move {
                let Ok(element) = self.page.find_element(selector).await else {
                    return Ok(false);
                };
                let rendered = element
                    .call_js_fn(IS_RENDERED_JS, false)
                    .await
                    .map(|returns| returns.result.value.and_then(|v| v.as_bool()).unwrap_or(false))
                    .map_err(|e| cdp_error(&format!("failed to check {selector:?}"), e));
                rendered
            },
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl SeatMapSnapshotProvider for ChromiumSeatMap {
    async fn list_seat_handles(&self) -> SeatResult<Vec<ElementHandle>> {
        let found = self
            .page
            .find_elements(self.seat_selector.as_str())
            .await
            .map_err(|e| cdp_error("failed to list seats", e))?;
        Ok(self.register(found).await)
    }

    async fn read_label(&self, handle: &ElementHandle) -> SeatResult<String> {
        if let Some(label) = self.attribute(handle, "aria-label").await? {
            return Ok(label);
        }
        let elements = self.elements.lock().await;
        let text = elements
            .get(handle)?
            .inner_text()
            .await
            .map_err(|e| cdp_error(&format!("failed to read text of {handle}"), e))?;
        Ok(text.unwrap_or_default())
    }

    async fn read_class_names(&self, handle: &ElementHandle) -> SeatResult<String> {
        Ok(self.attribute(handle, "class").await?.unwrap_or_default())
    }

    async fn read_pressed_attribute(&self, handle: &ElementHandle) -> SeatResult<Option<String>> {
        self.attribute(handle, PRESSED_ATTRIBUTE).await
    }

    async fn read_icon_ref(&self, handle: &ElementHandle) -> SeatResult<Option<String>> {
        let elements = self.elements.lock().await;
        let Ok(icon) = elements.get(handle)?.find_element("use").await else {
            return Ok(None);
        };
        for name in ["href", "xlink:href"] {
            let value = icon
                .attribute(name)
                .await
                .map_err(|e| cdp_error(&format!("failed to read icon of {handle}"), e))?;
            if value.is_some() {
                return Ok(value);
            }
        }
        Ok(None)
    }
}
