//! Browser ports consumed by the seat selector.
//!
//! The selector never talks to a browser directly. It goes through two
//! narrow ports so the same strategy code runs against a live Chromium page
//! (`ChromiumSeatMap`, feature `browser`) or the in-memory
//! [`crate::MockSeatMap`].
//!
//! ```text
//! ┌──────────────────┐     ┌─────────────────────────┐
//! │ SeatMapSelector  │────►│ BrowserActionPort       │  click / wait
//! │                  │────►│ SeatMapSnapshotProvider │  read seat nodes
//! └──────────────────┘     └─────────────────────────┘
//! ```

use crate::result::SeatResult;
use crate::seat::RawSeat;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Attribute that flips when a seat is selected
pub const PRESSED_ATTRIBUTE: &str = "aria-pressed";

/// Opaque reference to a DOM node.
///
/// Selection logic only compares and forwards handles; what the id means is
/// up to the port that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle {
    id: String,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Port-specific identifier
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Options for a click
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClickOptions {
    /// Skip actionability checks
    pub force: bool,
}

impl ClickOptions {
    /// Forced click
    #[must_use]
    pub const fn forced() -> Self {
        Self { force: true }
    }
}

/// Element actions and bounded waits
#[async_trait]
pub trait BrowserActionPort: Send + Sync {
    /// Query all elements matching a selector
    async fn query_all(&self, selector: &str) -> SeatResult<Vec<ElementHandle>>;

    /// Click an element
    async fn click(&self, handle: &ElementHandle, options: ClickOptions) -> SeatResult<()>;

    /// Read an attribute
    async fn get_attribute(&self, handle: &ElementHandle, name: &str)
        -> SeatResult<Option<String>>;

    /// Wait until `name` reads `expected`
    async fn wait_for_attribute(
        &self,
        handle: &ElementHandle,
        name: &str,
        expected: &str,
        timeout: Duration,
    ) -> SeatResult<()>;

    /// Wait for a network response whose URL contains `url_substring`
    async fn wait_for_network_response(
        &self,
        url_substring: &str,
        timeout: Duration,
    ) -> SeatResult<()>;

    /// Wait for an element matching `selector` to be rendered: laid out and
    /// not hidden by style
    async fn wait_for_visible(&self, selector: &str, timeout: Duration) -> SeatResult<()>;
}

/// Enumerates seat nodes and reads the signals a seat is parsed from
#[async_trait]
pub trait SeatMapSnapshotProvider: Send + Sync {
    /// All seat nodes currently rendered
    async fn list_seat_handles(&self) -> SeatResult<Vec<ElementHandle>>;

    /// Accessible name
    async fn read_label(&self, handle: &ElementHandle) -> SeatResult<String>;

    /// `class` attribute
    async fn read_class_names(&self, handle: &ElementHandle) -> SeatResult<String>;

    /// `aria-pressed`
    async fn read_pressed_attribute(&self, handle: &ElementHandle) -> SeatResult<Option<String>>;

    /// Icon reference, if any
    async fn read_icon_ref(&self, handle: &ElementHandle) -> SeatResult<Option<String>>;

    /// Read every signal of one seat node
    async fn read_raw_seat(&self, handle: &ElementHandle) -> SeatResult<RawSeat> {
        Ok(RawSeat {
            label: self.read_label(handle).await?,
            class_names: self.read_class_names(handle).await?,
            pressed: self.read_pressed_attribute(handle).await?,
            icon_ref: self.read_icon_ref(handle).await?,
        })
    }
}

#[async_trait]
impl<T: BrowserActionPort + ?Sized> BrowserActionPort for Arc<T> {
    async fn query_all(&self, selector: &str) -> SeatResult<Vec<ElementHandle>> {
        (**self).query_all(selector).await
    }

    async fn click(&self, handle: &ElementHandle, options: ClickOptions) -> SeatResult<()> {
        (**self).click(handle, options).await
    }

    async fn get_attribute(
        &self,
        handle: &ElementHandle,
        name: &str,
    ) -> SeatResult<Option<String>> {
        (**self).get_attribute(handle, name).await
    }

    async fn wait_for_attribute(
        &self,
        handle: &ElementHandle,
        name: &str,
        expected: &str,
        timeout: Duration,
    ) -> SeatResult<()> {
        (**self)
            .wait_for_attribute(handle, name, expected, timeout)
            .await
    }

    async fn wait_for_network_response(
        &self,
        url_substring: &str,
        timeout: Duration,
    ) -> SeatResult<()> {
        (**self)
            .wait_for_network_response(url_substring, timeout)
            .await
    }

    async fn wait_for_visible(&self, selector: &str, timeout: Duration) -> SeatResult<()> {
        (**self).wait_for_visible(selector, timeout).await
    }
}

#[async_trait]
impl<T: SeatMapSnapshotProvider + ?Sized> SeatMapSnapshotProvider for Arc<T> {
    async fn list_seat_handles(&self) -> SeatResult<Vec<ElementHandle>> {
        (**self).list_seat_handles().await
    }

    async fn read_label(&self, handle: &ElementHandle) -> SeatResult<String> {
        (**self).read_label(handle).await
    }

    async fn read_class_names(&self, handle: &ElementHandle) -> SeatResult<String> {
        (**self).read_class_names(handle).await
    }

    async fn read_pressed_attribute(&self, handle: &ElementHandle) -> SeatResult<Option<String>> {
        (**self).read_pressed_attribute(handle).await
    }

    async fn read_icon_ref(&self, handle: &ElementHandle) -> SeatResult<Option<String>> {
        (**self).read_icon_ref(handle).await
    }

    async fn read_raw_seat(&self, handle: &ElementHandle) -> SeatResult<RawSeat> {
        (**self).read_raw_seat(handle).await
    }
}
