//! In-memory seat map for unit tests and offline planning.
//!
//! Implements both browser ports over a list of [`RawSeat`] descriptors.
//! Clicking a seat toggles its `aria-pressed`, class suffix and icon the way
//! the live map does; unavailable seats ignore clicks. Every port call is
//! recorded so tests can assert that a failed plan issued no clicks.

use crate::config::SeatMapLocators;
use crate::driver::{
    BrowserActionPort, ClickOptions, ElementHandle, SeatMapSnapshotProvider, PRESSED_ATTRIBUTE,
};
use crate::result::{SeatError, SeatResult};
use crate::seat::{detect_seat_state, parse_location, RawSeat, SeatState};
use crate::wait::{poll_until, DEFAULT_POLL_INTERVAL_MS};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Seat-map fixture file: the raw descriptors captured from one page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatMapFixture {
    /// Free-form name (showtime, screen)
    #[serde(default)]
    pub name: Option<String>,
    /// Seat nodes in DOM order
    pub seats: Vec<RawSeat>,
}

impl SeatMapFixture {
    /// Load a fixture; `.json` files are JSON, anything else YAML
    pub fn from_path(path: impl AsRef<Path>) -> SeatResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(serde_yaml_ng::from_str(&content)?)
        }
    }
}

/// Raw descriptor of a seat as the mock renders it
#[must_use]
pub fn mock_seat(row: u32, number: u32, state: SeatState) -> RawSeat {
    let mut raw = RawSeat::new(format!("Seat {row}-{number}"));
    apply_state(&mut raw, state);
    raw
}

const STATE_SUFFIXES: [&str; 4] = ["--available", "--selected", "--unavailable", "--house"];

fn apply_state(raw: &mut RawSeat, state: SeatState) {
    let base: Vec<&str> = raw
        .class_names
        .split_whitespace()
        .filter(|c| !STATE_SUFFIXES.iter().any(|suffix| c.ends_with(suffix)))
        .collect();
    let mut classes = if base.is_empty() {
        vec!["seat".to_string()]
    } else {
        base.iter().map(|c| (*c).to_string()).collect()
    };

    let (suffix, pressed) = match state {
        SeatState::Available => (Some("seat--available"), Some("false")),
        SeatState::Selected => (Some("seat--selected"), Some("true")),
        SeatState::Unavailable => (Some("seat--unavailable"), Some("false")),
        SeatState::Unknown => (None, None),
    };
    if let Some(suffix) = suffix {
        classes.push(suffix.to_string());
    }
    raw.class_names = classes.join(" ");
    raw.pressed = pressed.map(str::to_string);
    raw.icon_ref = raw
        .icon_ref
        .as_ref()
        .and(suffix)
        .map(|s| format!("#icon-{}", s.replace("--", "-")));
}

#[derive(Debug)]
struct MockSeat {
    handle: ElementHandle,
    raw: RawSeat,
}

#[derive(Debug, Default)]
struct MockState {
    seats: Vec<MockSeat>,
    elements: HashMap<String, Vec<ElementHandle>>,
    responses_on_click: HashMap<ElementHandle, String>,
    responses: Vec<String>,
    frozen: bool,
    call_history: Vec<String>,
}

/// In-memory implementation of both seat-map ports
#[derive(Debug)]
pub struct MockSeatMap {
    seat_selector: String,
    poll_interval: Duration,
    state: Mutex<MockState>,
}

impl Default for MockSeatMap {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl MockSeatMap {
    /// Create a map from raw descriptors, handles `seat-0`, `seat-1`, ...
    #[must_use]
    pub fn new(seats: Vec<RawSeat>) -> Self {
        let seats = seats
            .into_iter()
            .enumerate()
            .map(|(i, raw)| MockSeat {
                handle: ElementHandle::new(format!("seat-{i}")),
                raw,
            })
            .collect();
        Self {
            seat_selector: SeatMapLocators::default().seat,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            state: Mutex::new(MockState {
                seats,
                ..MockState::default()
            }),
        }
    }

    /// Map with every listed seat available
    #[must_use]
    pub fn from_rows(rows: &[(u32, &[u32])]) -> Self {
        Self::new(
            rows.iter()
                .flat_map(|(row, numbers)| {
                    numbers
                        .iter()
                        .map(move |&n| mock_seat(*row, n, SeatState::Available))
                })
                .collect(),
        )
    }

    /// Map from a fixture
    #[must_use]
    pub fn from_fixture(fixture: SeatMapFixture) -> Self {
        Self::new(fixture.seats)
    }

    /// Use the selectors a page would be configured with
    #[must_use]
    pub fn with_locators(mut self, locators: &SeatMapLocators) -> Self {
        self.seat_selector = locators.seat.clone();
        self.add_element(&locators.seat_map, "seat-map");
        self
    }

    /// Set the poll interval of port-side waits
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Poll interval of port-side waits
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // a panicking test may poison the lock; the data is still usable
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Register a non-seat element under a selector
    pub fn add_element(&self, selector: &str, id: &str) -> ElementHandle {
        let handle = ElementHandle::new(id);
        self.lock()
            .elements
            .entry(selector.to_string())
            .or_default()
            .push(handle.clone());
        handle
    }

    /// Make clicks on `handle` produce a network response for `url`
    pub fn respond_on_click(&self, handle: &ElementHandle, url: &str) {
        let _ = self
            .lock()
            .responses_on_click
            .insert(handle.clone(), url.to_string());
    }

    /// Record a network response as already received
    pub fn push_response(&self, url: &str) {
        self.lock().responses.push(url.to_string());
    }

    /// Stop seats reacting to clicks, so confirmations time out
    pub fn freeze(&self) {
        self.lock().frozen = true;
    }

    /// Overwrite the state of the seat at `(row, number)`
    pub fn set_seat_state(&self, row: u32, number: u32, state: SeatState) -> SeatResult<()> {
        let mut guard = self.lock();
        let seat = guard
            .seats
            .iter_mut()
            .find(|s| parse_location(&s.raw.label) == Some((row, number)))
            .ok_or_else(|| SeatError::not_found(format!("no seat {row}-{number} in mock map")))?;
        apply_state(&mut seat.raw, state);
        Ok(())
    }

    /// Current raw descriptor of a seat handle
    #[must_use]
    pub fn raw_seat(&self, handle: &ElementHandle) -> Option<RawSeat> {
        self.lock()
            .seats
            .iter()
            .find(|s| &s.handle == handle)
            .map(|s| s.raw.clone())
    }

    /// All recorded port calls
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.lock().call_history.clone()
    }

    /// Check if a call with this prefix was recorded
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.lock()
            .call_history
            .iter()
            .any(|c| c.starts_with(method))
    }

    /// Handles clicked, in order
    #[must_use]
    pub fn clicks(&self) -> Vec<String> {
        self.lock()
            .call_history
            .iter()
            .filter_map(|c| c.strip_prefix("click:"))
            .map(str::to_string)
            .collect()
    }

    fn record(&self, call: String) {
        self.lock().call_history.push(call);
    }

    fn seat_raw(&self, handle: &ElementHandle) -> SeatResult<RawSeat> {
        self.raw_seat(handle)
            .ok_or_else(|| SeatError::browser(format!("element {handle} is detached")))
    }

    fn attribute(&self, handle: &ElementHandle, name: &str) -> SeatResult<Option<String>> {
        let guard = self.lock();
        if let Some(seat) = guard.seats.iter().find(|s| &s.handle == handle) {
            return Ok(match name {
                PRESSED_ATTRIBUTE => seat.raw.pressed.clone(),
                "class" => Some(seat.raw.class_names.clone()),
                "aria-label" => Some(seat.raw.label.clone()),
                "href" => seat.raw.icon_ref.clone(),
                _ => None,
            });
        }
        if guard.elements.values().flatten().any(|h| h == handle) {
            return Ok(None);
        }
        Err(SeatError::browser(format!("element {handle} is detached")))
    }

    fn handles_for(&self, selector: &str) -> Vec<ElementHandle> {
        let guard = self.lock();
        if selector == self.seat_selector {
            return guard.seats.iter().map(|s| s.handle.clone()).collect();
        }
        guard.elements.get(selector).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl BrowserActionPort for MockSeatMap {
    async fn query_all(&self, selector: &str) -> SeatResult<Vec<ElementHandle>> {
        self.record(format!("query_all:{selector}"));
        Ok(self.handles_for(selector))
    }

    async fn click(&self, handle: &ElementHandle, _options: ClickOptions) -> SeatResult<()> {
        self.record(format!("click:{handle}"));
        let mut guard = self.lock();

        if let Some(url) = guard.responses_on_click.get(handle).cloned() {
            guard.responses.push(url);
            return Ok(());
        }
        if guard.elements.values().flatten().any(|h| h == handle) {
            return Ok(());
        }

        let frozen = guard.frozen;
        let seat = guard
            .seats
            .iter_mut()
            .find(|s| &s.handle == handle)
            .ok_or_else(|| SeatError::browser(format!("element {handle} is detached")))?;
        if frozen {
            return Ok(());
        }

        let next = match detect_seat_state(&seat.raw) {
            SeatState::Available => SeatState::Selected,
            SeatState::Selected => SeatState::Available,
            SeatState::Unavailable | SeatState::Unknown => return Ok(()),
        };
        apply_state(&mut seat.raw, next);
        Ok(())
    }

    async fn get_attribute(
        &self,
        handle: &ElementHandle,
        name: &str,
    ) -> SeatResult<Option<String>> {
        self.record(format!("get_attribute:{handle}:{name}"));
        self.attribute(handle, name)
    }

    async fn wait_for_attribute(
        &self,
        handle: &ElementHandle,
        name: &str,
        expected: &str,
        timeout: Duration,
    ) -> SeatResult<()> {
        self.record(format!("wait_for_attribute:{handle}:{name}={expected}"));
        poll_until(
            timeout,
            self.poll_interval,
            format!("{handle} {name}={expected}"),
            || async move {
                self.attribute(handle, name)
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
        self.record(format!("wait_for_network_response:{url_substring}"));
        poll_until(
            timeout,
            self.poll_interval,
            format!("response matching {url_substring:?}"),
            || async move {
                let mut guard = self.lock();
                match guard.responses.iter().position(|u| u.contains(url_substring)) {
                    Some(index) => {
                        let _ = guard.responses.remove(index);
                        Ok(true)
                    }
                    None => Ok(false),
                }
            },
        )
        .await?;
        Ok(())
    }

    async fn wait_for_visible(&self, selector: &str, timeout: Duration) -> SeatResult<()> {
        self.record(format!("wait_for_visible:{selector}"));
        poll_until(
            timeout,
            self.poll_interval,
            format!("{selector} visible"),
            || async move { Ok(!self.handles_for(selector).is_empty()) },
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl SeatMapSnapshotProvider for MockSeatMap {
    async fn list_seat_handles(&self) -> SeatResult<Vec<ElementHandle>> {
        self.record("list_seat_handles".to_string());
        Ok(self.lock().seats.iter().map(|s| s.handle.clone()).collect())
    }

    async fn read_label(&self, handle: &ElementHandle) -> SeatResult<String> {
        Ok(self.seat_raw(handle)?.label)
    }

    async fn read_class_names(&self, handle: &ElementHandle) -> SeatResult<String> {
        Ok(self.seat_raw(handle)?.class_names)
    }

    async fn read_pressed_attribute(&self, handle: &ElementHandle) -> SeatResult<Option<String>> {
        Ok(self.seat_raw(handle)?.pressed)
    }

    async fn read_icon_ref(&self, handle: &ElementHandle) -> SeatResult<Option<String>> {
        Ok(self.seat_raw(handle)?.icon_ref)
    }

    async fn read_raw_seat(&self, handle: &ElementHandle) -> SeatResult<RawSeat> {
        self.seat_raw(handle)
    }
}
