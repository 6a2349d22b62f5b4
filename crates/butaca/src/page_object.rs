//! Page objects for the booking flow.
//!
//! [`SeatMapPage`] knows where the seat map lives and how to hand a
//! selection over to the next booking step. Seat picking itself is the
//! job of [`crate::SeatMapSelector`].

use crate::config::{SeatMapLocators, SelectionTiming, SelectorConfig};
use crate::driver::{BrowserActionPort, ClickOptions};
use crate::result::{SeatError, SeatResult};
use crate::wait::duration_ms;
use std::collections::HashMap;
use tracing::info;

/// A page or component of the site under test
pub trait PageObject {
    /// URL pattern that matches this page (e.g. `/compra/:session/butacas`)
    fn url_pattern(&self) -> &str;

    /// Wait budget for the page to become interactive
    fn load_timeout_ms(&self) -> u64 {
        30_000
    }

    /// Name used in logs
    fn page_name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

// =============================================================================
// URL MATCHING
// =============================================================================

/// URL pattern matcher for page objects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlMatcher {
    pattern: String,
    segments: Vec<UrlSegment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum UrlSegment {
    Literal(String),
    Wildcard,
    Parameter(String),
}

impl UrlMatcher {
    /// Compile a pattern.
    ///
    /// Patterns support literal segments (`/compra`), wildcards (`/*`) and
    /// named parameters (`/:session`). Each wildcard or parameter consumes
    /// exactly one path segment.
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s {
                "*" => UrlSegment::Wildcard,
                _ => s.strip_prefix(':').map_or_else(
                    || UrlSegment::Literal(s.to_string()),
                    |name| UrlSegment::Parameter(name.to_string()),
                ),
            })
            .collect();

        Self {
            pattern: pattern.to_string(),
            segments,
        }
    }

    /// Source pattern
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Check if a URL or path matches. Scheme, host, query and fragment
    /// are ignored.
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        let path = path_segments(url);
        path.len() == self.segments.len()
            && self
                .segments
                .iter()
                .zip(&path)
                .all(|(segment, value)| match segment {
                    UrlSegment::Literal(lit) => lit.as_str() == *value,
                    UrlSegment::Wildcard | UrlSegment::Parameter(_) => true,
                })
    }

    /// Named parameters of a matching URL
    #[must_use]
    pub fn extract_params(&self, url: &str) -> HashMap<String, String> {
        if !self.matches(url) {
            return HashMap::new();
        }
        self.segments
            .iter()
            .zip(path_segments(url))
            .filter_map(|(segment, value)| match segment {
                UrlSegment::Parameter(name) => Some((name.clone(), value.to_string())),
                _ => None,
            })
            .collect()
    }
}

fn path_segments(url: &str) -> Vec<&str> {
    let path = url.split_once("://").map_or(url, |(_, rest)| {
        rest.find('/').map_or("", |index| &rest[index..])
    });
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.split('/').filter(|s| !s.is_empty()).collect()
}

// =============================================================================
// SEAT MAP PAGE
// =============================================================================

/// The seat-selection step of the booking flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatMapPage {
    locators: SeatMapLocators,
    timing: SelectionTiming,
    matcher: UrlMatcher,
}

impl Default for SeatMapPage {
    fn default() -> Self {
        Self::new(&SelectorConfig::default())
    }
}

impl SeatMapPage {
    /// Page object from the selector configuration
    #[must_use]
    pub fn new(config: &SelectorConfig) -> Self {
        Self {
            matcher: UrlMatcher::new(&config.locators.url_pattern),
            locators: config.locators.clone(),
            timing: config.timing,
        }
    }

    /// Selectors in use
    #[must_use]
    pub const fn locators(&self) -> &SeatMapLocators {
        &self.locators
    }

    /// Whether `url` is a seat-map page
    #[must_use]
    pub fn matches_url(&self, url: &str) -> bool {
        self.matcher.matches(url)
    }

    /// Session id captured by the `:session` URL parameter
    #[must_use]
    pub fn session_id(&self, url: &str) -> Option<String> {
        self.matcher.extract_params(url).remove("session")
    }

    /// Wait for the seat-map container to render
    pub async fn wait_until_loaded<A>(&self, actions: &A) -> SeatResult<()>
    where
        A: BrowserActionPort + ?Sized,
    {
        actions
            .wait_for_visible(&self.locators.seat_map, self.timing.visible_timeout())
            .await
    }

    /// Click the continue button and wait for the backend to acknowledge
    /// the selection
    pub async fn confirm_selection<A>(&self, actions: &A) -> SeatResult<()>
    where
        A: BrowserActionPort + ?Sized,
    {
        let buttons = actions.query_all(&self.locators.continue_button).await?;
        let button = buttons.first().ok_or_else(|| {
            SeatError::not_found(format!(
                "continue button {:?} not on page",
                self.locators.continue_button
            ))
        })?;

        info!(
            page = self.page_name(),
            timeout_ms = duration_ms(self.timing.network_timeout()),
            "confirming seat selection"
        );
        actions.click(button, ClickOptions::default()).await?;
        actions
            .wait_for_network_response(
                &self.locators.confirm_response,
                self.timing.network_timeout(),
            )
            .await
    }
}

impl PageObject for SeatMapPage {
    fn url_pattern(&self) -> &str {
        self.matcher.pattern()
    }

    fn load_timeout_ms(&self) -> u64 {
        self.timing.visible_timeout_ms
    }

    fn page_name(&self) -> &str {
        "seat-map"
    }
}
