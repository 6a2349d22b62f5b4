//! Selector configuration.
//!
//! Layered: built-in defaults, then an optional YAML file, then `BUTACA_*`
//! environment variables.

use crate::result::{SeatError, SeatResult};
use crate::seat::LabelParsing;
use crate::wait::{
    DEFAULT_ATTRIBUTE_TIMEOUT_MS, DEFAULT_NETWORK_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_VISIBLE_TIMEOUT_MS,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Default pause between successive seat clicks (ms)
pub const DEFAULT_CLICK_PAUSE_MS: u64 = 500;

/// Default pause between clicks of a split group (ms)
pub const DEFAULT_GROUP_PAUSE_MS: u64 = 1_000;

// =============================================================================
// TARGET SITES
// =============================================================================

/// Cinema chain under test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    /// Cinesa (Spain)
    #[default]
    Cinesa,
    /// UCI Cinemas (Italy)
    Uci,
}

impl Chain {
    /// Lower-case identifier
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cinesa => "cinesa",
            Self::Uci => "uci",
        }
    }

    /// Base URL of the chain's site in the given environment
    #[must_use]
    pub const fn base_url(&self, environment: Environment) -> &'static str {
        match (self, environment) {
            (Self::Cinesa, Environment::Production) => "https://www.cinesa.es",
            (Self::Cinesa, Environment::Preproduction) => "https://preprod.cinesa.es",
            (Self::Uci, Environment::Production) => "https://ucicinemas.it",
            (Self::Uci, Environment::Preproduction) => "https://preprod.ucicinemas.it",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = SeatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cinesa" => Ok(Self::Cinesa),
            "uci" | "ucicinemas" => Ok(Self::Uci),
            other => Err(SeatError::config(format!("unknown chain: {other}"))),
        }
    }
}

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Live site
    #[default]
    Production,
    /// Pre-production site
    Preproduction,
}

impl FromStr for Environment {
    type Err = SeatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "prod" | "production" => Ok(Self::Production),
            "preprod" | "preproduction" => Ok(Self::Preproduction),
            other => Err(SeatError::config(format!("unknown environment: {other}"))),
        }
    }
}

/// Which site to drive
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Chain under test
    pub chain: Chain,
    /// Environment
    pub environment: Environment,
    /// Explicit base URL, overriding the chain default
    pub base_url: Option<String>,
}

impl SiteConfig {
    /// Effective base URL, without a trailing slash
    #[must_use]
    pub fn base_url(&self) -> String {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.chain.base_url(self.environment))
            .trim_end_matches('/')
            .to_string()
    }

    /// Join a path onto the base URL
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.base_url(), path.trim_start_matches('/'))
    }
}

// =============================================================================
// LOCATORS
// =============================================================================

/// Selectors for the seat-map page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeatMapLocators {
    /// Every seat node
    pub seat: String,
    /// Seat-map container
    pub seat_map: String,
    /// Button that confirms the selection
    pub continue_button: String,
    /// URL fragment of the response that acknowledges the selection
    pub confirm_response: String,
    /// URL pattern of the seat-map page
    pub url_pattern: String,
}

impl Default for SeatMapLocators {
    fn default() -> Self {
        Self {
            seat: "[data-testid='seat-map'] button[aria-pressed]".to_string(),
            seat_map: "[data-testid='seat-map']".to_string(),
            continue_button: "[data-testid='seat-map-continue']".to_string(),
            confirm_response: "/seats".to_string(),
            url_pattern: "/compra/:session/butacas".to_string(),
        }
    }
}

// =============================================================================
// TIMING
// =============================================================================

/// Timeouts and pauses, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionTiming {
    /// Wait for the pressed attribute to flip
    pub attribute_timeout_ms: u64,
    /// Wait for an element to render
    pub visible_timeout_ms: u64,
    /// Wait for a network response
    pub network_timeout_ms: u64,
    /// Pause between successive clicks
    pub click_pause_ms: u64,
    /// Pause between clicks of a split group
    pub group_pause_ms: u64,
    /// Poll interval for port-side waits
    pub poll_interval_ms: u64,
}

impl Default for SelectionTiming {
    fn default() -> Self {
        Self {
            attribute_timeout_ms: DEFAULT_ATTRIBUTE_TIMEOUT_MS,
            visible_timeout_ms: DEFAULT_VISIBLE_TIMEOUT_MS,
            network_timeout_ms: DEFAULT_NETWORK_TIMEOUT_MS,
            click_pause_ms: DEFAULT_CLICK_PAUSE_MS,
            group_pause_ms: DEFAULT_GROUP_PAUSE_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl SelectionTiming {
    /// No pauses and short timeouts, for in-memory seat maps
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            attribute_timeout_ms: 200,
            visible_timeout_ms: 200,
            network_timeout_ms: 200,
            click_pause_ms: 0,
            group_pause_ms: 0,
            poll_interval_ms: 5,
        }
    }

    /// Attribute timeout as Duration
    #[must_use]
    pub const fn attribute_timeout(&self) -> Duration {
        Duration::from_millis(self.attribute_timeout_ms)
    }

    /// Visibility timeout as Duration
    #[must_use]
    pub const fn visible_timeout(&self) -> Duration {
        Duration::from_millis(self.visible_timeout_ms)
    }

    /// Network timeout as Duration
    #[must_use]
    pub const fn network_timeout(&self) -> Duration {
        Duration::from_millis(self.network_timeout_ms)
    }

    /// Click pause as Duration
    #[must_use]
    pub const fn click_pause(&self) -> Duration {
        Duration::from_millis(self.click_pause_ms)
    }

    /// Split-group pause as Duration
    #[must_use]
    pub const fn group_pause(&self) -> Duration {
        Duration::from_millis(self.group_pause_ms)
    }

    /// Poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// SELECTOR CONFIG
// =============================================================================

/// Full configuration of a seat selector run
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Target site
    pub site: SiteConfig,
    /// Seat-map selectors
    pub locators: SeatMapLocators,
    /// Timeouts and pauses
    pub timing: SelectionTiming,
    /// Label policy
    pub label_parsing: LabelParsing,
}

impl SelectorConfig {
    /// Create new config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timing
    #[must_use]
    pub const fn with_timing(mut self, timing: SelectionTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Set locators
    #[must_use]
    pub fn with_locators(mut self, locators: SeatMapLocators) -> Self {
        self.locators = locators;
        self
    }

    /// Set label policy
    #[must_use]
    pub const fn with_label_parsing(mut self, parsing: LabelParsing) -> Self {
        self.label_parsing = parsing;
        self
    }

    /// Set target chain
    #[must_use]
    pub const fn with_chain(mut self, chain: Chain) -> Self {
        self.site.chain = chain;
        self
    }

    /// Parse YAML
    pub fn from_yaml_str(yaml: &str) -> SeatResult<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Load YAML from a file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> SeatResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> SeatResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Defaults, then `path` if given, then the process environment
    pub fn load(path: Option<&Path>) -> SeatResult<Self> {
        let config = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())
    }

    /// Apply `BUTACA_*` overrides read through `lookup`
    pub fn apply_env<F>(mut self, lookup: F) -> SeatResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(chain) = lookup("BUTACA_CHAIN") {
            self.site.chain = chain.parse()?;
        }
        if let Some(environment) = lookup("BUTACA_ENV") {
            self.site.environment = environment.parse()?;
        }
        if let Some(base_url) = lookup("BUTACA_BASE_URL") {
            self.site.base_url = Some(base_url);
        }
        if let Some(value) = lookup("BUTACA_ATTRIBUTE_TIMEOUT_MS") {
            self.timing.attribute_timeout_ms = parse_ms("BUTACA_ATTRIBUTE_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = lookup("BUTACA_CLICK_PAUSE_MS") {
            self.timing.click_pause_ms = parse_ms("BUTACA_CLICK_PAUSE_MS", &value)?;
        }
        if let Some(value) = lookup("BUTACA_STRICT_LABELS") {
            self.label_parsing = match value.trim() {
                "1" | "true" | "yes" => LabelParsing::Strict,
                _ => LabelParsing::Lenient,
            };
        }
        Ok(self)
    }
}

fn parse_ms(key: &str, value: &str) -> SeatResult<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| SeatError::config(format!("{key} must be milliseconds, got {value:?}")))
}
