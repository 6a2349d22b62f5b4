//! Seat parsing and state detection.
//!
//! A seat node on the live site carries its identity and state in several
//! inconsistent places: the accessible label, an icon `href`, a BEM-style
//! class suffix and `aria-pressed`. Each signal is read through an ordered
//! list of typed rules; the first rule that matches wins.
//!
//! ```text
//! RawSeat ──► row/number  (label regex)
//!         ──► SeatType    (TYPE_RULES over classes, then label)
//!         ──► SeatState   (STATE_RULES, first match wins)
//! ```

use crate::driver::ElementHandle;
use crate::result::{SeatError, SeatResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Hard cap for every multi-seat strategy
pub const MAX_SEAT_SELECTION: usize = 9;

/// Row and seat number are the first two integers separated by spaces/dashes
pub const SEAT_LABEL_PATTERN: &str = r"(\d+)[\s-]+(\d+)";

fn label_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(SEAT_LABEL_PATTERN).expect("seat label pattern is valid"))
}

// =============================================================================
// SEAT TYPE
// =============================================================================

/// Kind of seat, as advertised by the seat map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatType {
    /// Regular seat
    #[default]
    Normal,
    /// Premium seat
    Vip,
    /// Wheelchair space
    Wheelchair,
    /// Companion seat next to a wheelchair space
    Companion,
    /// Reclining seat
    Recliner,
}

impl SeatType {
    /// Name used in class names and reports
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Vip => "vip",
            Self::Wheelchair => "wheelchair",
            Self::Companion => "companion",
            Self::Recliner => "recliner",
        }
    }
}

impl fmt::Display for SeatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered type markers. `Normal` is the fallback, never a rule.
pub const TYPE_RULES: [(&str, SeatType); 4] = [
    ("wheelchair", SeatType::Wheelchair),
    ("companion", SeatType::Companion),
    ("vip", SeatType::Vip),
    ("recliner", SeatType::Recliner),
];

/// Detect the seat type from class names, falling back to label text.
#[must_use]
pub fn detect_seat_type(class_names: &str, label: &str) -> SeatType {
    let classes = class_names.to_lowercase();
    let label = label.to_lowercase();

    [classes.as_str(), label.as_str()]
        .iter()
        .find_map(|haystack| {
            TYPE_RULES
                .iter()
                .find(|(marker, _)| haystack.contains(marker))
                .map(|(_, seat_type)| *seat_type)
        })
        .unwrap_or_default()
}

// =============================================================================
// SEAT STATE
// =============================================================================

/// Interaction state of a seat at snapshot time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatState {
    /// Free to select
    Available,
    /// Selected by the current user
    Selected,
    /// Sold, blocked or house seat. Terminal.
    Unavailable,
    /// No signal matched. Never targeted by a strategy.
    #[default]
    Unknown,
}

impl SeatState {
    /// Name used in reports
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Selected => "selected",
            Self::Unavailable => "unavailable",
            Self::Unknown => "unknown",
        }
    }

    /// Whether a strategy may target this seat
    #[must_use]
    pub const fn is_selectable(&self) -> bool {
        matches!(self, Self::Available)
    }
}

impl fmt::Display for SeatState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which DOM signal a state rule reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateSignal {
    /// Accessible label text
    Label,
    /// Icon reference (`<use href>`)
    IconRef,
    /// State-bearing class suffix
    ClassSuffix,
    /// `aria-pressed`
    Pressed,
}

/// A single typed predicate→state rule
#[derive(Debug, Clone, Copy)]
pub struct StateRule {
    /// Signal inspected by this rule
    pub signal: StateSignal,
    detect: fn(&RawSeat) -> Option<SeatState>,
}

impl StateRule {
    /// Evaluate this rule against a raw seat
    #[must_use]
    pub fn evaluate(&self, raw: &RawSeat) -> Option<SeatState> {
        (self.detect)(raw)
    }
}

fn state_from_label(raw: &RawSeat) -> Option<SeatState> {
    raw.label
        .to_lowercase()
        .contains("unavailable")
        .then_some(SeatState::Unavailable)
}

fn state_from_icon(raw: &RawSeat) -> Option<SeatState> {
    let icon = raw.icon_ref.as_deref()?.to_lowercase();
    // "unavailable" contains "available"; check it first
    if icon.contains("unavailable") || icon.contains("house") {
        Some(SeatState::Unavailable)
    } else if icon.contains("selected") {
        Some(SeatState::Selected)
    } else if icon.contains("available") {
        Some(SeatState::Available)
    } else {
        None
    }
}

fn state_from_class(raw: &RawSeat) -> Option<SeatState> {
    let classes = raw.class_names.to_lowercase();
    if classes.contains("--unavailable") || classes.contains("--house") {
        Some(SeatState::Unavailable)
    } else if classes.contains("--selected") {
        Some(SeatState::Selected)
    } else if classes.contains("--available") {
        Some(SeatState::Available)
    } else {
        None
    }
}

fn state_from_pressed(raw: &RawSeat) -> Option<SeatState> {
    match raw.pressed.as_deref().map(str::trim) {
        Some("true") => Some(SeatState::Selected),
        Some("false") => Some(SeatState::Available),
        _ => None,
    }
}

/// State rules in trust order; `Unknown` when none match.
pub const STATE_RULES: [StateRule; 4] = [
    StateRule {
        signal: StateSignal::Label,
        detect: state_from_label,
    },
    StateRule {
        signal: StateSignal::IconRef,
        detect: state_from_icon,
    },
    StateRule {
        signal: StateSignal::ClassSuffix,
        detect: state_from_class,
    },
    StateRule {
        signal: StateSignal::Pressed,
        detect: state_from_pressed,
    },
];

/// Detect the seat state by evaluating [`STATE_RULES`] in order.
#[must_use]
pub fn detect_seat_state(raw: &RawSeat) -> SeatState {
    STATE_RULES
        .iter()
        .find_map(|rule| rule.evaluate(raw))
        .unwrap_or_default()
}

// =============================================================================
// RAW SEAT
// =============================================================================

/// Seat descriptor exactly as read from the page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSeat {
    /// Accessible name
    pub label: String,
    /// `class` attribute
    #[serde(default)]
    pub class_names: String,
    /// `aria-pressed` attribute
    #[serde(default)]
    pub pressed: Option<String>,
    /// Icon reference, if the seat renders one
    #[serde(default)]
    pub icon_ref: Option<String>,
}

impl RawSeat {
    /// Create a raw seat with only a label
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Set class names
    #[must_use]
    pub fn with_classes(mut self, class_names: impl Into<String>) -> Self {
        self.class_names = class_names.into();
        self
    }

    /// Set the pressed attribute
    #[must_use]
    pub fn with_pressed(mut self, pressed: impl Into<String>) -> Self {
        self.pressed = Some(pressed.into());
        self
    }

    /// Set the icon reference
    #[must_use]
    pub fn with_icon(mut self, icon_ref: impl Into<String>) -> Self {
        self.icon_ref = Some(icon_ref.into());
        self
    }
}

/// Extract `(row, seat_number)` from a label.
#[must_use]
pub fn parse_location(label: &str) -> Option<(u32, u32)> {
    let caps = label_regex().captures(label)?;
    let row = caps.get(1)?.as_str().parse().ok()?;
    let number = caps.get(2)?.as_str().parse().ok()?;
    Some((row, number))
}

// =============================================================================
// SEAT
// =============================================================================

/// How to treat labels without a row/number pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelParsing {
    /// Default unparsable labels to row 0, seat 0
    #[default]
    Lenient,
    /// Fail with [`SeatError::Parse`]
    Strict,
}

/// One seat of a snapshot. Immutable: re-read the map after every click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Seat {
    row: u32,
    seat_number: u32,
    seat_type: SeatType,
    seat_state: SeatState,
    label: String,
    handle: ElementHandle,
}

impl Seat {
    /// Row index
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Position within the row
    #[must_use]
    pub const fn seat_number(&self) -> u32 {
        self.seat_number
    }

    /// Seat kind
    #[must_use]
    pub const fn seat_type(&self) -> SeatType {
        self.seat_type
    }

    /// State at snapshot time
    #[must_use]
    pub const fn seat_state(&self) -> SeatState {
        self.seat_state
    }

    /// Raw accessible label
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Back-reference to the DOM node
    #[must_use]
    pub const fn handle(&self) -> &ElementHandle {
        &self.handle
    }

    /// Whether a strategy may target this seat
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.seat_state.is_selectable()
    }

    /// `(row, seat_number)`
    #[must_use]
    pub const fn location(&self) -> (u32, u32) {
        (self.row, self.seat_number)
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row {} seat {} ({}, {})",
            self.row, self.seat_number, self.seat_type, self.seat_state
        )
    }
}

/// Parse a raw descriptor leniently: unparsable labels become `(0, 0)`.
#[must_use]
pub fn parse_seat(raw: &RawSeat, handle: ElementHandle) -> Seat {
    let (row, seat_number) = parse_location(&raw.label).unwrap_or_else(|| {
        tracing::warn!(label = %raw.label, "seat label has no row/number, defaulting to 0-0");
        (0, 0)
    });
    build_seat(raw, handle, row, seat_number)
}

/// Parse a raw descriptor under the given label policy.
pub fn parse_seat_with(
    raw: &RawSeat,
    handle: ElementHandle,
    parsing: LabelParsing,
) -> SeatResult<Seat> {
    match parsing {
        LabelParsing::Lenient => Ok(parse_seat(raw, handle)),
        LabelParsing::Strict => {
            let (row, seat_number) =
                parse_location(&raw.label).ok_or_else(|| SeatError::Parse {
                    label: raw.label.clone(),
                })?;
            Ok(build_seat(raw, handle, row, seat_number))
        }
    }
}

fn build_seat(raw: &RawSeat, handle: ElementHandle, row: u32, seat_number: u32) -> Seat {
    Seat {
        row,
        seat_number,
        seat_type: detect_seat_type(&raw.class_names, &raw.label),
        seat_state: detect_seat_state(raw),
        label: raw.label.clone(),
        handle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> ElementHandle {
        ElementHandle::new("seat-0")
    }

    mod location_tests {
        use super::*;

        #[test]
        fn test_parse_row_and_number() {
            assert_eq!(parse_location("Fila 5 - Butaca 12"), None);
            assert_eq!(parse_location("5-12"), Some((5, 12)));
            assert_eq!(parse_location("Row 5 - 12"), Some((5, 12)));
            assert_eq!(parse_location("seat 7 3 free"), Some((7, 3)));
        }

        #[test]
        fn test_first_two_integers_win() {
            assert_eq!(parse_location("3 4 5 6"), Some((3, 4)));
        }

        #[test]
        fn test_unparsable_label_defaults_to_zero() {
            let seat = parse_seat(&RawSeat::new("Wheelchair space"), handle());
            assert_eq!(seat.location(), (0, 0));
        }

        #[test]
        fn test_strict_parsing_rejects_unparsable_label() {
            let err = parse_seat_with(&RawSeat::new("no numbers"), handle(), LabelParsing::Strict)
                .unwrap_err();
            assert!(matches!(err, SeatError::Parse { .. }));
        }

        #[test]
        fn test_strict_parsing_accepts_valid_label() {
            let seat =
                parse_seat_with(&RawSeat::new("9 - 14"), handle(), LabelParsing::Strict).unwrap();
            assert_eq!(seat.location(), (9, 14));
        }
    }

    mod type_tests {
        use super::*;

        #[test]
        fn test_default_is_normal() {
            assert_eq!(detect_seat_type("seat seat--available", "1-1"), SeatType::Normal);
        }

        #[test]
        fn test_wheelchair_beats_vip() {
            assert_eq!(
                detect_seat_type("seat seat--vip seat--wheelchair", ""),
                SeatType::Wheelchair
            );
        }

        #[test]
        fn test_priority_order() {
            assert_eq!(detect_seat_type("companion vip", ""), SeatType::Companion);
            assert_eq!(detect_seat_type("recliner vip", ""), SeatType::Vip);
            assert_eq!(detect_seat_type("seat--recliner", ""), SeatType::Recliner);
        }

        #[test]
        fn test_label_fallback() {
            assert_eq!(detect_seat_type("seat", "VIP 3-4"), SeatType::Vip);
            // class marker wins over label text
            assert_eq!(detect_seat_type("seat--recliner", "VIP 3-4"), SeatType::Recliner);
        }
    }

    mod state_tests {
        use super::*;

        #[test]
        fn test_label_unavailable_beats_pressed() {
            let raw = RawSeat::new("Row 1 - 2 Unavailable").with_pressed("false");
            assert_eq!(detect_seat_state(&raw), SeatState::Unavailable);
        }

        #[test]
        fn test_icon_ref() {
            let raw = RawSeat::new("1-1").with_icon("#icon-seat-house");
            assert_eq!(detect_seat_state(&raw), SeatState::Unavailable);
            let raw = RawSeat::new("1-1").with_icon("#icon-seat-unavailable");
            assert_eq!(detect_seat_state(&raw), SeatState::Unavailable);
            let raw = RawSeat::new("1-1").with_icon("#icon-seat-selected");
            assert_eq!(detect_seat_state(&raw), SeatState::Selected);
            let raw = RawSeat::new("1-1")
                .with_icon("#icon-seat-available")
                .with_pressed("true");
            assert_eq!(detect_seat_state(&raw), SeatState::Available);
        }

        #[test]
        fn test_class_suffix() {
            let raw = RawSeat::new("1-1").with_classes("seat seat--selected");
            assert_eq!(detect_seat_state(&raw), SeatState::Selected);
            let raw = RawSeat::new("1-1").with_classes("seat seat--unavailable");
            assert_eq!(detect_seat_state(&raw), SeatState::Unavailable);
            let raw = RawSeat::new("1-1")
                .with_classes("seat seat--available")
                .with_pressed("true");
            assert_eq!(detect_seat_state(&raw), SeatState::Available);
        }

        #[test]
        fn test_pressed_attribute() {
            assert_eq!(
                detect_seat_state(&RawSeat::new("1-1").with_pressed("true")),
                SeatState::Selected
            );
            assert_eq!(
                detect_seat_state(&RawSeat::new("1-1").with_pressed("false")),
                SeatState::Available
            );
            assert_eq!(
                detect_seat_state(&RawSeat::new("1-1").with_pressed("mixed")),
                SeatState::Unknown
            );
        }

        #[test]
        fn test_no_signal_is_unknown() {
            assert_eq!(detect_seat_state(&RawSeat::new("1-1")), SeatState::Unknown);
        }

        #[test]
        fn test_rules_are_ordered_by_trust() {
            let signals: Vec<_> = STATE_RULES.iter().map(|r| r.signal).collect();
            assert_eq!(
                signals,
                vec![
                    StateSignal::Label,
                    StateSignal::IconRef,
                    StateSignal::ClassSuffix,
                    StateSignal::Pressed
                ]
            );
        }

        #[test]
        fn test_only_available_is_selectable() {
            assert!(SeatState::Available.is_selectable());
            assert!(!SeatState::Selected.is_selectable());
            assert!(!SeatState::Unavailable.is_selectable());
            assert!(!SeatState::Unknown.is_selectable());
        }
    }

    #[test]
    fn test_parse_seat_full() {
        let raw = RawSeat::new("Fila 4 - 11")
            .with_classes("seat seat--vip seat--available")
            .with_pressed("false");
        let seat = parse_seat(&raw, ElementHandle::new("seat-42"));
        assert_eq!(seat.row(), 4);
        assert_eq!(seat.seat_number(), 11);
        assert_eq!(seat.seat_type(), SeatType::Vip);
        assert_eq!(seat.seat_state(), SeatState::Available);
        assert_eq!(seat.label(), "Fila 4 - 11");
        assert_eq!(seat.handle().id(), "seat-42");
        assert_eq!(seat.to_string(), "row 4 seat 11 (vip, available)");
    }

    #[test]
    fn test_raw_seat_yaml() {
        let yaml = "label: \"2-3\"\nclass_names: seat seat--available\npressed: \"false\"\n";
        let raw: RawSeat = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(raw.label, "2-3");
        assert!(raw.icon_ref.is_none());
    }
}
