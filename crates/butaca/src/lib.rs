//! Butaca: seat-map selection for cinema booking tests
//!
//! Butaca (Spanish: "theatre seat") reads the seat map of a Cinesa or UCI
//! Cinemas booking page, picks seats with a named strategy, and clicks them
//! one at a time, confirming each click before the next.
//!
//! # Architecture
//!
//! ```text
//! SeatMapSnapshotProvider ──► RawSeat ──► Seat ──► SeatSnapshot
//!                                                       │
//!                                          Strategy ──► plan (pure)
//!                                                       │
//! BrowserActionPort ◄──── click, wait for aria-pressed ─┘
//! ```
//!
//! Both ports are implemented by [`MockSeatMap`] (in memory) and, with the
//! `browser` feature, by `ChromiumSeatMap` (live Chromium over CDP).

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

#[cfg(feature = "browser")]
#[allow(clippy::missing_errors_doc, clippy::doc_markdown)]
mod browser;
#[allow(clippy::missing_errors_doc)]
mod config;
mod driver;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod mock;
#[allow(clippy::missing_errors_doc)]
mod page_object;
mod result;
mod seat;
#[allow(clippy::missing_errors_doc)]
mod selector;
mod snapshot;
#[allow(clippy::missing_errors_doc)]
mod strategy;

#[allow(clippy::missing_errors_doc)]
pub mod wait;

#[cfg(feature = "browser")]
pub use browser::{ChromiumSeatMap, LaunchOptions};
pub use config::{
    Chain, Environment, SeatMapLocators, SelectionTiming, SelectorConfig, SiteConfig,
    DEFAULT_CLICK_PAUSE_MS, DEFAULT_GROUP_PAUSE_MS,
};
pub use driver::{
    BrowserActionPort, ClickOptions, ElementHandle, SeatMapSnapshotProvider, PRESSED_ATTRIBUTE,
};
pub use mock::{mock_seat, MockSeatMap, SeatMapFixture};
pub use page_object::{PageObject, SeatMapPage, UrlMatcher};
pub use result::{SeatError, SeatResult};
pub use seat::{
    detect_seat_state, detect_seat_type, parse_location, parse_seat, parse_seat_with,
    LabelParsing, RawSeat, Seat, SeatState, SeatType, StateRule, StateSignal,
    MAX_SEAT_SELECTION, SEAT_LABEL_PATTERN, STATE_RULES, TYPE_RULES,
};
pub use selector::SeatMapSelector;
pub use snapshot::{SeatMatrix, SeatRow, SeatSnapshot, SnapshotSummary};
pub use strategy::{
    check_seat_count, plan, plan_gap_pair, plan_last_available, plan_last_available_n,
    plan_random, plan_random_n, plan_split_group_across_rows, plan_split_group_in_row, Strategy,
    GAP_PAIR_OFFSETS, SPLIT_GROUP_OFFSETS,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::{
        BrowserActionPort, MockSeatMap, PageObject, RawSeat, Seat, SeatError, SeatMapFixture,
        SeatMapPage, SeatMapSelector, SeatMapSnapshotProvider, SeatResult, SeatSnapshot,
        SeatState, SeatType, SelectionTiming, SelectorConfig, Strategy,
    };
    #[cfg(feature = "browser")]
    pub use super::{ChromiumSeatMap, LaunchOptions};
}
