//! Property-based tests for seat parsing, detection and planning.
//!
//! Uses proptest to verify invariants hold for arbitrary labels, class
//! lists and seat grids.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use butaca::{
    detect_seat_state, detect_seat_type, parse_location, parse_seat, plan_gap_pair,
    plan_last_available, plan_last_available_n, plan_random_n, ElementHandle, RawSeat, Seat,
    SeatSnapshot, SeatState, SeatType, MAX_SEAT_SELECTION,
};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

fn grid(seats: &[(u32, u32)]) -> SeatSnapshot {
    SeatSnapshot::from_seats(
        seats
            .iter()
            .enumerate()
            .map(|(i, (row, number))| {
                parse_seat(
                    &RawSeat::new(format!("{row}-{number}")).with_pressed("false"),
                    ElementHandle::new(format!("seat-{i}")),
                )
            })
            .collect(),
    )
}

fn unique_seats() -> impl Strategy<Value = Vec<(u32, u32)>> {
    prop::collection::hash_set((1u32..12, 1u32..20), 0..40)
        .prop_map(|set| set.into_iter().collect())
}

// === Parsing ===

proptest! {
    /// The first two integers of the label are the row and seat number.
    #[test]
    fn prop_location_from_surrounding_text(
        prefix in "[A-Za-z ]{0,12}",
        row in 0u32..1000,
        sep in "( |-| - |  )",
        number in 0u32..1000,
        suffix in "[A-Za-z ]{0,12}"
    ) {
        let label = format!("{prefix}{row}{sep}{number}{suffix}");
        prop_assert_eq!(parse_location(&label), Some((row, number)));
    }

    /// Parsing is a pure function of the label.
    #[test]
    fn prop_parse_is_deterministic(label in ".{0,40}") {
        let raw = RawSeat::new(label);
        let a = parse_seat(&raw, ElementHandle::new("a"));
        let b = parse_seat(&raw, ElementHandle::new("a"));
        prop_assert_eq!(a, b);
    }

    /// Labels without digits always fall back to row 0, seat 0.
    #[test]
    fn prop_digitless_label_is_origin(label in "[^0-9]{0,40}") {
        let seat = parse_seat(&RawSeat::new(label), ElementHandle::new("x"));
        prop_assert_eq!(seat.location(), (0, 0));
    }
}

// === Detection priority ===

proptest! {
    /// Wheelchair wins over every other type marker.
    #[test]
    fn prop_wheelchair_beats_vip(
        before in "[a-z -]{0,10}",
        between in "[a-z -]{0,10}",
        vip_first in any::<bool>()
    ) {
        let classes = if vip_first {
            format!("{before}vip{between}wheelchair")
        } else {
            format!("{before}wheelchair{between}vip")
        };
        prop_assert_eq!(detect_seat_type(&classes, ""), SeatType::Wheelchair);
    }

    /// "unavailable" in the label beats any other signal.
    #[test]
    fn prop_unavailable_label_wins(
        pressed in prop::option::of(prop::sample::select(vec!["true", "false"])),
        class in prop::sample::select(vec!["", "seat--available", "seat--selected"]),
        icon in prop::option::of(prop::sample::select(vec!["#icon-seat-available", "#icon-seat-selected"])),
        upper in any::<bool>()
    ) {
        let word = if upper { "UNAVAILABLE" } else { "unavailable" };
        let mut raw = RawSeat::new(format!("3-4 {word}")).with_classes(class);
        raw.pressed = pressed.map(str::to_string);
        raw.icon_ref = icon.map(str::to_string);
        prop_assert_eq!(detect_seat_state(&raw), SeatState::Unavailable);
    }
}

// === Planning ===

proptest! {
    /// Last-available always picks the lexicographic maximum of (row, number).
    #[test]
    fn prop_last_available_is_maximum(seats in unique_seats()) {
        let snapshot = grid(&seats);
        match seats.iter().max() {
            Some(&expected) => {
                let seat = plan_last_available(&snapshot).unwrap();
                prop_assert_eq!(seat.location(), expected);
            }
            None => prop_assert!(plan_last_available(&snapshot).unwrap_err().is_not_found()),
        }
    }

    /// Multi-seat plans never exceed the cap nor the available count.
    #[test]
    fn prop_multi_seat_bounds(seats in unique_seats(), count in 0usize..15) {
        let snapshot = grid(&seats);
        let result = plan_last_available_n(&snapshot, count);
        if count == 0 || count > MAX_SEAT_SELECTION || count > seats.len() {
            prop_assert!(result.is_err());
        } else {
            prop_assert_eq!(result.unwrap().len(), count);
        }
    }

    /// Random plans return distinct available seats.
    #[test]
    fn prop_random_n_distinct(seats in unique_seats(), count in 1usize..=9, seed in any::<u64>()) {
        prop_assume!(count <= seats.len());
        let snapshot = grid(&seats);
        let mut rng = StdRng::seed_from_u64(seed);
        let picked = plan_random_n(&snapshot, count, &mut rng).unwrap();
        let unique: HashSet<(u32, u32)> = picked.iter().map(Seat::location).collect();
        prop_assert_eq!(unique.len(), count);
    }

    /// A gap pair is always two seats of one row, two numbers apart, with
    /// the middle seat available.
    #[test]
    fn prop_gap_pair_shape(seats in unique_seats()) {
        let snapshot = grid(&seats);
        if let Ok(pair) = plan_gap_pair(&snapshot) {
            prop_assert_eq!(pair.len(), 2);
            prop_assert_eq!(pair[0].row(), pair[1].row());
            prop_assert_eq!(pair[0].seat_number() + 2, pair[1].seat_number());
            prop_assert!(snapshot.find(pair[0].row(), pair[0].seat_number() + 1).is_some());
        }
    }
}
