//! Point-in-time seat-map snapshots.
//!
//! A snapshot is valid only for the instant it was read. Clicking a seat can
//! lock or release its neighbours on the live map, so every strategy call
//! captures a fresh one.

use crate::driver::SeatMapSnapshotProvider;
use crate::result::SeatResult;
use crate::seat::{parse_seat_with, LabelParsing, Seat, SeatState};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use tracing::debug;

/// Immutable read of every seat on the map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeatSnapshot {
    seats: Vec<Seat>,
}

impl SeatSnapshot {
    /// Wrap already-parsed seats
    #[must_use]
    pub fn from_seats(seats: Vec<Seat>) -> Self {
        Self { seats }
    }

    /// Read and parse every seat node the provider lists
    pub async fn capture<P>(provider: &P, parsing: LabelParsing) -> SeatResult<Self>
    where
        P: SeatMapSnapshotProvider + ?Sized,
    {
        let handles = provider.list_seat_handles().await?;
        let mut seats = Vec::with_capacity(handles.len());
        for handle in handles {
            let raw = provider.read_raw_seat(&handle).await?;
            seats.push(parse_seat_with(&raw, handle, parsing)?);
        }

        let snapshot = Self { seats };
        debug!(
            total = snapshot.len(),
            available = snapshot.count(SeatState::Available),
            "captured seat map snapshot"
        );
        Ok(snapshot)
    }

    /// All seats in DOM order
    #[must_use]
    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    /// Number of seats
    #[must_use]
    pub fn len(&self) -> usize {
        self.seats.len()
    }

    /// Whether the map rendered no seats
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// Seats a strategy may target
    #[must_use]
    pub fn available(&self) -> Vec<&Seat> {
        self.seats.iter().filter(|s| s.is_available()).collect()
    }

    /// Seats in a given state
    #[must_use]
    pub fn in_state(&self, state: SeatState) -> Vec<&Seat> {
        self.seats
            .iter()
            .filter(|s| s.seat_state() == state)
            .collect()
    }

    /// Count seats in a given state
    #[must_use]
    pub fn count(&self, state: SeatState) -> usize {
        self.seats.iter().filter(|s| s.seat_state() == state).count()
    }

    /// Look up a seat by location
    #[must_use]
    pub fn find(&self, row: u32, seat_number: u32) -> Option<&Seat> {
        self.seats
            .iter()
            .find(|s| s.row() == row && s.seat_number() == seat_number)
    }

    /// Available seats grouped by row
    #[must_use]
    pub fn matrix(&self) -> SeatMatrix<'_> {
        SeatMatrix::from_seats(self.available())
    }

    /// Counts by state and type
    #[must_use]
    pub fn summary(&self) -> SnapshotSummary {
        let mut by_type = BTreeMap::new();
        for seat in &self.seats {
            *by_type.entry(seat.seat_type().as_str().to_string()).or_insert(0) += 1;
        }
        SnapshotSummary {
            total: self.len(),
            available: self.count(SeatState::Available),
            selected: self.count(SeatState::Selected),
            unavailable: self.count(SeatState::Unavailable),
            unknown: self.count(SeatState::Unknown),
            by_type,
        }
    }
}

/// Aggregate counts of a snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SnapshotSummary {
    /// All seats
    pub total: usize,
    /// Available seats
    pub available: usize,
    /// Selected seats
    pub selected: usize,
    /// Unavailable seats
    pub unavailable: usize,
    /// Seats with no recognisable state
    pub unknown: usize,
    /// Seat count per type name
    pub by_type: BTreeMap<String, usize>,
}

// =============================================================================
// SEAT MATRIX
// =============================================================================

/// One row of available seats, ordered by seat number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatRow<'a> {
    /// Row index
    pub row: u32,
    /// Seats ordered by ascending seat number
    pub seats: Vec<&'a Seat>,
}

impl<'a> SeatRow<'a> {
    /// Seat at `index` whose number is `first + offset`, if both exist
    fn numbered_at(&self, index: usize, first: u32, offset: u32) -> Option<&'a Seat> {
        self.seats
            .get(index)
            .copied()
            .filter(|s| Some(s.seat_number()) == first.checked_add(offset))
    }

    /// Whether seats at `start + offsets[k]` are numbered `n + offsets[k]`,
    /// where `n` is the number of the seat at `start`
    #[must_use]
    pub fn matches_offsets(&self, start: usize, offsets: &[u32]) -> Option<Vec<&'a Seat>> {
        let first = self.seats.get(start)?.seat_number();
        offsets
            .iter()
            .map(|&offset| {
                let index = start.checked_add(usize::try_from(offset).ok()?)?;
                self.numbered_at(index, first, offset)
            })
            .collect()
    }

    /// First pair of seats with consecutive numbers
    #[must_use]
    pub fn first_adjacent_pair(&self) -> Option<(&'a Seat, &'a Seat)> {
        (0..self.seats.len()).find_map(|i| {
            let pair = self.matches_offsets(i, &[0, 1])?;
            Some((pair[0], pair[1]))
        })
    }
}

/// Available seats grouped into rows ordered by ascending row number
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeatMatrix<'a> {
    rows: Vec<SeatRow<'a>>,
}

impl<'a> SeatMatrix<'a> {
    /// Group seats into rows; empty rows never appear
    #[must_use]
    pub fn from_seats(seats: Vec<&'a Seat>) -> Self {
        let mut grouped: BTreeMap<u32, Vec<&'a Seat>> = BTreeMap::new();
        for seat in seats {
            grouped.entry(seat.row()).or_default().push(seat);
        }

        let rows = grouped
            .into_iter()
            .map(|(row, mut seats)| {
                seats.sort_by_key(|s| s.seat_number());
                SeatRow { row, seats }
            })
            .collect();
        Self { rows }
    }

    /// Rows front (lowest row number) to back
    #[must_use]
    pub fn rows(&self) -> &[SeatRow<'a>] {
        &self.rows
    }

    /// Rows back (highest row number) to front
    pub fn rows_back_to_front(&self) -> impl Iterator<Item = &SeatRow<'a>> {
        self.rows.iter().rev()
    }

    /// Look up a row
    #[must_use]
    pub fn row(&self, row: u32) -> Option<&SeatRow<'a>> {
        self.rows.iter().find(|r| r.row == row)
    }

    /// Number of non-empty rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no seat is available
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Text rendering, one line per row, back row first
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for row in self.rows_back_to_front() {
            let numbers: Vec<String> = row
                .seats
                .iter()
                .map(|s| s.seat_number().to_string())
                .collect();
            let _ = writeln!(out, "{:>3} | {}", row.row, numbers.join(" "));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::ElementHandle;
    use crate::seat::{parse_seat, RawSeat};

    fn seat(row: u32, number: u32, pressed: &str) -> Seat {
        parse_seat(
            &RawSeat::new(format!("{row}-{number}")).with_pressed(pressed),
            ElementHandle::new(format!("seat-{row}-{number}")),
        )
    }

    fn snapshot() -> SeatSnapshot {
        SeatSnapshot::from_seats(vec![
            seat(2, 3, "false"),
            seat(1, 2, "false"),
            seat(2, 1, "false"),
            seat(1, 1, "true"),
            seat(3, 1, "false"),
            seat(3, 2, "false"),
            parse_seat(
                &RawSeat::new("3-3").with_classes("seat--unavailable"),
                ElementHandle::new("seat-3-3"),
            ),
        ])
    }

    #[test]
    fn test_available_filters_states() {
        let snap = snapshot();
        assert_eq!(snap.len(), 7);
        assert_eq!(snap.available().len(), 5);
        assert_eq!(snap.count(SeatState::Selected), 1);
        assert_eq!(snap.count(SeatState::Unavailable), 1);
    }

    #[test]
    fn test_find() {
        let snap = snapshot();
        assert_eq!(snap.find(1, 1).unwrap().seat_state(), SeatState::Selected);
        assert!(snap.find(9, 9).is_none());
    }

    #[test]
    fn test_matrix_orders_rows_and_seats() {
        let snap = snapshot();
        let matrix = snap.matrix();
        let rows: Vec<u32> = matrix.rows().iter().map(|r| r.row).collect();
        assert_eq!(rows, vec![1, 2, 3]);

        let row2: Vec<u32> = matrix.row(2).unwrap().seats.iter().map(|s| s.seat_number()).collect();
        assert_eq!(row2, vec![1, 3]);

        let back: Vec<u32> = matrix.rows_back_to_front().map(|r| r.row).collect();
        assert_eq!(back, vec![3, 2, 1]);
    }

    #[test]
    fn test_matrix_omits_empty_rows() {
        let snap = SeatSnapshot::from_seats(vec![seat(1, 1, "true"), seat(4, 1, "false")]);
        let matrix = snap.matrix();
        assert_eq!(matrix.len(), 1);
        assert!(matrix.row(1).is_none());
    }

    #[test]
    fn test_first_adjacent_pair() {
        let snap = snapshot();
        let matrix = snap.matrix();
        let (a, b) = matrix.row(3).unwrap().first_adjacent_pair().unwrap();
        assert_eq!((a.seat_number(), b.seat_number()), (1, 2));
        assert!(matrix.row(2).unwrap().first_adjacent_pair().is_none());
    }

    #[test]
    fn test_matches_offsets() {
        let seats: Vec<Seat> = [1, 2, 3, 4, 5].iter().map(|&n| seat(1, n, "false")).collect();
        let snap = SeatSnapshot::from_seats(seats);
        let matrix = snap.matrix();
        let row = matrix.row(1).unwrap();
        let picked = row.matches_offsets(0, &[0, 1, 4]).unwrap();
        let numbers: Vec<u32> = picked.iter().map(|s| s.seat_number()).collect();
        assert_eq!(numbers, vec![1, 2, 5]);
        assert!(row.matches_offsets(1, &[0, 1, 4]).is_none());
    }

    #[test]
    fn test_summary() {
        let summary = snapshot().summary();
        assert_eq!(summary.total, 7);
        assert_eq!(summary.available, 5);
        assert_eq!(summary.selected, 1);
        assert_eq!(summary.unavailable, 1);
        assert_eq!(summary.unknown, 0);
        assert_eq!(summary.by_type.get("normal"), Some(&7));
    }

    #[test]
    fn test_render() {
        let snap = snapshot();
        let rendered = snap.matrix().render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines, vec!["  3 | 1 2", "  2 | 1 3", "  1 | 2"]);
    }
}
