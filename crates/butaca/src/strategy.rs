//! Seat selection strategies.
//!
//! Each strategy is a pure function from a [`SeatSnapshot`] to the seats it
//! would click. Planning happens before any browser action, so a strategy
//! that cannot be satisfied fails without side effects.
//!
//! The patterns encode awkward seat-map configurations (single-seat gaps,
//! groups split inside a row or across rows) that the booking flow is
//! expected to warn about or reject.

use crate::result::{SeatError, SeatResult};
use crate::seat::{Seat, MAX_SEAT_SELECTION};
use crate::snapshot::SeatSnapshot;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

/// Seat offsets of a group split inside one row: a pair, two empty seats,
/// then a single seat.
pub const SPLIT_GROUP_OFFSETS: [u32; 3] = [0, 1, 4];

/// Seat offsets of a pair leaving a single-seat gap
pub const GAP_PAIR_OFFSETS: [u32; 3] = [0, 1, 2];

/// Named selection strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "strategy", content = "count", rename_all = "kebab-case")]
pub enum Strategy {
    /// Highest row, highest number
    LastAvailable,
    /// First `n` seats in last-available order
    LastAvailableN(usize),
    /// One uniformly random seat
    Random,
    /// `n` distinct random seats
    RandomN(usize),
    /// Two seats with one empty seat between them
    GapPair,
    /// Pair plus a single seat four places along, same row
    SplitGroupInRow,
    /// Pair in one row plus a single seat in a row further forward
    SplitGroupAcrossRows,
}

impl Strategy {
    /// Every strategy name accepted by [`FromStr`]
    pub const NAMES: [&'static str; 5] = [
        "last-available",
        "random",
        "gap-pair",
        "split-in-row",
        "split-across-rows",
    ];

    /// Kebab-case name, without the count
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::LastAvailable | Self::LastAvailableN(_) => "last-available",
            Self::Random | Self::RandomN(_) => "random",
            Self::GapPair => "gap-pair",
            Self::SplitGroupInRow => "split-in-row",
            Self::SplitGroupAcrossRows => "split-across-rows",
        }
    }

    /// Number of seats the strategy selects on success
    #[must_use]
    pub const fn seat_count(&self) -> usize {
        match self {
            Self::LastAvailable | Self::Random => 1,
            Self::LastAvailableN(n) | Self::RandomN(n) => *n,
            Self::GapPair => 2,
            Self::SplitGroupInRow | Self::SplitGroupAcrossRows => 3,
        }
    }

    /// Build a strategy from a name and optional count
    pub fn from_name(name: &str, count: Option<usize>) -> SeatResult<Self> {
        match (name.trim().to_lowercase().as_str(), count) {
            ("last-available", None) => Ok(Self::LastAvailable),
            ("last-available", Some(n)) => Ok(Self::LastAvailableN(n)),
            ("random", None) => Ok(Self::Random),
            ("random", Some(n)) => Ok(Self::RandomN(n)),
            ("gap-pair", None) => Ok(Self::GapPair),
            ("split-in-row", None) => Ok(Self::SplitGroupInRow),
            ("split-across-rows", None) => Ok(Self::SplitGroupAcrossRows),
            (other, Some(_)) if Self::NAMES.iter().any(|n| *n == other) => Err(
                SeatError::invalid_request(format!("strategy {other} takes no seat count")),
            ),
            (other, _) => Err(SeatError::invalid_request(format!(
                "unknown strategy {other:?}, expected one of {}",
                Self::NAMES.join(", ")
            ))),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LastAvailableN(n) | Self::RandomN(n) => write!(f, "{}:{n}", self.name()),
            _ => f.write_str(self.name()),
        }
    }
}

impl FromStr for Strategy {
    type Err = SeatError;

    /// `name` or `name:count`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((name, count)) => {
                let count = count.trim().parse().map_err(|_| {
                    SeatError::invalid_request(format!("invalid seat count in {s:?}"))
                })?;
                Self::from_name(name, Some(count))
            }
            None => Self::from_name(s, None),
        }
    }
}

// =============================================================================
// REQUEST VALIDATION
// =============================================================================

/// Reject counts of zero or above [`MAX_SEAT_SELECTION`]
pub fn check_seat_count(count: usize) -> SeatResult<()> {
    if count == 0 {
        return Err(SeatError::invalid_request("at least one seat must be requested"));
    }
    if count > MAX_SEAT_SELECTION {
        return Err(SeatError::invalid_request(format!(
            "{count} seats requested, at most {MAX_SEAT_SELECTION} may be selected"
        )));
    }
    Ok(())
}

fn check_available(available: usize, count: usize) -> SeatResult<()> {
    if available == 0 {
        return Err(SeatError::not_found("no available seats"));
    }
    if available < count {
        return Err(SeatError::invalid_request(format!(
            "{count} seats requested but only {available} available"
        )));
    }
    Ok(())
}

// =============================================================================
// STRATEGIES
// =============================================================================

fn last_available_order(snapshot: &SeatSnapshot) -> Vec<&Seat> {
    let mut seats = snapshot.available();
    seats.sort_by_key(|s| Reverse((s.row(), s.seat_number())));
    seats
}

/// Highest row, then highest seat number
pub fn plan_last_available(snapshot: &SeatSnapshot) -> SeatResult<Seat> {
    last_available_order(snapshot)
        .first()
        .map(|s| (*s).clone())
        .ok_or_else(|| SeatError::not_found("no available seats"))
}

/// First `count` seats in last-available order
pub fn plan_last_available_n(snapshot: &SeatSnapshot, count: usize) -> SeatResult<Vec<Seat>> {
    check_seat_count(count)?;
    let ordered = last_available_order(snapshot);
    check_available(ordered.len(), count)?;
    Ok(ordered.into_iter().take(count).cloned().collect())
}

/// One seat chosen uniformly at random
pub fn plan_random<R: Rng + ?Sized>(snapshot: &SeatSnapshot, rng: &mut R) -> SeatResult<Seat> {
    let available = snapshot.available();
    if available.is_empty() {
        return Err(SeatError::not_found("no available seats"));
    }
    let index = rng.gen_range(0..available.len());
    Ok(available[index].clone())
}

/// `count` distinct seats from a Fisher–Yates shuffle
pub fn plan_random_n<R: Rng + ?Sized>(
    snapshot: &SeatSnapshot,
    count: usize,
    rng: &mut R,
) -> SeatResult<Vec<Seat>> {
    check_seat_count(count)?;
    let mut available = snapshot.available();
    check_available(available.len(), count)?;
    available.shuffle(rng);
    Ok(available.into_iter().take(count).cloned().collect())
}

/// Seats `n` and `n + 2` of the first run of three consecutive seats,
/// scanning rows front to back and each row left to right
pub fn plan_gap_pair(snapshot: &SeatSnapshot) -> SeatResult<Vec<Seat>> {
    let matrix = snapshot.matrix();
    matrix
        .rows()
        .iter()
        .find_map(|row| {
            (0..row.seats.len()).find_map(|i| row.matches_offsets(i, &GAP_PAIR_OFFSETS))
        })
        .map(|run| vec![run[0].clone(), run[2].clone()])
        .ok_or_else(|| SeatError::not_found("no row has three consecutive available seats"))
}

/// Seats `n`, `n + 1` and `n + 4` of one row, scanning rows back to front
pub fn plan_split_group_in_row(snapshot: &SeatSnapshot) -> SeatResult<Vec<Seat>> {
    let matrix = snapshot.matrix();
    // the row iterator borrows `matrix` and must be dropped before it
    let group = matrix
        .rows_back_to_front()
        .find_map(|row| {
            (0..row.seats.len()).find_map(|i| row.matches_offsets(i, &SPLIT_GROUP_OFFSETS))
        })
        .map(|group| group.into_iter().cloned().collect())
        .ok_or_else(|| SeatError::not_found("no row matches the split-group pattern"));
    group
}

/// First adjacent pair from the back, plus the first seat of the next row
/// further forward
pub fn plan_split_group_across_rows(snapshot: &SeatSnapshot) -> SeatResult<Vec<Seat>> {
    let matrix = snapshot.matrix();
    let mut rows = matrix.rows_back_to_front();
    let mut group: Vec<&Seat> = Vec::with_capacity(3);

    for row in rows.by_ref() {
        if let Some((first, second)) = row.first_adjacent_pair() {
            group.extend([first, second]);
            break;
        }
    }
    if let Some(seat) = rows.find_map(|row| row.seats.first().copied()) {
        group.push(seat);
    }

    if group.len() < 3 {
        return Err(SeatError::not_found(format!(
            "split group across rows needs 3 seats, found {}",
            group.len()
        )));
    }
    Ok(group.into_iter().cloned().collect())
}

/// Plan any strategy
pub fn plan<R: Rng + ?Sized>(
    strategy: Strategy,
    snapshot: &SeatSnapshot,
    rng: &mut R,
) -> SeatResult<Vec<Seat>> {
    match strategy {
        Strategy::LastAvailable => plan_last_available(snapshot).map(|s| vec![s]),
        Strategy::LastAvailableN(n) => plan_last_available_n(snapshot, n),
        Strategy::Random => plan_random(snapshot, rng).map(|s| vec![s]),
        Strategy::RandomN(n) => plan_random_n(snapshot, n, rng),
        Strategy::GapPair => plan_gap_pair(snapshot),
        Strategy::SplitGroupInRow => plan_split_group_in_row(snapshot),
        Strategy::SplitGroupAcrossRows => plan_split_group_across_rows(snapshot),
    }
}
