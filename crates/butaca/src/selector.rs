//! Seat-map selector: strategies executed against the live map.
//!
//! Every strategy follows the same sequence:
//!
//! ```text
//! validate request ──► fresh snapshot ──► plan (pure) ──► click + confirm, in order
//! ```
//!
//! Planning never touches the browser, so a request that cannot be satisfied
//! fails before any click is issued. Clicks are confirmed one at a time by
//! waiting for `aria-pressed` to flip; a pause between clicks lets the map
//! recompute neighbour availability.

use crate::config::SelectorConfig;
use crate::driver::{
    BrowserActionPort, ClickOptions, SeatMapSnapshotProvider, PRESSED_ATTRIBUTE,
};
use crate::result::{SeatError, SeatResult};
use crate::seat::{detect_seat_state, Seat, SeatState};
use crate::snapshot::SeatSnapshot;
use crate::strategy::{self, check_seat_count, Strategy};
use crate::wait::pause;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Selects seats on a seat map through the two browser ports
#[derive(Debug)]
pub struct SeatMapSelector<A, P> {
    actions: A,
    provider: P,
    config: SelectorConfig,
    rng: StdRng,
}

impl<T> SeatMapSelector<Arc<T>, Arc<T>>
where
    T: BrowserActionPort + SeatMapSnapshotProvider + ?Sized,
{
    /// Selector over a page that implements both ports
    #[must_use]
    pub fn from_page(page: Arc<T>, config: SelectorConfig) -> Self {
        Self::new(Arc::clone(&page), page, config)
    }
}

impl<A, P> SeatMapSelector<A, P>
where
    A: BrowserActionPort,
    P: SeatMapSnapshotProvider,
{
    /// Create a selector with an entropy-seeded RNG
    #[must_use]
    pub fn new(actions: A, provider: P, config: SelectorConfig) -> Self {
        Self {
            actions,
            provider,
            config,
            rng: StdRng::from_entropy(),
        }
    }

    /// Reseed the RNG used by random strategies
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Action port
    #[must_use]
    pub const fn actions(&self) -> &A {
        &self.actions
    }

    // =========================================================================
    // READING
    // =========================================================================

    /// Read the whole map
    pub async fn snapshot(&self) -> SeatResult<SeatSnapshot> {
        SeatSnapshot::capture(&self.provider, self.config.label_parsing).await
    }

    /// Re-read one seat's state from its handle
    pub async fn seat_state(&self, seat: &Seat) -> SeatResult<SeatState> {
        let raw = self.provider.read_raw_seat(seat.handle()).await?;
        Ok(detect_seat_state(&raw))
    }

    /// Wait for the seat-map container to render
    pub async fn wait_for_seat_map(&self) -> SeatResult<()> {
        self.actions
            .wait_for_visible(
                &self.config.locators.seat_map,
                self.config.timing.visible_timeout(),
            )
            .await
    }

    // =========================================================================
    // CLICKING
    // =========================================================================

    /// Click a seat and wait until it reads as pressed
    pub async fn select_seat(&self, seat: &Seat) -> SeatResult<()> {
        debug!(row = seat.row(), seat = seat.seat_number(), "selecting seat");
        self.actions
            .click(seat.handle(), ClickOptions::default())
            .await?;
        self.actions
            .wait_for_attribute(
                seat.handle(),
                PRESSED_ATTRIBUTE,
                "true",
                self.config.timing.attribute_timeout(),
            )
            .await
    }

    /// Click a seat only if it is currently selected, then wait until it
    /// reads as released. Returns whether a click was issued.
    pub async fn deselect_seat(&self, seat: &Seat) -> SeatResult<bool> {
        if self.seat_state(seat).await? != SeatState::Selected {
            debug!(row = seat.row(), seat = seat.seat_number(), "seat not selected, skipping");
            return Ok(false);
        }
        debug!(row = seat.row(), seat = seat.seat_number(), "deselecting seat");
        self.actions
            .click(seat.handle(), ClickOptions::default())
            .await?;
        self.actions
            .wait_for_attribute(
                seat.handle(),
                PRESSED_ATTRIBUTE,
                "false",
                self.config.timing.attribute_timeout(),
            )
            .await?;
        Ok(true)
    }

    /// Select seats in order, pausing between clicks
    pub async fn select_seats(&self, seats: &[Seat], between: Duration) -> SeatResult<()> {
        for (i, seat) in seats.iter().enumerate() {
            if i > 0 {
                pause(between).await;
            }
            self.select_seat(seat).await?;
        }
        Ok(())
    }

    async fn execute(&self, strategy: Strategy, seats: Vec<Seat>) -> SeatResult<Vec<Seat>> {
        let between = match strategy {
            Strategy::SplitGroupInRow => self.config.timing.group_pause(),
            _ => self.config.timing.click_pause(),
        };
        info!(
            strategy = %strategy,
            seats = ?seats.iter().map(Seat::location).collect::<Vec<_>>(),
            "selecting planned seats"
        );
        self.select_seats(&seats, between).await?;
        Ok(seats)
    }

    // =========================================================================
    // STRATEGIES
    // =========================================================================

    /// Run any strategy on a fresh snapshot
    pub async fn select_with(&mut self, strategy: Strategy) -> SeatResult<Vec<Seat>> {
        if let Strategy::LastAvailableN(n) | Strategy::RandomN(n) = strategy {
            check_seat_count(n)?;
        }
        let snapshot = self.snapshot().await?;
        let seats = strategy::plan(strategy, &snapshot, &mut self.rng)?;
        self.execute(strategy, seats).await
    }

    /// Highest row, then highest seat number
    pub async fn select_last_available_seat(&mut self) -> SeatResult<Seat> {
        let seats = self.select_with(Strategy::LastAvailable).await?;
        single(seats)
    }

    /// `count` seats from the back of the map
    pub async fn select_last_available_seats(&mut self, count: usize) -> SeatResult<Vec<Seat>> {
        self.select_with(Strategy::LastAvailableN(count)).await
    }

    /// One uniformly random available seat
    pub async fn select_random_seat(&mut self) -> SeatResult<Seat> {
        let seats = self.select_with(Strategy::Random).await?;
        single(seats)
    }

    /// `count` distinct random seats
    pub async fn select_random_seats(&mut self, count: usize) -> SeatResult<Vec<Seat>> {
        self.select_with(Strategy::RandomN(count)).await
    }

    /// Two seats with one empty seat between them
    pub async fn select_seats_leaving_gap(&mut self) -> SeatResult<Vec<Seat>> {
        self.select_with(Strategy::GapPair).await
    }

    /// Seats `n`, `n + 1` and `n + 4` of one row
    pub async fn select_split_group_in_row(&mut self) -> SeatResult<Vec<Seat>> {
        self.select_with(Strategy::SplitGroupInRow).await
    }

    /// An adjacent pair in one row and a single seat further forward
    pub async fn select_split_group_across_rows(&mut self) -> SeatResult<Vec<Seat>> {
        self.select_with(Strategy::SplitGroupAcrossRows).await
    }
}

fn single(seats: Vec<Seat>) -> SeatResult<Seat> {
    seats
        .into_iter()
        .next()
        .ok_or_else(|| SeatError::not_found("no available seats"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SelectionTiming;
    use crate::mock::MockSeatMap;

    type MockSelector = SeatMapSelector<Arc<MockSeatMap>, Arc<MockSeatMap>>;

    fn setup(map: MockSeatMap) -> (Arc<MockSeatMap>, MockSelector) {
        setup_with_timing(map, SelectionTiming::immediate())
    }

    fn setup_with_timing(
        map: MockSeatMap,
        timing: SelectionTiming,
    ) -> (Arc<MockSeatMap>, MockSelector) {
        let map = Arc::new(map.with_poll_interval(Duration::from_millis(1)));
        let config = SelectorConfig::new().with_timing(timing);
        let selector = SeatMapSelector::from_page(Arc::clone(&map), config).with_seed(7);
        (map, selector)
    }

    fn paced() -> SelectionTiming {
        SelectionTiming {
            click_pause_ms: 30,
            group_pause_ms: 400,
            ..SelectionTiming::immediate()
        }
    }

    #[tokio::test]
    async fn test_select_then_deselect() {
        let (map, selector) = setup(MockSeatMap::from_rows(&[(1, &[1, 2])]));
        let snapshot = selector.snapshot().await.unwrap();
        let seat = snapshot.find(1, 2).unwrap();

        selector.select_seat(seat).await.unwrap();
        assert_eq!(selector.seat_state(seat).await.unwrap(), SeatState::Selected);

        assert!(selector.deselect_seat(seat).await.unwrap());
        assert_eq!(selector.seat_state(seat).await.unwrap(), SeatState::Available);
        assert_eq!(map.clicks().len(), 2);
    }

    #[tokio::test]
    async fn test_deselect_skips_unselected_seat() {
        let (map, selector) = setup(MockSeatMap::from_rows(&[(1, &[1])]));
        let snapshot = selector.snapshot().await.unwrap();
        assert!(!selector.deselect_seat(&snapshot.seats()[0]).await.unwrap());
        assert!(map.clicks().is_empty());
    }

    #[tokio::test]
    async fn test_last_available_seat() {
        let (_, mut selector) = setup(MockSeatMap::from_rows(&[(1, &[3]), (2, &[1, 5])]));
        let seat = selector.select_last_available_seat().await.unwrap();
        assert_eq!(seat.location(), (2, 5));
    }

    #[tokio::test]
    async fn test_wait_for_seat_map() {
        let (_, selector) = setup(MockSeatMap::default());
        assert!(selector.wait_for_seat_map().await.unwrap_err().is_timeout());

        let map = MockSeatMap::default().with_locators(&SelectorConfig::default().locators);
        let (_, selector) = setup(map);
        selector.wait_for_seat_map().await.unwrap();
    }

    #[tokio::test]
    async fn test_split_in_row_uses_click_order() {
        let (map, mut selector) = setup(MockSeatMap::from_rows(&[(4, &[1, 2, 3, 4, 5])]));
        let seats = selector.select_split_group_in_row().await.unwrap();
        let numbers: Vec<u32> = seats.iter().map(Seat::seat_number).collect();
        assert_eq!(numbers, vec![1, 2, 5]);
        assert_eq!(map.clicks(), vec!["seat-0", "seat-1", "seat-4"]);
    }

    mod pause_tests {
        use super::*;
        use tokio::time::Instant;

        #[tokio::test(start_paused = true)]
        async fn test_split_in_row_waits_group_pause() {
            let (_, mut selector) =
                setup_with_timing(MockSeatMap::from_rows(&[(4, &[1, 2, 3, 4, 5])]), paced());
            let start = Instant::now();
            selector.select_split_group_in_row().await.unwrap();
            let elapsed = start.elapsed();
            assert!(elapsed >= Duration::from_millis(800), "{elapsed:?}");
            assert!(elapsed < Duration::from_millis(900), "{elapsed:?}");
        }

        #[tokio::test(start_paused = true)]
        async fn test_other_strategies_wait_click_pause() {
            let (_, mut selector) =
                setup_with_timing(MockSeatMap::from_rows(&[(1, &[1, 2, 3])]), paced());
            let start = Instant::now();
            selector.select_seats_leaving_gap().await.unwrap();
            let elapsed = start.elapsed();
            assert!(elapsed >= Duration::from_millis(30), "{elapsed:?}");
            assert!(elapsed < Duration::from_millis(400), "{elapsed:?}");
        }

        #[tokio::test(start_paused = true)]
        async fn test_split_across_rows_waits_click_pause() {
            let (_, mut selector) =
                setup_with_timing(MockSeatMap::from_rows(&[(1, &[1]), (2, &[1, 2])]), paced());
            let start = Instant::now();
            selector.select_split_group_across_rows().await.unwrap();
            let elapsed = start.elapsed();
            assert!(elapsed >= Duration::from_millis(60), "{elapsed:?}");
            assert!(elapsed < Duration::from_millis(400), "{elapsed:?}");
        }
    }
}
