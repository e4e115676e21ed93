//! The realtime leg session: a periodic refresh loop around one itinerary.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::digitransit::LegSource;
use crate::domain::{Itinerary, Leg};
use crate::geometry::{Enu, LatLon, LocalFrame, project_legs};
use crate::timing::reconcile;

use super::clock::Clock;
use super::config::SessionConfig;
use super::error::SessionError;
use super::refresh::refresh_legs;
use super::snapshot::Snapshot;

/// State shared between the session handle, its ticker and in-flight cycles.
struct Shared<S> {
    planned: Itinerary,
    source: Arc<S>,
    clock: Arc<dyn Clock>,
    frame: LocalFrame,
    geometry: Arc<[Vec<Enu>]>,
    snapshots: watch::Sender<Arc<Snapshot>>,
    stopped: AtomicBool,
    cycles: AtomicU64,
}

impl<S> Shared<S> {
    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    fn current(&self) -> Arc<Snapshot> {
        self.snapshots.borrow().clone()
    }

    fn publish(&self, snapshot: Snapshot) {
        self.snapshots.send_replace(Arc::new(snapshot));
    }
}

/// Keeps one itinerary's legs in step with realtime data.
///
/// On start the planned legs are published straight away. A ticker then
/// fires immediately and every `poll_interval`; each tick spawns a refresh
/// cycle that fetches every transit leg, merges the results into a copy of
/// the planned legs, reconciles, and publishes a new [`Snapshot`]. Cycles
/// are not serialized: if two overlap, whichever finishes last wins.
///
/// Once the current time reaches the end of the last leg the ticker
/// publishes one last snapshot at that time and exits.
///
/// Dropping the session stops it.
pub struct RealtimeLegSession<S> {
    shared: Arc<Shared<S>>,
    ticker: JoinHandle<()>,
}

impl<S: LegSource> RealtimeLegSession<S> {
    /// Start tracking `legs`.
    ///
    /// Fails if the itinerary is empty or any leg's geometry can't be
    /// decoded. Must be called from within a Tokio runtime.
    pub fn start(
        legs: Vec<Leg>,
        source: Arc<S>,
        clock: Arc<dyn Clock>,
        config: &SessionConfig,
    ) -> Result<Self, SessionError> {
        let planned = Itinerary::new(legs)?;

        let departure = &planned.first_leg().from;
        let frame = LocalFrame::new(LatLon::new(departure.lat, departure.lon));
        let geometry: Arc<[Vec<Enu>]> = project_legs(planned.legs(), &frame)?.into();

        let mut legs = planned.legs().to_vec();
        let report = reconcile(&mut legs);
        let initial = Snapshot::new(
            0,
            clock.now(),
            legs.into(),
            frame,
            Arc::clone(&geometry),
            report.conflicts,
        );
        let (snapshots, _) = watch::channel(Arc::new(initial));

        info!(
            legs = planned.legs().len(),
            boardings = planned.boardings(),
            realtime = planned.has_realtime_legs(),
            "session started"
        );

        let shared = Arc::new(Shared {
            planned,
            source,
            clock,
            frame,
            geometry,
            snapshots,
            stopped: AtomicBool::new(false),
            cycles: AtomicU64::new(0),
        });

        let ticker = tokio::spawn(run_ticker(Arc::clone(&shared), config.poll_interval));

        Ok(Self { shared, ticker })
    }
}

impl<S> RealtimeLegSession<S> {
    /// The latest published snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.shared.current()
    }

    /// Receive every snapshot as it's published.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.shared.snapshots.subscribe()
    }

    /// The itinerary as planned, before any realtime updates.
    pub fn planned(&self) -> &Itinerary {
        &self.shared.planned
    }

    /// Returns true once [`stop`](Self::stop) has been called.
    pub fn is_stopped(&self) -> bool {
        self.shared.is_stopped()
    }

    /// Returns true while the ticker is still scheduling refreshes.
    pub fn is_ticking(&self) -> bool {
        !self.ticker.is_finished()
    }

    /// Stop refreshing.
    ///
    /// Cycles already in flight finish but don't publish. Safe to call more
    /// than once.
    pub fn stop(&self) {
        if !self.shared.stopped.swap(true, Ordering::SeqCst) {
            debug!(
                cycles = self.shared.cycles.load(Ordering::SeqCst),
                "session stopped"
            );
        }
        self.ticker.abort();
    }
}

impl<S> Drop for RealtimeLegSession<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_ticker<S: LegSource>(shared: Arc<Shared<S>>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        if shared.is_stopped() {
            break;
        }

        let now = shared.clock.now();
        let current = shared.current();

        if current.end_time().is_some_and(|end| now >= end) {
            debug!(time = %now, "itinerary finished, ticker exiting");
            shared.publish(current.at(now));
            break;
        }

        let cycle = shared.cycles.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::spawn(run_cycle(Arc::clone(&shared), cycle));
    }
}

async fn run_cycle<S: LegSource>(shared: Arc<Shared<S>>, cycle: u64) {
    let refreshed = refresh_legs(shared.source.as_ref(), shared.planned.legs()).await;

    if shared.is_stopped() {
        debug!(cycle, "session stopped, discarding refresh");
        return;
    }

    shared.publish(Snapshot::new(
        cycle,
        shared.clock.now(),
        refreshed.legs.into(),
        shared.frame,
        Arc::clone(&shared.geometry),
        refreshed.report.conflicts,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digitransit::{DigitransitError, MockLegSource};
    use crate::domain::{
        DomainError, LegId, LegKind, LegTime, Mode, Place, RealtimeLeg, Timestamp,
        TransitDetails,
    };
    use crate::geometry::GeometryError;
    use crate::session::ManualClock;

    /// 2024-05-20T07:15:00Z
    const T0: i64 = 1_716_189_300_000;

    fn t(mins: i64) -> Timestamp {
        Timestamp::from_millis(T0 + mins * 60_000)
    }

    fn leg(kind: LegKind, start: i64, end: i64) -> Leg {
        Leg::new(
            kind,
            LegTime::scheduled(t(start)),
            LegTime::scheduled(t(end)),
            Place::new(60.1699, 24.9384),
            Place::new(60.1710, 24.9410),
        )
        .unwrap()
    }

    fn walk(start: i64, end: i64) -> Leg {
        leg(LegKind::Walk { mode: Mode::Walk }, start, end)
    }

    fn bus(id: &str, start: i64, end: i64) -> Leg {
        leg(
            LegKind::Transit(TransitDetails::new(Mode::Bus, Some(LegId::new(id)))),
            start,
            end,
        )
    }

    fn planned() -> Vec<Leg> {
        vec![
            walk(0, 10),
            bus("a", 10, 20),
            leg(LegKind::Transfer { mode: Mode::Walk }, 20, 24),
            bus("b", 25, 35),
            walk(35, 40),
        ]
    }

    fn realtime(id: &str, start: i64, end: i64) -> RealtimeLeg {
        RealtimeLeg {
            leg_id: LegId::new(id),
            realtime: true,
            realtime_state: None,
            start: LegTime::scheduled(t(start)),
            end: LegTime::scheduled(t(end)),
            destination_rental_station: None,
        }
    }

    fn on_time() -> MockLegSource {
        MockLegSource::new()
            .with_leg(realtime("a", 10, 20))
            .with_leg(realtime("b", 25, 35))
    }

    fn start(
        source: MockLegSource,
        clock: &Arc<ManualClock>,
    ) -> RealtimeLegSession<MockLegSource> {
        RealtimeLegSession::start(
            planned(),
            Arc::new(source),
            clock.clone(),
            &SessionConfig::default(),
        )
        .unwrap()
    }

    /// Let spawned tasks run without moving past the next tick.
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn initial_snapshot_is_planned() {
        let clock = Arc::new(ManualClock::new(t(5)));
        let session = start(on_time(), &clock);

        let snapshot = session.snapshot();
        assert_eq!(snapshot.cycle, 0);
        assert_eq!(snapshot.time, t(5));
        assert_eq!(&snapshot.legs[..], &planned()[..]);
        assert_eq!(snapshot.interest.current, Some(0));
        assert_eq!(snapshot.geometry.len(), 5);
        assert_eq!(session.planned().legs().len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn refreshes_immediately_then_every_period() {
        let source = on_time();
        let clock = Arc::new(ManualClock::new(t(5)));
        let session = start(source.clone(), &clock);

        settle().await;
        assert_eq!(source.fetch_count(), 2);
        assert_eq!(session.snapshot().cycle, 1);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(source.fetch_count(), 2);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(source.fetch_count(), 4);
        assert_eq!(session.snapshot().cycle, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_propagates_to_walks() {
        let source = MockLegSource::new()
            .with_leg(realtime("a", 14, 24))
            .with_leg(realtime("b", 25, 35));
        let clock = Arc::new(ManualClock::new(t(5)));
        let session = start(source, &clock);

        settle().await;
        let snapshot = session.snapshot();

        assert_eq!(snapshot.legs[0].start_time(), t(4));
        assert_eq!(snapshot.legs[0].end_time(), t(14));
        assert_eq!(snapshot.legs[2].start_time(), t(24));
        assert_eq!(snapshot.legs[2].end_time(), t(25));
        assert!(snapshot.conflicts.is_empty());
        // Now 5 minutes in, and the first walk starts at 4
        assert_eq!(snapshot.interest.current, Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_fetch_keeps_planned_timing() {
        let source = MockLegSource::new()
            .with_leg(realtime("a", 14, 24))
            .with_failure(LegId::new("b"), "upstream timeout");
        let clock = Arc::new(ManualClock::new(t(5)));
        let session = start(source, &clock);

        settle().await;
        let snapshot = session.snapshot();

        assert_eq!(snapshot.cycle, 1);
        assert_eq!(snapshot.legs[1].start_time(), t(14));
        assert_eq!(snapshot.legs[3].start_time(), t(25));
        assert!(!snapshot.legs[3].transit().unwrap().realtime);
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_each_cycle() {
        let clock = Arc::new(ManualClock::new(t(5)));
        let session = start(on_time(), &clock);
        let mut rx = session.subscribe();

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().cycle, 1);

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().cycle, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_prevents_fetches() {
        let source = on_time();
        let clock = Arc::new(ManualClock::new(t(5)));
        let session = start(source.clone(), &clock);

        settle().await;
        session.stop();
        session.stop();
        assert!(session.is_stopped());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(source.fetch_count(), 2);
        assert_eq!(session.snapshot().cycle, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_stops_ticker() {
        let source = on_time();
        let clock = Arc::new(ManualClock::new(t(5)));
        let session = start(source.clone(), &clock);

        settle().await;
        drop(session);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(source.fetch_count(), 2);
    }

    /// A source that takes a while to answer.
    struct SlowSource {
        inner: MockLegSource,
        delay: Duration,
    }

    impl LegSource for SlowSource {
        async fn fetch_leg(&self, id: &LegId) -> Result<RealtimeLeg, DigitransitError> {
            tokio::time::sleep(self.delay).await;
            self.inner.fetch_leg(id).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_cycle_discarded_after_stop() {
        let source = Arc::new(SlowSource {
            inner: on_time(),
            delay: Duration::from_secs(5),
        });
        let clock = Arc::new(ManualClock::new(t(5)));
        let session = RealtimeLegSession::start(
            planned(),
            Arc::clone(&source),
            clock.clone(),
            &SessionConfig::default(),
        )
        .unwrap();

        settle().await;
        session.stop();

        tokio::time::sleep(Duration::from_secs(10)).await;
        // The fetches completed but nothing was published
        assert_eq!(source.inner.fetch_count(), 2);
        assert_eq!(session.snapshot().cycle, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_cycles_last_publish_wins() {
        let source = Arc::new(SlowSource {
            inner: on_time(),
            delay: Duration::from_secs(15),
        });
        let clock = Arc::new(ManualClock::new(t(5)));
        let session = RealtimeLegSession::start(
            planned(),
            Arc::clone(&source),
            clock.clone(),
            &SessionConfig::default(),
        )
        .unwrap();

        // Cycle 1 starts at 0s, cycle 2 at 10s, and neither waits for the other
        tokio::time::sleep(Duration::from_secs(12)).await;
        assert_eq!(session.snapshot().cycle, 0);

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(session.snapshot().cycle, 1);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(session.snapshot().cycle, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn finished_itinerary_is_not_fetched() {
        let source = on_time();
        let clock = Arc::new(ManualClock::new(t(45)));
        let session = start(source.clone(), &clock);

        settle().await;

        assert_eq!(source.fetch_count(), 0);
        assert!(!session.is_ticking());
        let snapshot = session.snapshot();
        assert!(snapshot.is_finished());
        assert_eq!(snapshot.interest.previous, Some(4));
    }

    #[tokio::test(start_paused = true)]
    async fn stops_fetching_once_itinerary_ends() {
        let source = on_time();
        let clock = Arc::new(ManualClock::new(t(5)));
        let session = start(source.clone(), &clock);

        settle().await;
        assert_eq!(source.fetch_count(), 2);

        clock.set(t(41));
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(source.fetch_count(), 2);
        let snapshot = session.snapshot();
        assert_eq!(snapshot.time, t(41));
        assert_eq!(snapshot.cycle, 1);
        assert_eq!(snapshot.interest.current, None);
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_exits_after_final_snapshot() {
        let source = on_time();
        let clock = Arc::new(ManualClock::new(t(5)));
        let session = start(source.clone(), &clock);

        settle().await;
        assert!(session.is_ticking());

        clock.set(t(41));
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!session.is_ticking());
        assert!(!session.is_stopped());

        clock.set(t(90));
        tokio::time::sleep(Duration::from_secs(60)).await;
        // Nothing republishes once the ticker is gone
        assert_eq!(session.snapshot().time, t(41));
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn empty_itinerary_rejected() {
        let result = RealtimeLegSession::start(
            vec![],
            Arc::new(MockLegSource::new()),
            Arc::new(ManualClock::new(t(0))),
            &SessionConfig::default(),
        );

        assert!(matches!(
            result,
            Err(SessionError::Domain(DomainError::EmptyItinerary))
        ));
    }

    #[tokio::test]
    async fn bad_geometry_rejected() {
        let mut legs = planned();
        legs[2] = legs[2].clone().with_geometry("\u{1}\u{2}");

        let result = RealtimeLegSession::start(
            legs,
            Arc::new(MockLegSource::new()),
            Arc::new(ManualClock::new(t(0))),
            &SessionConfig::default(),
        );

        assert!(matches!(
            result,
            Err(SessionError::Geometry(GeometryError::InvalidLegGeometry { index: 2, .. }))
        ));
    }
}
