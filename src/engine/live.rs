//! Live scheduling against a running audio device
//!
//! The scheduler runs on a tokio runtime, sleeps until each onset, builds the
//! voice and sends it to the output callback through a [`PoolHandle`].
//! A [`Shutdown`] counter turns Ctrl-C presses into a graceful drain (first
//! press) or an immediate release of every voice (second press).

use super::PoolHandle;
use crate::error::Result;
use crate::schedule::EventSchedule;
use crate::voice::VoiceFactory;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

/// How often the scheduler wakes to collect retired voices and check for
/// shutdown while waiting for the next onset
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Shared shutdown request counter
#[derive(Debug, Clone, Default)]
pub struct Shutdown(Arc<AtomicU8>);

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Escalate one step: none → drain → stop all
    pub fn request(&self) {
        let _ = self
            .0
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| Some(n.saturating_add(1).min(2)));
    }

    /// Stop scheduling and let live voices ring out
    pub fn drain_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst) >= 1
    }

    /// Release every live voice
    pub fn stop_all_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst) >= 2
    }
}

/// Totals reported when a live run ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LiveStats {
    pub events: u64,
    pub spawned: u64,
    pub dropped: u64,
    pub failed: u64,
}

/// Scheduler half of a live session
pub struct LiveScheduler {
    schedule: EventSchedule,
    factory: VoiceFactory,
    instrument: String,
    handle: PoolHandle,
    stats: LiveStats,
}

impl LiveScheduler {
    pub fn new(
        schedule: EventSchedule,
        factory: VoiceFactory,
        instrument: impl Into<String>,
        handle: PoolHandle,
    ) -> Result<Self> {
        let instrument = instrument.into();
        factory.check(&instrument, &schedule.provided_names())?;
        Ok(Self {
            schedule,
            factory,
            instrument,
            handle,
            stats: LiveStats::default(),
        })
    }

    /// Voices sent to the callback that have not come back yet
    fn in_flight(&self) -> u64 {
        self.stats
            .spawned
            .saturating_sub(self.handle.retired() + self.handle.dropped())
    }

    /// Schedule events until the schedule ends, `limit` elapses or
    /// `shutdown` is requested, then wait for the voices to finish
    pub async fn run(mut self, shutdown: Shutdown, limit: Option<Duration>) -> Result<LiveStats> {
        let start = Instant::now();
        let seconds_per_beat = self.schedule.seconds_per_beat();
        let mut released = false;

        info!(instrument = %self.instrument, "live scheduling started");

        loop {
            self.handle.collect();

            if shutdown.drain_requested() && !self.schedule.is_stopped() {
                info!("draining: no new events, live voices ring out");
                self.schedule.stop();
            }
            if shutdown.stop_all_requested() && !released {
                self.schedule.stop();
                match self.handle.stop_all() {
                    Ok(()) => {
                        info!("stopping all voices");
                        released = true;
                    }
                    // command ring is full: try again on the next pass
                    Err(e) => warn!("{}, retrying stop", e),
                }
            }
            if let Some(limit) = limit {
                if start.elapsed() >= limit && !self.schedule.is_stopped() {
                    self.schedule.stop();
                }
            }

            if self.handle.is_disconnected() {
                warn!("audio stream closed, ending live run");
                break;
            }
            if self.schedule.is_stopped() && self.in_flight() == 0 {
                break;
            }

            let now = Instant::now();
            let deadline = self
                .schedule
                .next_onset()
                .map(|onset| start + Duration::from_secs_f64(onset * seconds_per_beat));

            match deadline {
                Some(due) if due <= now => self.spawn_next(),
                Some(due) => sleep_until(due.min(now + POLL_INTERVAL)).await,
                None => sleep_until(now + POLL_INTERVAL).await,
            }
        }

        self.stats.dropped = self.handle.dropped();
        info!(
            events = self.stats.events,
            spawned = self.stats.spawned,
            dropped = self.stats.dropped,
            failed = self.stats.failed,
            "live scheduling finished"
        );
        Ok(self.stats)
    }

    fn spawn_next(&mut self) {
        let Some(record) = self.schedule.next() else {
            return;
        };
        self.stats.events += 1;

        let voice = match self.factory.create(&self.instrument, &record) {
            Ok(voice) => voice,
            Err(e) => {
                error!(event = record.index(), "failed to build voice: {}", e);
                self.stats.failed += 1;
                return;
            }
        };

        match self.handle.spawn(voice) {
            Ok(id) => {
                debug!(voice = id, event = record.index(), "voice sent");
                self.stats.spawned += 1;
            }
            Err(e) => {
                warn!(event = record.index(), "{}, dropping voice", e);
                self.stats.failed += 1;
            }
        }
    }
}
