//! Audio engine for polyvox
//!
//! The [`Engine`] drives a schedule, a factory and a pool on one thread and
//! renders blocks with sample-accurate voice starts. For a live device the
//! same parts are split across threads: see [`handoff`] and [`live`].

pub mod handoff;
pub mod live;
mod player;
mod pool;
mod recorder;

pub use handoff::{pool_channels, PoolCommand, PoolHandle, PoolReport, RenderPool, DEFAULT_QUEUE_CAPACITY};
pub use player::{default_device_name, list_output_devices, Player};
pub use pool::{VoicePool, DEFAULT_MAX_VOICES};
pub use recorder::Recorder;

use crate::config::PolyvoxConfig;
use crate::error::{EngineError, Result};
use crate::schedule::{EventRecord, EventSchedule};
use crate::voice::{VoiceFactory, VoiceId};
use tracing::{error, info};

/// Counters kept while rendering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Records pulled from the schedule
    pub events: u64,
    /// Voices that made it into the pool
    pub spawned: u64,
    /// Voices rejected because the pool was full
    pub dropped: u64,
    /// Records the factory could not turn into a voice
    pub failed: u64,
}

/// Cooperative scheduler: schedule, factory and pool on one thread
pub struct Engine {
    schedule: EventSchedule,
    factory: VoiceFactory,
    instrument: String,
    pool: VoicePool,
    master_volume: f32,
    /// Frames rendered so far; the clock every onset is measured against
    frame: u64,
    stats: EngineStats,
}

impl Engine {
    /// Create an engine, checking up front that the schedule binds every
    /// parameter the instrument reads
    pub fn new(
        schedule: EventSchedule,
        factory: VoiceFactory,
        instrument: impl Into<String>,
        max_voices: usize,
    ) -> Result<Self> {
        let instrument = instrument.into();
        factory.check(&instrument, &schedule.provided_names())?;
        let sample_rate = factory.sample_rate();
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(EngineError::config("sample rate must be a positive number"));
        }

        info!(
            instrument = %instrument,
            max_voices,
            sample_rate = factory.sample_rate(),
            "engine ready"
        );

        Ok(Self {
            schedule,
            factory,
            instrument,
            pool: VoicePool::new(max_voices),
            master_volume: 1.0,
            frame: 0,
            stats: EngineStats::default(),
        })
    }

    /// Build an engine with the built-in instruments from a loaded config
    pub fn from_config(config: &PolyvoxConfig) -> Result<Self> {
        let schedule = config.events.build_schedule()?;
        let factory = VoiceFactory::with_builtins(config.audio.sample_rate as f64);
        let engine = Self::new(
            schedule,
            factory,
            config.events.instrument.clone(),
            config.events.max_voices,
        )?;
        Ok(engine.with_master_volume(config.audio.master_volume))
    }

    /// Set the output gain (builder pattern)
    pub fn with_master_volume(mut self, volume: f32) -> Self {
        self.master_volume = volume.clamp(0.0, 1.0);
        self
    }

    pub fn sample_rate(&self) -> f64 {
        self.factory.sample_rate()
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn schedule(&self) -> &EventSchedule {
        &self.schedule
    }

    pub fn factory(&self) -> &VoiceFactory {
        &self.factory
    }

    pub fn pool(&self) -> &VoicePool {
        &self.pool
    }

    pub fn live_voices(&self) -> usize {
        self.pool.len()
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frame
    }

    /// Seconds of audio rendered so far
    pub fn elapsed(&self) -> f64 {
        self.frame as f64 / self.sample_rate()
    }

    /// Frame at which an onset (in beats) starts
    pub fn onset_frame(&self, onset: f64) -> u64 {
        (onset * self.schedule.seconds_per_beat() * self.sample_rate()).round() as u64
    }

    /// Build a voice for `record` and add it to the pool now
    pub fn spawn(&mut self, record: &EventRecord) -> Result<VoiceId> {
        let voice = self.factory.create(&self.instrument, record).map_err(|e| {
            error!(event = record.index(), "failed to build voice: {}", e);
            self.stats.failed += 1;
            e
        })?;

        let id = self.pool.insert(voice).map_err(|e| {
            self.stats.dropped += 1;
            e
        })?;
        self.stats.spawned += 1;
        Ok(id)
    }

    /// Stop scheduling new events; live voices play out
    pub fn stop(&mut self) {
        self.schedule.stop();
    }

    /// Stop scheduling and release every live voice
    pub fn stop_all(&mut self) {
        self.schedule.stop();
        self.pool.stop_all();
    }

    /// No more events will come and every voice has finished
    pub fn is_finished(&self) -> bool {
        self.schedule.is_stopped() && self.pool.is_empty()
    }

    /// Render the next block into `out`
    ///
    /// The block is split at each event onset that falls inside it, so every
    /// voice starts on the exact frame its onset maps to.
    pub fn render_block(&mut self, out: &mut [f32]) {
        let block_start = self.frame;
        let block_end = block_start + out.len() as u64;
        let mut pos = 0;

        while pos < out.len() {
            self.spawn_due(block_start + pos as u64);

            // everything at or before `pos` was spawned, so the split is ahead
            let split = self
                .schedule
                .next_onset()
                .map(|onset| self.onset_frame(onset))
                .filter(|&frame| frame < block_end)
                .map_or(out.len(), |frame| (frame - block_start) as usize);

            self.pool.render_block(&mut out[pos..split]);
            pos = split;
        }

        if self.master_volume != 1.0 {
            for sample in out.iter_mut() {
                *sample *= self.master_volume;
            }
        }
        self.frame = block_end;
    }

    /// Spawn every event whose onset frame is at or before `now`
    fn spawn_due(&mut self, now: u64) {
        while let Some(onset) = self.schedule.next_onset() {
            if self.onset_frame(onset) > now {
                break;
            }
            let Some(record) = self.schedule.next() else {
                break;
            };
            self.stats.events += 1;
            // failures are logged and counted in `spawn`
            let _ = self.spawn(&record);
        }
    }
}
