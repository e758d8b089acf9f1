//! Event schedule
//!
//! Merges bound parameters into a stream of timed [`EventRecord`]s, one per
//! `beat`. Every parameter advances on its own cycle, so sequences of
//! different lengths drift against each other (polyrhythmic cycling).

pub mod pitch;
mod record;

pub use record::{EnvelopeTiming, EventRecord, DEFAULT_AMP, RESOLVED_NAMES};
pub use record::{AMP, ATTACK, DB, DECAY, DEGREE, DUR, FREQ, MIDINOTE, RELEASE, SUSTAIN};

use crate::error::{EngineError, Result};
use crate::sequence::Param;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, error, info};

/// Default tempo: one beat per second
pub const DEFAULT_BPM: f64 = 60.0;

/// A lazy, unbounded stream of event records
#[derive(Debug, Clone)]
pub struct EventSchedule {
    params: BTreeMap<String, Param>,
    beat: f64,
    bpm: f64,
    /// Index of the next record
    index: u64,
    stopped: bool,
}

impl EventSchedule {
    pub fn builder() -> ScheduleBuilder {
        ScheduleBuilder::default()
    }

    /// Spacing between events in beats
    pub fn beat(&self) -> f64 {
        self.beat
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn seconds_per_beat(&self) -> f64 {
        60.0 / self.bpm
    }

    /// Halt the stream; already emitted records are unaffected
    pub fn stop(&mut self) {
        if !self.stopped {
            info!(events = self.index, "event schedule stopped");
        }
        self.stopped = true;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Rewind every parameter and restart from onset 0
    pub fn reset(&mut self) {
        for param in self.params.values_mut() {
            param.reset();
        }
        self.index = 0;
        self.stopped = false;
    }

    /// Number of records emitted so far
    pub fn events_emitted(&self) -> u64 {
        self.index
    }

    /// Onset (in beats) of the record `next()` would emit
    pub fn next_onset(&self) -> Option<f64> {
        if self.stopped {
            None
        } else {
            Some(self.index as f64 * self.beat)
        }
    }

    /// Names bound by the user
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    /// Every name a record from this schedule carries
    pub fn provided_names(&self) -> BTreeSet<String> {
        self.params
            .keys()
            .cloned()
            .chain(RESOLVED_NAMES.iter().map(|s| s.to_string()))
            .collect()
    }
}

impl Iterator for EventSchedule {
    type Item = EventRecord;

    fn next(&mut self) -> Option<EventRecord> {
        if self.stopped {
            return None;
        }

        let mut values = BTreeMap::new();
        for (name, param) in self.params.iter_mut() {
            match param.next() {
                Some(value) => {
                    values.insert(name.clone(), value);
                }
                None => {
                    info!(param = %name, events = self.index, "sequence exhausted, ending schedule");
                    self.stopped = true;
                    return None;
                }
            }
        }

        let onset = self.index as f64 * self.beat;
        match EventRecord::resolve(self.index, onset, self.beat, self.seconds_per_beat(), values) {
            Ok(record) => {
                debug!(index = record.index(), onset, duration = record.duration(), "event");
                self.index += 1;
                Some(record)
            }
            Err(e) => {
                error!("dropping schedule after bad event: {}", e);
                self.stopped = true;
                None
            }
        }
    }
}

/// Builder for [`EventSchedule`]
#[derive(Debug, Clone)]
pub struct ScheduleBuilder {
    params: BTreeMap<String, Param>,
    beat: f64,
    bpm: f64,
}

impl Default for ScheduleBuilder {
    fn default() -> Self {
        Self {
            params: BTreeMap::new(),
            beat: 1.0,
            bpm: DEFAULT_BPM,
        }
    }
}

impl ScheduleBuilder {
    /// Spacing between events in beats
    pub fn beat(mut self, beat: f64) -> Self {
        self.beat = beat;
        self
    }

    /// Tempo used to turn beats into seconds
    pub fn bpm(mut self, bpm: f64) -> Self {
        self.bpm = bpm;
        self
    }

    /// Bind a parameter name (replaces an earlier binding)
    pub fn param(mut self, name: impl Into<String>, param: impl Into<Param>) -> Self {
        self.params.insert(name.into(), param.into());
        self
    }

    pub fn attack(self, seconds: f64) -> Self {
        self.param(ATTACK, seconds)
    }

    pub fn decay(self, seconds: f64) -> Self {
        self.param(DECAY, seconds)
    }

    pub fn sustain(self, level: f64) -> Self {
        self.param(SUSTAIN, level)
    }

    pub fn release(self, seconds: f64) -> Self {
        self.param(RELEASE, seconds)
    }

    pub fn db(self, db: impl Into<Param>) -> Self {
        self.param(DB, db)
    }

    /// Validate and build the schedule
    pub fn build(self) -> Result<EventSchedule> {
        if !self.beat.is_finite() || self.beat <= 0.0 {
            return Err(EngineError::config(format!("beat must be positive, got {}", self.beat)));
        }
        if !self.bpm.is_finite() || self.bpm <= 0.0 {
            return Err(EngineError::config(format!("bpm must be positive, got {}", self.bpm)));
        }
        if self.params.is_empty() {
            return Err(EngineError::config("event schedule has no bound parameters"));
        }

        for (name, param) in &self.params {
            if name.is_empty() {
                return Err(EngineError::config("parameter names must not be empty"));
            }
            for value in param.candidates() {
                record::check_reserved(name, value)?;
            }
        }

        Ok(EventSchedule {
            params: self.params,
            beat: self.beat,
            bpm: self.bpm,
            index: 0,
            stopped: false,
        })
    }
}
