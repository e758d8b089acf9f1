//! Configuration schema definitions

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::engine::DEFAULT_MAX_VOICES;
use crate::error::Result as EngineResult;
use crate::schedule::{EventSchedule, DEFAULT_BPM};
use crate::sequence::{Exhaustion, Param, ParameterChoice, ParameterSequence, Value};
use crate::MAX_BLOCK_SIZE;

/// Main configuration for polyvox
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolyvoxConfig {
    /// Audio output settings
    #[serde(default)]
    pub audio: AudioConfig,

    /// The event stream and the instrument that plays it
    pub events: EventsConfig,
}

impl PolyvoxConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate < 8000 || self.audio.sample_rate > 192000 {
            bail!("Sample rate must be between 8000 and 192000");
        }
        if self.audio.block_size < 16 || self.audio.block_size > MAX_BLOCK_SIZE {
            bail!("Block size must be between 16 and {}", MAX_BLOCK_SIZE);
        }
        if !(0.0..=1.0).contains(&self.audio.master_volume) {
            bail!("Master volume must be between 0.0 and 1.0");
        }

        let events = &self.events;
        if events.instrument.trim().is_empty() {
            bail!("Events need an instrument");
        }
        if events.max_voices == 0 {
            bail!("max_voices must be at least 1");
        }
        if events.params.is_empty() {
            bail!("Events bind no parameters");
        }

        // catches empty sequences, bad tempo and mistyped reserved names
        events.build_schedule()?;

        Ok(())
    }
}

/// Audio output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate in Hz (default: 44100)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Frames rendered per block when writing files (default: 256)
    #[serde(default = "default_block_size")]
    pub block_size: usize,

    /// Output gain 0.0-1.0 (default: 0.8)
    #[serde(default = "default_master_volume")]
    pub master_volume: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            block_size: default_block_size(),
            master_volume: default_master_volume(),
        }
    }
}

fn default_sample_rate() -> u32 { 44100 }
fn default_block_size() -> usize { 256 }
fn default_master_volume() -> f32 { 0.8 }

/// Event stream settings
///
/// Every key besides the four fixed ones binds a parameter name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Registered instrument that builds each voice
    pub instrument: String,

    /// Spacing between events in beats (default: 1.0)
    #[serde(default = "default_beat")]
    pub beat: f64,

    /// Tempo (default: 60, one beat per second)
    #[serde(default = "default_bpm")]
    pub bpm: f64,

    /// Cap on simultaneous voices (default: 32)
    #[serde(default = "default_max_voices")]
    pub max_voices: usize,

    /// Parameter bindings
    #[serde(flatten)]
    pub params: BTreeMap<String, ParamSpec>,
}

fn default_beat() -> f64 { 1.0 }
fn default_bpm() -> f64 { DEFAULT_BPM }
fn default_max_voices() -> usize { DEFAULT_MAX_VOICES }

impl EventsConfig {
    /// Build a fresh schedule from these settings
    pub fn build_schedule(&self) -> EngineResult<EventSchedule> {
        let mut builder = EventSchedule::builder().beat(self.beat).bpm(self.bpm);
        for (name, spec) in &self.params {
            builder = builder.param(name.clone(), spec.to_param()?);
        }
        builder.build()
    }
}

/// How a parameter is written in a config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamSpec {
    /// `{ seq: [...], policy: loop|clamp, occurrences: n }`
    Seq {
        seq: Vec<Value>,
        #[serde(default)]
        policy: Exhaustion,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        occurrences: Option<u32>,
    },
    /// `{ choice: [...], seed: n }`
    Choice {
        choice: Vec<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seed: Option<u64>,
    },
    /// A number, a string or a list of numbers
    Constant(Value),
}

impl ParamSpec {
    pub fn to_param(&self) -> EngineResult<Param> {
        Ok(match self {
            ParamSpec::Constant(value) => Param::Constant(value.clone()),
            ParamSpec::Seq { seq, policy, occurrences } => {
                let mut sequence = ParameterSequence::new(seq.iter().cloned())?.with_policy(*policy);
                if let Some(count) = occurrences {
                    sequence = sequence.with_occurrences(*count);
                }
                Param::Sequence(sequence)
            }
            ParamSpec::Choice { choice, seed } => Param::Choice(match seed {
                Some(seed) => ParameterChoice::seeded(choice.iter().cloned(), *seed)?,
                None => ParameterChoice::new(choice.iter().cloned())?,
            }),
        })
    }
}
