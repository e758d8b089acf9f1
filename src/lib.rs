//! polyvox - event-driven polyphonic voice engine
//!
//! Named parameter sequences are merged into a stream of timed events. Each
//! event builds one independent voice from an instrument blueprint; voices
//! overlap freely in a bounded pool and retire when their envelope ends.

pub mod config;
pub mod engine;
pub mod error;
pub mod schedule;
pub mod sequence;
pub mod synth;
pub mod voice;

/// Largest block a voice renders in one pass; longer blocks are chunked
pub const MAX_BLOCK_SIZE: usize = 2048;

pub use config::PolyvoxConfig;
pub use engine::{Engine, VoicePool};
pub use error::{EngineError, Result};
pub use schedule::{EventRecord, EventSchedule};
pub use sequence::{Exhaustion, Param, ParameterChoice, ParameterSequence, Value};
pub use voice::{Blueprint, Voice, VoiceFactory, VoiceStage};
