//! Synthesis building blocks and built-in instruments
//!
//! Contains oscillators, filters and the blueprints that ship with the crate.

mod filter;
mod instruments;
mod oscillator;

pub use filter::{Filter, BUTTERWORTH_Q};
pub use instruments::{PulseLowpass, SineTone, UNISON_DETUNE};
pub use oscillator::{Oscillator, Waveform};

use crate::voice::Blueprint;
use std::sync::Arc;

/// Every instrument registered by `VoiceFactory::with_builtins`
pub fn builtin_blueprints() -> Vec<Arc<dyn Blueprint>> {
    vec![Arc::new(PulseLowpass), Arc::new(SineTone)]
}
