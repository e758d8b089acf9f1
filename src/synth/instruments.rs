//! Built-in instruments
//!
//! Two small blueprints so the engine can be heard and tested without
//! external DSP code.

use super::{Filter, Oscillator, Waveform};
use crate::error::Result;
use crate::schedule::FREQ;
use crate::voice::{Blueprint, SignalNode, VoiceParameters};

/// Detune ratio of the second oscillator in each unison pair
pub const UNISON_DETUNE: f64 = 1.003;

/// Sums oscillators, normalized by their count
struct OscillatorBank {
    oscillators: Vec<Oscillator>,
    gain: f64,
}

impl OscillatorBank {
    fn new(oscillators: Vec<Oscillator>) -> Self {
        let gain = 1.0 / oscillators.len().max(1) as f64;
        Self { oscillators, gain }
    }

    fn next_sample(&mut self) -> f64 {
        self.oscillators.iter_mut().map(Oscillator::generate).sum::<f64>() * self.gain
    }
}

/// Detuned pulse pairs through a Butterworth low-pass
///
/// Reads `freq` (one unison pair per entry), `duty` (pulse width 0..1) and
/// `cutoff` (Hz).
#[derive(Debug, Clone, Copy, Default)]
pub struct PulseLowpass;

impl PulseLowpass {
    pub const NAME: &'static str = "pulse_lowpass";
}

struct PulseLowpassNode {
    bank: OscillatorBank,
    filter: Filter,
}

impl SignalNode for PulseLowpassNode {
    fn render(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            // pulses swing between -0.5 and 0.5
            *sample = (self.bank.next_sample() * 0.5) as f32;
        }
        self.filter.process_block(out);
    }
}

impl Blueprint for PulseLowpass {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn required(&self) -> &[&'static str] {
        &[FREQ, "duty", "cutoff"]
    }

    fn construct(&self, params: &VoiceParameters, sample_rate: f64) -> Result<Box<dyn SignalNode>> {
        let freqs = params.numbers(FREQ)?;
        let duty = params.number("duty")?;
        let cutoff = params.number("cutoff")?;

        let oscillators = freqs
            .iter()
            .flat_map(|&f| [f, f * UNISON_DETUNE])
            .map(|f| Oscillator::new(Waveform::Pulse, f, sample_rate).with_pulse_width(duty))
            .collect();

        Ok(Box::new(PulseLowpassNode {
            bank: OscillatorBank::new(oscillators),
            filter: Filter::butterworth_lowpass(cutoff, sample_rate),
        }))
    }
}

/// One sine per `freq` entry
#[derive(Debug, Clone, Copy, Default)]
pub struct SineTone;

impl SineTone {
    pub const NAME: &'static str = "sine";
}

struct SineNode {
    bank: OscillatorBank,
}

impl SignalNode for SineNode {
    fn render(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample = self.bank.next_sample() as f32;
        }
    }
}

impl Blueprint for SineTone {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn required(&self) -> &[&'static str] {
        &[FREQ]
    }

    fn construct(&self, params: &VoiceParameters, sample_rate: f64) -> Result<Box<dyn SignalNode>> {
        let oscillators = params
            .numbers(FREQ)?
            .iter()
            .map(|&f| Oscillator::new(Waveform::Sine, f, sample_rate))
            .collect();

        Ok(Box::new(SineNode {
            bank: OscillatorBank::new(oscillators),
        }))
    }
}
