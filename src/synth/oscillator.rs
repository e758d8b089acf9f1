//! Phase-accumulator oscillator

use std::f64::consts::PI;

/// Waveform types
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Waveform {
    Sine,
    /// Rectangular wave, high while the phase is below the pulse width
    Pulse,
}

/// A basic oscillator that generates waveforms
#[derive(Debug, Clone)]
pub struct Oscillator {
    waveform: Waveform,
    phase: f64,
    frequency: f64,
    sample_rate: f64,
    pulse_width: f64,
}

impl Oscillator {
    /// Create a new oscillator
    pub fn new(waveform: Waveform, frequency: f64, sample_rate: f64) -> Self {
        Self {
            waveform,
            phase: 0.0,
            frequency,
            sample_rate,
            pulse_width: 0.5,
        }
    }

    /// Set the high fraction of a `Pulse` cycle (builder pattern)
    pub fn with_pulse_width(mut self, width: f64) -> Self {
        self.pulse_width = width.clamp(0.0, 1.0);
        self
    }

    /// Get the current frequency
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn pulse_width(&self) -> f64 {
        self.pulse_width
    }

    /// Current phase in 0..1
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Generate the next sample
    pub fn generate(&mut self) -> f64 {
        let sample = match self.waveform {
            Waveform::Sine => (self.phase * 2.0 * PI).sin(),
            Waveform::Pulse => {
                if self.phase < self.pulse_width {
                    1.0
                } else {
                    -1.0
                }
            }
        };

        self.phase += self.frequency / self.sample_rate;
        self.phase -= self.phase.floor();

        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sine_oscillator() {
        let mut osc = Oscillator::new(Waveform::Sine, 440.0, 44100.0);

        // First sample should be 0 (sin(0))
        let sample = osc.generate();
        assert!((sample - 0.0).abs() < 0.001);
    }

    #[test]
    fn test_pulse_width() {
        let mut osc = Oscillator::new(Waveform::Pulse, 1.0, 4.0).with_pulse_width(0.25);

        // 4 samples per cycle, high for the first quarter only
        assert_eq!(osc.generate(), 1.0); // phase 0.0
        assert_eq!(osc.generate(), -1.0); // phase 0.25
        assert_eq!(osc.generate(), -1.0); // phase 0.5
        assert_eq!(osc.generate(), -1.0); // phase 0.75
        assert_eq!(osc.generate(), 1.0); // wrapped
    }

    #[test]
    fn test_pulse_width_clamped() {
        let osc = Oscillator::new(Waveform::Pulse, 1.0, 4.0).with_pulse_width(3.0);
        assert_eq!(osc.pulse_width(), 1.0);
    }

    #[test]
    fn test_sine_range() {
        let mut osc = Oscillator::new(Waveform::Sine, 3.0, 100.0);
        for _ in 0..1000 {
            let s = osc.generate();
            assert!((-1.0..=1.0).contains(&s));
        }
    }

    #[test]
    fn test_phase_wraps_above_nyquist() {
        let mut osc = Oscillator::new(Waveform::Pulse, 30_000.0, 44100.0);
        for _ in 0..100 {
            osc.generate();
            assert!((0.0..1.0).contains(&osc.phase()));
        }
        assert_eq!(osc.frequency(), 30_000.0);
    }
}
