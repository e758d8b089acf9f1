//! Biquad low-pass filter
//!
//! Coefficients are fixed at construction: a voice's cutoff never changes
//! once the voice exists.

use std::f64::consts::PI;

/// Butterworth Q
pub const BUTTERWORTH_Q: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// Biquad filter coefficients
#[derive(Debug, Clone, Copy)]
struct Coefficients {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

/// Biquad low-pass filter for audio processing
#[derive(Debug, Clone)]
pub struct Filter {
    cutoff: f64,
    coeffs: Coefficients,

    // Filter state (Direct Form II transposed)
    z1: f64,
    z2: f64,
}

impl Filter {
    /// Create a filter; cutoff is clamped to 20 Hz..0.45 * sample rate
    ///
    /// At very low sample rates the upper bound wins over the 20 Hz floor.
    pub fn new(cutoff: f64, q: f64, sample_rate: f64) -> Self {
        let max = (sample_rate * 0.45).max(f64::MIN_POSITIVE);
        let cutoff = cutoff.clamp(20.0f64.min(max), max);
        let q = q.clamp(0.1, 20.0);

        Self {
            cutoff,
            coeffs: Self::coefficients(cutoff, q, sample_rate),
            z1: 0.0,
            z2: 0.0,
        }
    }

    /// Second-order Butterworth low-pass
    pub fn butterworth_lowpass(cutoff: f64, sample_rate: f64) -> Self {
        Self::new(cutoff, BUTTERWORTH_Q, sample_rate)
    }

    /// Get cutoff frequency
    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    fn coefficients(cutoff: f64, q: f64, sample_rate: f64) -> Coefficients {
        let omega = 2.0 * PI * cutoff / sample_rate;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();
        let alpha = sin_omega / (2.0 * q);

        let b1 = 1.0 - cos_omega;
        let b0 = b1 / 2.0;
        let b2 = b1 / 2.0;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_omega;
        let a2 = 1.0 - alpha;

        // Normalize by a0
        Coefficients {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// Process a single sample through the filter
    pub fn process(&mut self, input: f64) -> f64 {
        let output = self.coeffs.b0 * input + self.z1;

        self.z1 = self.coeffs.b1 * input - self.coeffs.a1 * output + self.z2;
        self.z2 = self.coeffs.b2 * input - self.coeffs.a2 * output;

        output
    }

    /// Process a block in place
    pub fn process_block(&mut self, block: &mut [f32]) {
        for sample in block.iter_mut() {
            *sample = self.process(*sample as f64) as f32;
        }
    }
}
