//! Time-driven ADSR envelope
//!
//! Unlike a gated envelope, every stage length is known when the voice is
//! built: attack, decay and release come from the event, and the sustain
//! hold fills whatever is left of the note duration. The envelope reaching
//! `Done` is what ends a voice's life.

use crate::schedule::EnvelopeTiming;

/// Envelope stage, which is also the voice lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceStage {
    Attack,
    Decay,
    Sustain,
    Release,
    Done,
}

/// ADSR envelope with sample-counted stages
#[derive(Debug, Clone)]
pub struct Envelope {
    // Stage lengths in samples
    attack: u64,
    decay: u64,
    hold: u64,
    release: u64,

    sustain: f64, // Level (0.0-1.0)

    // State
    stage: VoiceStage,
    level: f64,
    time_in_stage: u64,
    release_start_level: f64,
}

impl Envelope {
    /// Build an envelope lasting `duration` seconds in total
    ///
    /// If `duration` is shorter than attack + decay + release the sustain
    /// hold is empty; the fixed stages are never shortened.
    pub fn new(timing: EnvelopeTiming, duration: f64, sample_rate: f64) -> Self {
        let samples = |seconds: f64| (seconds.max(0.0) * sample_rate).round() as u64;
        let hold = duration - timing.fixed_stages();

        let mut env = Self {
            attack: samples(timing.attack),
            decay: samples(timing.decay),
            hold: samples(hold),
            release: samples(timing.release),
            sustain: timing.sustain.clamp(0.0, 1.0),
            stage: VoiceStage::Attack,
            level: 0.0,
            time_in_stage: 0,
            release_start_level: 0.0,
        };
        env.skip_empty_stages();
        env
    }

    pub fn stage(&self) -> VoiceStage {
        self.stage
    }

    /// Level of the last generated sample
    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn is_done(&self) -> bool {
        self.stage == VoiceStage::Done
    }

    /// Samples left until `Done`
    pub fn remaining(&self) -> u64 {
        let left_in_stage = self.stage_len().saturating_sub(self.time_in_stage);
        match self.stage {
            VoiceStage::Attack => left_in_stage + self.decay + self.hold + self.release,
            VoiceStage::Decay => left_in_stage + self.hold + self.release,
            VoiceStage::Sustain => left_in_stage + self.release,
            VoiceStage::Release => left_in_stage,
            VoiceStage::Done => 0,
        }
    }

    /// Jump to the release stage from the current level
    pub fn release(&mut self) {
        if matches!(
            self.stage,
            VoiceStage::Attack | VoiceStage::Decay | VoiceStage::Sustain
        ) {
            self.release_start_level = self.level;
            self.enter(VoiceStage::Release);
            self.skip_empty_stages();
        }
    }

    /// Generate the next envelope sample
    pub fn next_level(&mut self) -> f32 {
        let len = self.stage_len();
        let progress = (self.time_in_stage + 1) as f64 / len.max(1) as f64;

        self.level = match self.stage {
            VoiceStage::Attack => progress,
            VoiceStage::Decay => 1.0 - (1.0 - self.sustain) * progress,
            VoiceStage::Sustain => self.sustain,
            VoiceStage::Release => self.release_start_level * (1.0 - progress),
            VoiceStage::Done => return 0.0,
        };

        // entering the next stage may reset `level`; this sample keeps its own
        let level = self.level;
        self.time_in_stage += 1;
        if self.time_in_stage >= len {
            self.advance();
        }

        level as f32
    }

    fn stage_len(&self) -> u64 {
        match self.stage {
            VoiceStage::Attack => self.attack,
            VoiceStage::Decay => self.decay,
            VoiceStage::Sustain => self.hold,
            VoiceStage::Release => self.release,
            VoiceStage::Done => 0,
        }
    }

    fn enter(&mut self, stage: VoiceStage) {
        self.stage = stage;
        self.time_in_stage = 0;
    }

    fn advance(&mut self) {
        self.step_stage();
        self.skip_empty_stages();
    }

    /// Step over zero-length stages
    fn skip_empty_stages(&mut self) {
        while self.stage != VoiceStage::Done && self.stage_len() == 0 {
            self.step_stage();
        }
    }

    fn step_stage(&mut self) {
        match self.stage {
            VoiceStage::Attack => {
                self.level = 1.0;
                self.enter(VoiceStage::Decay);
            }
            VoiceStage::Decay => {
                self.level = self.sustain;
                self.enter(VoiceStage::Sustain);
            }
            VoiceStage::Sustain => {
                self.release_start_level = self.level;
                self.enter(VoiceStage::Release);
            }
            VoiceStage::Release => {
                self.level = 0.0;
                self.enter(VoiceStage::Done);
            }
            VoiceStage::Done => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(attack: f64, decay: f64, sustain: f64, release: f64) -> EnvelopeTiming {
        EnvelopeTiming {
            attack,
            decay,
            sustain,
            release,
        }
    }

    fn run_to_done(env: &mut Envelope) -> Vec<f32> {
        let mut out = Vec::new();
        while !env.is_done() {
            out.push(env.next_level());
            assert!(out.len() < 10_000_000, "envelope never finished");
        }
        out
    }

    #[test]
    fn test_stage_order_and_length() {
        // 10 attack + 10 decay + 20 sustain + 10 release samples at 1 kHz
        let mut env = Envelope::new(timing(0.01, 0.01, 0.5, 0.01), 0.05, 1000.0);
        assert_eq!(env.stage(), VoiceStage::Attack);
        assert_eq!(env.remaining(), 50);

        let mut stages = Vec::new();
        while !env.is_done() {
            if stages.last() != Some(&env.stage()) {
                stages.push(env.stage());
            }
            env.next_level();
        }
        assert_eq!(
            stages,
            vec![
                VoiceStage::Attack,
                VoiceStage::Decay,
                VoiceStage::Sustain,
                VoiceStage::Release
            ]
        );
    }

    #[test]
    fn test_levels() {
        let mut env = Envelope::new(timing(0.01, 0.01, 0.5, 0.01), 0.05, 1000.0);
        let levels = run_to_done(&mut env);
        assert_eq!(levels.len(), 50);

        // peak at the end of attack, sustain level in the hold, silence at the end
        assert!((levels[9] - 1.0).abs() < 1e-6);
        assert!((levels[19] - 0.5).abs() < 1e-6);
        assert!((levels[30] - 0.5).abs() < 1e-6);
        assert!(levels[49].abs() < 1e-6);
        assert!(levels.iter().all(|l| (0.0..=1.0).contains(l)));
    }

    #[test]
    fn test_attack_peak_without_decay() {
        // 4 attack + 4 sustain + 4 release samples at 1 kHz
        let mut env = Envelope::new(timing(0.004, 0.0, 0.5, 0.004), 0.012, 1000.0);
        let levels = run_to_done(&mut env);
        assert_eq!(levels.len(), 12);

        let expected = [0.25, 0.5, 0.75, 1.0, 0.5, 0.5, 0.5, 0.5, 0.375, 0.25, 0.125, 0.0];
        for (i, (got, want)) in levels.iter().zip(expected).enumerate() {
            assert!((got - want).abs() < 1e-6, "sample {}: {} != {}", i, got, want);
        }
    }

    #[test]
    fn test_last_sustain_sample_without_release() {
        let mut env = Envelope::new(timing(0.0, 0.0, 0.6, 0.0), 0.005, 1000.0);
        let levels = run_to_done(&mut env);
        assert_eq!(levels.len(), 5);
        assert!(levels.iter().all(|l| (l - 0.6).abs() < 1e-6));
        assert_eq!(env.level(), 0.0);
    }

    #[test]
    fn test_short_duration_keeps_fixed_stages() {
        let mut env = Envelope::new(timing(0.01, 0.01, 0.5, 0.01), 0.001, 1000.0);
        assert_eq!(run_to_done(&mut env).len(), 30);
    }

    #[test]
    fn test_zero_length_stages_skipped() {
        let env = Envelope::new(timing(0.0, 0.0, 0.8, 0.01), 0.01, 1000.0);
        assert_eq!(env.stage(), VoiceStage::Release);
        assert!((env.level() - 0.8).abs() < 1e-9);

        let env = Envelope::new(timing(0.0, 0.0, 0.5, 0.0), 0.0, 1000.0);
        assert!(env.is_done());
    }

    #[test]
    fn test_early_release() {
        let mut env = Envelope::new(timing(0.01, 0.01, 0.5, 0.01), 10.0, 1000.0);
        for _ in 0..5 {
            env.next_level();
        }
        assert_eq!(env.stage(), VoiceStage::Attack);
        let level = env.level();

        env.release();
        assert_eq!(env.stage(), VoiceStage::Release);
        assert_eq!(env.remaining(), 10);

        let tail = run_to_done(&mut env);
        assert_eq!(tail.len(), 10);
        assert!(tail[0] < level as f32);

        // no-op once done
        env.release();
        assert!(env.is_done());
        assert_eq!(env.next_level(), 0.0);
    }
}
