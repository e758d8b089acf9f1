//! Event records and reserved-name resolution

use super::pitch::{db_to_amp, degree_to_midi, midi_to_hz, DEFAULT_MIDI_NOTE};
use crate::error::{EngineError, Result};
use crate::sequence::Value;
use serde::Serialize;
use std::collections::BTreeMap;

pub const FREQ: &str = "freq";
pub const MIDINOTE: &str = "midinote";
pub const DEGREE: &str = "degree";
pub const AMP: &str = "amp";
pub const DB: &str = "db";
pub const DUR: &str = "dur";
pub const ATTACK: &str = "attack";
pub const DECAY: &str = "decay";
pub const SUSTAIN: &str = "sustain";
pub const RELEASE: &str = "release";

/// Names every record carries after resolution
pub const RESOLVED_NAMES: [&str; 7] = [FREQ, AMP, DUR, ATTACK, DECAY, SUSTAIN, RELEASE];

/// Amplitude when neither `amp` nor `db` is bound
pub const DEFAULT_AMP: f64 = 0.7;

/// Envelope stage timing for one event
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnvelopeTiming {
    /// Seconds
    pub attack: f64,
    /// Seconds
    pub decay: f64,
    /// Level (0.0-1.0)
    pub sustain: f64,
    /// Seconds
    pub release: f64,
}

impl EnvelopeTiming {
    /// Combined length of the fixed-time stages
    pub fn fixed_stages(&self) -> f64 {
        self.attack + self.decay + self.release
    }
}

impl Default for EnvelopeTiming {
    fn default() -> Self {
        Self {
            attack: 0.005,
            decay: 0.05,
            sustain: 0.7,
            release: 0.05,
        }
    }
}

/// Kind of value a reserved name accepts
enum Expect {
    /// Non-negative finite number
    Time,
    /// Number in 0..=1
    Level,
    /// Any finite number
    Scalar,
    /// Number or list of numbers
    Pitch,
}

fn expectation(name: &str) -> Option<Expect> {
    match name {
        DUR | ATTACK | DECAY | RELEASE => Some(Expect::Time),
        SUSTAIN => Some(Expect::Level),
        AMP | DB => Some(Expect::Scalar),
        FREQ | MIDINOTE | DEGREE => Some(Expect::Pitch),
        _ => None,
    }
}

/// Check a value bound to `name` against what the name accepts
///
/// Names outside the reserved set accept text and any finite number or list.
pub(crate) fn check_reserved(name: &str, value: &Value) -> Result<()> {
    let type_error = |expected| EngineError::ParameterType {
        name: name.to_string(),
        expected,
    };

    match expectation(name) {
        None => match value.as_numbers() {
            Some(entries) if entries.iter().any(|n| !n.is_finite()) => {
                Err(type_error("a finite number"))
            }
            _ => Ok(()),
        },
        Some(Expect::Time) => match value {
            Value::Number(n) if n.is_finite() && *n >= 0.0 => Ok(()),
            _ => Err(type_error("a non-negative number")),
        },
        Some(Expect::Level) => match value {
            Value::Number(n) if (0.0..=1.0).contains(n) => Ok(()),
            _ => Err(type_error("a number between 0 and 1")),
        },
        Some(Expect::Scalar) => match value {
            Value::Number(n) if n.is_finite() => Ok(()),
            _ => Err(type_error("a number")),
        },
        Some(Expect::Pitch) => match value.as_numbers() {
            Some(entries) if !entries.is_empty() && entries.iter().all(|n| n.is_finite()) => Ok(()),
            _ => Err(type_error("a number or a list of numbers")),
        },
    }
}

/// One scheduled event: immutable once emitted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    index: u64,
    onset_time: f64,
    duration: f64,
    amplitude: f64,
    envelope: EnvelopeTiming,
    params: BTreeMap<String, Value>,
}

impl EventRecord {
    /// Resolve reserved names in a raw parameter bag
    ///
    /// `default_dur` is the note length in beats when `dur` is unbound;
    /// `seconds_per_beat` converts it to seconds.
    pub fn resolve(
        index: u64,
        onset_time: f64,
        default_dur: f64,
        seconds_per_beat: f64,
        mut params: BTreeMap<String, Value>,
    ) -> Result<Self> {
        for (name, value) in &params {
            check_reserved(name, value)?;
        }

        let number = |params: &BTreeMap<String, Value>, name: &str, default: f64| {
            params.get(name).and_then(Value::as_number).unwrap_or(default)
        };

        let freq = if let Some(freq) = params.get(FREQ) {
            freq.clone()
        } else if let Some(note) = params.get(MIDINOTE) {
            note.map_numbers(midi_to_hz)
        } else if let Some(degree) = params.get(DEGREE) {
            degree.map_numbers(|d| midi_to_hz(degree_to_midi(d)))
        } else {
            Value::Number(midi_to_hz(DEFAULT_MIDI_NOTE))
        };

        let amplitude = match (params.get(AMP), params.get(DB)) {
            (Some(amp), _) => amp.as_number().unwrap_or(DEFAULT_AMP),
            (None, Some(db)) => db.as_number().map(db_to_amp).unwrap_or(DEFAULT_AMP),
            (None, None) => DEFAULT_AMP,
        };

        let defaults = EnvelopeTiming::default();
        let envelope = EnvelopeTiming {
            attack: number(&params, ATTACK, defaults.attack),
            decay: number(&params, DECAY, defaults.decay),
            sustain: number(&params, SUSTAIN, defaults.sustain),
            release: number(&params, RELEASE, defaults.release),
        };
        let dur = number(&params, DUR, default_dur);
        let duration = (dur * seconds_per_beat).max(envelope.fixed_stages());

        params.insert(FREQ.to_string(), freq);
        params.insert(AMP.to_string(), Value::Number(amplitude));
        params.insert(DUR.to_string(), Value::Number(dur));
        params.insert(ATTACK.to_string(), Value::Number(envelope.attack));
        params.insert(DECAY.to_string(), Value::Number(envelope.decay));
        params.insert(SUSTAIN.to_string(), Value::Number(envelope.sustain));
        params.insert(RELEASE.to_string(), Value::Number(envelope.release));

        Ok(Self {
            index,
            onset_time,
            duration,
            amplitude,
            envelope,
            params,
        })
    }

    /// Position in the schedule (0-based)
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Onset in beats from the start of the schedule
    pub fn onset_time(&self) -> f64 {
        self.onset_time
    }

    /// Whole voice lifetime in seconds, release included
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Linear gain
    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    pub fn envelope(&self) -> EnvelopeTiming {
        self.envelope
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    pub fn params(&self) -> &BTreeMap<String, Value> {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bag(entries: &[(&str, Value)]) -> BTreeMap<String, Value> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_defaults_when_unbound() {
        let record = EventRecord::resolve(0, 0.0, 1.0, 1.0, bag(&[("duty", 0.5.into())])).unwrap();

        let freq = record.get(FREQ).unwrap().as_number().unwrap();
        assert!((freq - 261.6256).abs() < 1e-3);
        assert_eq!(record.amplitude(), DEFAULT_AMP);
        assert_eq!(record.envelope(), EnvelopeTiming::default());
        assert_eq!(record.duration(), 1.0);
        assert_eq!(record.get("duty"), Some(&Value::Number(0.5)));
        for name in RESOLVED_NAMES {
            assert!(record.get(name).is_some(), "missing {}", name);
        }
    }

    #[test]
    fn test_degree_and_db() {
        let record = EventRecord::resolve(
            0,
            0.0,
            0.5,
            1.0,
            bag(&[("degree", 5.04.into()), ("db", (-6.0).into())]),
        )
        .unwrap();

        let freq = record.get(FREQ).unwrap().as_number().unwrap();
        assert!((freq - midi_to_hz(64.0)).abs() < 1e-9);
        assert!((record.amplitude() - 0.501187).abs() < 1e-5);
        // raw names stay visible
        assert_eq!(record.get(DEGREE), Some(&Value::Number(5.04)));
        assert_eq!(record.get(DB), Some(&Value::Number(-6.0)));
    }

    #[test]
    fn test_freq_beats_midinote() {
        let record = EventRecord::resolve(
            0,
            0.0,
            1.0,
            1.0,
            bag(&[("freq", 100.0.into()), ("midinote", 69.0.into())]),
        )
        .unwrap();
        assert_eq!(record.get(FREQ), Some(&Value::Number(100.0)));
    }

    #[test]
    fn test_chord_midinote() {
        let record =
            EventRecord::resolve(0, 0.0, 1.0, 1.0, bag(&[("midinote", vec![69.0, 81.0].into())]))
                .unwrap();
        let freqs = record.get(FREQ).unwrap().as_numbers().unwrap().to_vec();
        assert!((freqs[0] - 440.0).abs() < 1e-9);
        assert!((freqs[1] - 880.0).abs() < 1e-9);
    }

    #[test]
    fn test_duration_covers_envelope() {
        // dur of 0.01 beat is shorter than attack + decay + release
        let record = EventRecord::resolve(
            0,
            0.0,
            0.01,
            1.0,
            bag(&[("attack", 0.1.into()), ("decay", 0.1.into()), ("release", 0.2.into())]),
        )
        .unwrap();
        assert!((record.duration() - 0.4).abs() < 1e-12);

        // tempo scales dur
        let record = EventRecord::resolve(0, 0.0, 1.0, 0.5, bag(&[("dur", 2.0.into())])).unwrap();
        assert!((record.duration() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_reserved_type_errors() {
        let err = EventRecord::resolve(0, 0.0, 1.0, 1.0, bag(&[("db", vec![-6.0, -9.0].into())]))
            .unwrap_err();
        assert!(matches!(err, EngineError::ParameterType { .. }));

        let err = EventRecord::resolve(0, 0.0, 1.0, 1.0, bag(&[("sustain", 1.5.into())])).unwrap_err();
        assert!(matches!(err, EngineError::ParameterType { .. }));

        let err = EventRecord::resolve(0, 0.0, 1.0, 1.0, bag(&[("freq", "high".into())])).unwrap_err();
        assert!(matches!(err, EngineError::ParameterType { .. }));
    }

    #[test]
    fn test_user_params_must_be_finite() {
        for value in [Value::Number(f64::NAN), Value::List(vec![1.0, f64::INFINITY])] {
            let err = EventRecord::resolve(0, 0.0, 1.0, 1.0, bag(&[("cutoff", value)])).unwrap_err();
            assert_eq!(
                err,
                EngineError::ParameterType {
                    name: "cutoff".to_string(),
                    expected: "a finite number",
                }
            );
        }

        let ok = EventRecord::resolve(0, 0.0, 1.0, 1.0, bag(&[("mode", "bright".into())]));
        assert!(ok.is_ok());
    }
}
