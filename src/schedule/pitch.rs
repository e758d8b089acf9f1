//! Pitch and level conversions for reserved parameters

/// Reference tuning (A4)
pub const A4_HZ: f64 = 440.0;

/// MIDI note used when an event names no pitch at all (middle C)
pub const DEFAULT_MIDI_NOTE: f64 = 60.0;

/// Convert a (possibly fractional) MIDI note number to Hz
pub fn midi_to_hz(note: f64) -> f64 {
    A4_HZ * 2.0_f64.powf((note - 69.0) / 12.0)
}

/// Convert `octave.semitone` degree notation to a MIDI note number
///
/// The integer part is the octave, the two decimals the semitone:
/// `5.04` is octave 5, semitone 4, i.e. MIDI 64.
pub fn degree_to_midi(degree: f64) -> f64 {
    let octave = degree.trunc();
    let semitone = ((degree - octave) * 100.0).round();
    octave * 12.0 + semitone
}

/// Convert decibels to linear amplitude
pub fn db_to_amp(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midi_to_hz() {
        assert!((midi_to_hz(69.0) - 440.0).abs() < 1e-9);
        assert!((midi_to_hz(81.0) - 880.0).abs() < 1e-9);
        assert!((midi_to_hz(60.0) - 261.6256).abs() < 1e-3);
    }

    #[test]
    fn test_degree_to_midi() {
        assert_eq!(degree_to_midi(5.00), 60.0);
        assert_eq!(degree_to_midi(5.04), 64.0);
        assert_eq!(degree_to_midi(5.07), 67.0);
        assert_eq!(degree_to_midi(6.00), 72.0);
    }

    #[test]
    fn test_db_to_amp() {
        assert!((db_to_amp(0.0) - 1.0).abs() < 1e-12);
        assert!((db_to_amp(-6.0) - 0.501187).abs() < 1e-5);
        assert!((db_to_amp(-20.0) - 0.1).abs() < 1e-12);
    }
}
