//! Voice pool: the set of live voices
//!
//! Capacity is fixed at construction and preallocated, so inserting and
//! rendering never allocate. Voices leave the pool only through `render`,
//! after their final block has been mixed.

use crate::error::{EngineError, Result};
use crate::voice::{Voice, VoiceId};
use tracing::warn;

/// Default cap on simultaneous voices
pub const DEFAULT_MAX_VOICES: usize = 32;

/// Owns every live voice and mixes them into one bus
pub struct VoicePool {
    voices: Vec<Voice>,
    max_voices: usize,
    dropped: u64,
}

impl VoicePool {
    pub fn new(max_voices: usize) -> Self {
        Self {
            voices: Vec::with_capacity(max_voices),
            max_voices,
            dropped: 0,
        }
    }

    pub fn max_voices(&self) -> usize {
        self.max_voices
    }

    /// Number of live voices
    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.voices.len() >= self.max_voices
    }

    /// Voices rejected because the pool was full
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Add a voice, handing it back when the pool is full
    ///
    /// Real-time safe: never allocates and never logs.
    pub fn try_insert(&mut self, voice: Voice) -> std::result::Result<VoiceId, Voice> {
        if self.is_full() {
            self.dropped += 1;
            return Err(voice);
        }
        let id = voice.id();
        self.voices.push(voice);
        Ok(id)
    }

    /// Add a voice, dropping it with a warning when the pool is full
    pub fn insert(&mut self, voice: Voice) -> Result<VoiceId> {
        self.try_insert(voice).map_err(|voice| {
            warn!(
                voice = voice.id(),
                max_voices = self.max_voices,
                "voice pool full, dropping voice"
            );
            EngineError::PoolCapacityExceeded {
                max_voices: self.max_voices,
                voice_id: voice.id(),
            }
        })
    }

    pub fn get(&self, id: VoiceId) -> Option<&Voice> {
        self.voices.iter().find(|v| v.id() == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = VoiceId> + '_ {
        self.voices.iter().map(Voice::id)
    }

    /// Move every live voice to its release stage
    pub fn stop_all(&mut self) {
        for voice in &mut self.voices {
            voice.release();
        }
    }

    /// Mix one block of every live voice into `out`
    ///
    /// `out` is cleared first. Voices that finished during this block are
    /// removed afterwards and passed to `retire`, so the caller decides
    /// where they get dropped.
    pub fn render(&mut self, out: &mut [f32], mut retire: impl FnMut(Voice)) {
        out.fill(0.0);

        for voice in &mut self.voices {
            voice.process(out);
        }

        let mut i = 0;
        while i < self.voices.len() {
            if self.voices[i].is_done() {
                retire(self.voices.remove(i));
            } else {
                i += 1;
            }
        }
    }

    /// Render and drop finished voices in place
    pub fn render_block(&mut self, out: &mut [f32]) {
        self.render(out, drop);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::tests::dc_voice;
    use crate::voice::VoiceStage;

    #[test]
    fn test_capacity_exceeded() {
        let mut pool = VoicePool::new(1);
        assert!(pool.insert(dc_voice(1, 0.5, 1.0)).is_ok());

        let err = pool.insert(dc_voice(2, 0.5, 1.0)).unwrap_err();
        assert_eq!(err, EngineError::PoolCapacityExceeded { max_voices: 1, voice_id: 2 });
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.dropped(), 1);
        assert!(pool.get(1).is_some());
        assert!(pool.get(2).is_none());
    }

    #[test]
    fn test_try_insert_hands_voice_back() {
        let mut pool = VoicePool::new(0);
        let rejected = pool.try_insert(dc_voice(9, 0.5, 1.0)).unwrap_err();
        assert_eq!(rejected.id(), 9);
    }

    #[test]
    fn test_mix_is_sum() {
        let mut pool = VoicePool::new(4);
        pool.insert(dc_voice(1, 0.25, 1.0)).unwrap();
        pool.insert(dc_voice(2, 0.5, 1.0)).unwrap();

        let mut out = [9.0f32; 16];
        pool.render_block(&mut out);
        assert!(out.iter().all(|&s| (s - 0.75).abs() < 1e-6));
    }

    #[test]
    fn test_insertion_order_irrelevant() {
        let mut a = VoicePool::new(4);
        a.insert(dc_voice(1, 0.25, 0.01)).unwrap();
        a.insert(dc_voice(2, 0.5, 0.02)).unwrap();

        let mut b = VoicePool::new(4);
        b.insert(dc_voice(2, 0.5, 0.02)).unwrap();
        b.insert(dc_voice(1, 0.25, 0.01)).unwrap();

        let mut out_a = [0.0f32; 32];
        let mut out_b = [0.0f32; 32];
        a.render_block(&mut out_a);
        b.render_block(&mut out_b);
        assert_eq!(out_a, out_b);
    }

    #[test]
    fn test_finished_voices_retired_after_last_block() {
        let mut pool = VoicePool::new(4);
        pool.insert(dc_voice(1, 1.0, 0.01)).unwrap(); // 10 samples
        pool.insert(dc_voice(2, 1.0, 1.0)).unwrap();

        let mut retired = Vec::new();
        let mut out = [0.0f32; 16];
        pool.render(&mut out, |v| retired.push(v));

        // voice 1 contributed its full tail before removal
        assert!(out[..10].iter().all(|&s| (s - 2.0).abs() < 1e-6));
        assert!(out[10..].iter().all(|&s| (s - 1.0).abs() < 1e-6));

        assert_eq!(retired.len(), 1);
        assert_eq!(retired[0].id(), 1);
        assert_eq!(retired[0].stage(), VoiceStage::Done);
        assert_eq!(pool.ids().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_stop_all_releases() {
        let mut pool = VoicePool::new(4);
        pool.insert(dc_voice(1, 1.0, 10.0)).unwrap();
        pool.insert(dc_voice(2, 1.0, 10.0)).unwrap();

        pool.stop_all();
        let mut out = [0.0f32; 4];
        pool.render_block(&mut out);
        assert!(pool.is_empty());
    }
}
