//! Voices: one live signal graph per event
//!
//! A voice owns its node, its parameter snapshot and its envelope. Its life
//! ends when the envelope reaches `Done`; the pool then removes it.

mod blueprint;
mod envelope;
mod factory;
mod params;

pub use blueprint::{Blueprint, ConstantNode, FnBlueprint, SignalNode};
pub use envelope::{Envelope, VoiceStage};
pub use factory::VoiceFactory;
pub use params::VoiceParameters;

use crate::MAX_BLOCK_SIZE;

/// Unique voice identifier (per factory)
pub type VoiceId = u64;

/// A live instance of an instrument
pub struct Voice {
    id: VoiceId,
    params: VoiceParameters,
    envelope: Envelope,
    amplitude: f32,
    node: Box<dyn SignalNode>,
    scratch: Box<[f32]>,
    frames_rendered: u64,
}

impl Voice {
    pub fn new(
        id: VoiceId,
        params: VoiceParameters,
        envelope: Envelope,
        amplitude: f32,
        node: Box<dyn SignalNode>,
    ) -> Self {
        Self {
            id,
            params,
            envelope,
            amplitude,
            node,
            scratch: vec![0.0; MAX_BLOCK_SIZE].into_boxed_slice(),
            frames_rendered: 0,
        }
    }

    pub fn id(&self) -> VoiceId {
        self.id
    }

    /// The parameters this voice was built with
    pub fn params(&self) -> &VoiceParameters {
        &self.params
    }

    pub fn stage(&self) -> VoiceStage {
        self.envelope.stage()
    }

    pub fn is_done(&self) -> bool {
        self.envelope.is_done()
    }

    /// Samples until the envelope finishes
    pub fn remaining(&self) -> u64 {
        self.envelope.remaining()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Move straight to the release stage
    pub fn release(&mut self) {
        self.envelope.release();
    }

    /// Render one block and add it into `out`
    ///
    /// Real-time safe. A voice that is already `Done` leaves `out` untouched.
    pub fn process(&mut self, out: &mut [f32]) -> VoiceStage {
        for block in out.chunks_mut(MAX_BLOCK_SIZE) {
            if self.envelope.is_done() {
                break;
            }

            let scratch = &mut self.scratch[..block.len()];
            self.node.render(scratch);

            for (o, s) in block.iter_mut().zip(scratch.iter()) {
                *o += s * self.envelope.next_level() * self.amplitude;
            }
            self.frames_rendered += block.len() as u64;
        }

        self.envelope.stage()
    }
}

impl std::fmt::Debug for Voice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Voice")
            .field("id", &self.id)
            .field("instrument", &self.params.instrument())
            .field("stage", &self.envelope.stage())
            .field("amplitude", &self.amplitude)
            .finish()
    }
}
