//! Instrument blueprints
//!
//! A blueprint is the "instrument design" layer: it declares which parameter
//! names it reads and knows how to build a fresh signal node from a
//! [`VoiceParameters`] snapshot.

use super::VoiceParameters;
use crate::error::Result;

/// A block-rendering DSP graph owned by one voice
pub trait SignalNode: Send {
    /// Render one block, overwriting `out`
    ///
    /// Called from the audio thread: must not allocate or block.
    fn render(&mut self, out: &mut [f32]);
}

/// Template for building a voice's signal graph
pub trait Blueprint: Send + Sync {
    /// Type identifier used to look the blueprint up
    fn name(&self) -> &str;

    /// Parameter names `construct` dereferences
    fn required(&self) -> &[&'static str];

    /// Build a node for one event
    fn construct(&self, params: &VoiceParameters, sample_rate: f64) -> Result<Box<dyn SignalNode>>;
}

/// A blueprint made from a closure
pub struct FnBlueprint<F> {
    name: String,
    required: Vec<&'static str>,
    build: F,
}

impl<F> FnBlueprint<F>
where
    F: Fn(&VoiceParameters, f64) -> Result<Box<dyn SignalNode>> + Send + Sync,
{
    pub fn new(name: impl Into<String>, required: &[&'static str], build: F) -> Self {
        Self {
            name: name.into(),
            required: required.to_vec(),
            build,
        }
    }
}

impl<F> Blueprint for FnBlueprint<F>
where
    F: Fn(&VoiceParameters, f64) -> Result<Box<dyn SignalNode>> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn required(&self) -> &[&'static str] {
        &self.required
    }

    fn construct(&self, params: &VoiceParameters, sample_rate: f64) -> Result<Box<dyn SignalNode>> {
        (self.build)(params, sample_rate)
    }
}

/// Constant-value node, handy for tests and as a DC source
#[derive(Debug, Clone, Copy)]
pub struct ConstantNode(pub f32);

impl SignalNode for ConstantNode {
    fn render(&mut self, out: &mut [f32]) {
        out.fill(self.0);
    }
}
