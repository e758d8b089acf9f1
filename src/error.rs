//! Error types for the voice engine

use thiserror::Error;

/// Errors raised while configuring schedules or building voices
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Malformed or empty schedule setup
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A blueprint dereferenced a name the event does not carry
    #[error("missing parameter `{name}` required by instrument `{instrument}`")]
    MissingParameter { instrument: String, name: String },

    /// A parameter exists but holds the wrong kind of value
    #[error("parameter `{name}` must be {expected}")]
    ParameterType { name: String, expected: &'static str },

    /// No blueprint registered under this name
    #[error("unknown instrument `{0}`")]
    UnknownInstrument(String),

    /// The pool is full; the voice was dropped
    #[error("voice pool full ({max_voices} live voices), dropped voice {voice_id}")]
    PoolCapacityExceeded { max_voices: usize, voice_id: u64 },

    /// The render thread is not draining its command queue
    #[error("{0} queue full")]
    QueueFull(&'static str),
}

impl EngineError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
