//! Stepped parameter sequences
//!
//! A `ParameterSequence` yields one value per event step. What happens after
//! the last element is an explicit choice: `Loop` wraps back to the first
//! element, `Clamp` holds the last one. Looping is the default because a
//! repeating pattern is what a step sequence usually means musically.

use super::Value;
use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// Behavior once the cursor passes the last element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exhaustion {
    /// Wrap to index 0
    #[default]
    Loop,
    /// Keep returning the last element
    Clamp,
}

/// An ordered, restartable sequence of parameter values
#[derive(Debug, Clone)]
pub struct ParameterSequence {
    values: Vec<Value>,
    /// Index of the element `next()` returns
    position: usize,
    policy: Exhaustion,
    /// Full cycles to play before ending (`Loop` only)
    occurrences: Option<u32>,
    cycles: u32,
}

impl ParameterSequence {
    /// Create a looping sequence
    pub fn new<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Result<Self> {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Err(EngineError::config("parameter sequence must not be empty"));
        }
        Ok(Self {
            values,
            position: 0,
            policy: Exhaustion::Loop,
            occurrences: None,
            cycles: 0,
        })
    }

    /// Set the exhaustion policy (builder pattern)
    pub fn with_policy(mut self, policy: Exhaustion) -> Self {
        self.policy = policy;
        self
    }

    /// Stop after `count` full cycles (builder pattern)
    ///
    /// Ignored under `Clamp`, which never finishes a cycle.
    pub fn with_occurrences(mut self, count: u32) -> Self {
        self.occurrences = Some(count);
        self
    }

    /// Advance and return the current element
    ///
    /// Returns `None` only once a finite `occurrences` count is used up.
    pub fn next(&mut self) -> Option<Value> {
        if self.is_exhausted() {
            return None;
        }

        let value = self.values[self.position].clone();

        if self.position + 1 < self.values.len() {
            self.position += 1;
        } else if self.policy == Exhaustion::Loop {
            self.position = 0;
            self.cycles += 1;
        }

        Some(value)
    }

    /// The element `next()` would return, without advancing
    pub fn peek(&self) -> Option<&Value> {
        if self.is_exhausted() {
            None
        } else {
            Some(&self.values[self.position])
        }
    }

    /// Rewind to the first element
    pub fn reset(&mut self) {
        self.position = 0;
        self.cycles = 0;
    }

    /// Check whether a finite sequence has played all its cycles
    pub fn is_exhausted(&self) -> bool {
        match (self.policy, self.occurrences) {
            (Exhaustion::Loop, Some(limit)) => self.cycles >= limit,
            _ => false,
        }
    }

    /// Current cursor position
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of elements in one cycle
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn policy(&self) -> Exhaustion {
        self.policy
    }

    /// All elements, in order
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}
