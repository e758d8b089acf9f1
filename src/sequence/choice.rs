//! Random parameter choice

use super::Value;
use crate::error::{EngineError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Picks a uniformly random element on every step
///
/// The upcoming value is drawn one step ahead so `peek()` can report it.
#[derive(Debug, Clone)]
pub struct ParameterChoice {
    values: Vec<Value>,
    rng: StdRng,
    seed: Option<u64>,
    upcoming: usize,
}

impl ParameterChoice {
    /// Create a choice seeded from the OS
    pub fn new<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Result<Self> {
        Self::build(values, None)
    }

    /// Create a reproducible choice
    pub fn seeded<V: Into<Value>>(values: impl IntoIterator<Item = V>, seed: u64) -> Result<Self> {
        Self::build(values, Some(seed))
    }

    fn build<V: Into<Value>>(values: impl IntoIterator<Item = V>, seed: Option<u64>) -> Result<Self> {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Err(EngineError::config("parameter choice must not be empty"));
        }
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let upcoming = rng.gen_range(0..values.len());
        Ok(Self { values, rng, seed, upcoming })
    }

    /// Return the drawn value and draw the next one
    pub fn next(&mut self) -> Option<Value> {
        let value = self.values[self.upcoming].clone();
        self.upcoming = self.rng.gen_range(0..self.values.len());
        Some(value)
    }

    pub fn peek(&self) -> Option<&Value> {
        Some(&self.values[self.upcoming])
    }

    /// Restart the random stream (reproducible only when seeded)
    pub fn reset(&mut self) {
        if let Some(seed) = self.seed {
            self.rng = StdRng::seed_from_u64(seed);
            self.upcoming = self.rng.gen_range(0..self.values.len());
        }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}
