//! Per-voice parameter snapshot

use crate::error::{EngineError, Result};
use crate::schedule::EventRecord;
use crate::sequence::Value;
use std::collections::BTreeMap;

/// The resolved parameters of one voice
///
/// Built once from an [`EventRecord`] and never changed afterwards. Lookups
/// through [`require`](Self::require) and friends fail with
/// `MissingParameter`, naming the instrument being built.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceParameters {
    instrument: String,
    values: BTreeMap<String, Value>,
}

impl VoiceParameters {
    pub fn new(instrument: impl Into<String>, values: BTreeMap<String, Value>) -> Self {
        Self {
            instrument: instrument.into(),
            values,
        }
    }

    /// Snapshot every field of a record
    pub fn from_record(instrument: impl Into<String>, record: &EventRecord) -> Self {
        Self::new(instrument, record.params().clone())
    }

    /// Instrument these parameters were resolved for
    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Look up a name the instrument cannot do without
    pub fn require(&self, name: &str) -> Result<&Value> {
        self.values.get(name).ok_or_else(|| EngineError::MissingParameter {
            instrument: self.instrument.clone(),
            name: name.to_string(),
        })
    }

    /// A required scalar
    pub fn number(&self, name: &str) -> Result<f64> {
        self.require(name)?
            .as_number()
            .ok_or_else(|| EngineError::ParameterType {
                name: name.to_string(),
                expected: "a number",
            })
    }

    /// A required scalar or list; a scalar reads as one entry
    pub fn numbers(&self, name: &str) -> Result<&[f64]> {
        self.require(name)?
            .as_numbers()
            .ok_or_else(|| EngineError::ParameterType {
                name: name.to_string(),
                expected: "a number or a list of numbers",
            })
    }

    /// A required string
    pub fn text(&self, name: &str) -> Result<&str> {
        self.require(name)?
            .as_text()
            .ok_or_else(|| EngineError::ParameterType {
                name: name.to_string(),
                expected: "a string",
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_map(&self) -> &BTreeMap<String, Value> {
        &self.values
    }
}
