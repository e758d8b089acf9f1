//! Voice factory: blueprint registry and voice construction

use super::{Blueprint, Envelope, Voice, VoiceId, VoiceParameters};
use crate::error::{EngineError, Result};
use crate::schedule::EventRecord;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Builds voices from event records
///
/// The factory never touches a pool: it hands back a finished [`Voice`] and
/// leaves placement to the caller.
pub struct VoiceFactory {
    blueprints: HashMap<String, Arc<dyn Blueprint>>,
    sample_rate: f64,
    next_id: AtomicU64,
}

impl VoiceFactory {
    /// Create an empty factory
    pub fn new(sample_rate: f64) -> Self {
        Self {
            blueprints: HashMap::new(),
            sample_rate,
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a factory with the built-in instruments registered
    pub fn with_builtins(sample_rate: f64) -> Self {
        let mut factory = Self::new(sample_rate);
        for blueprint in crate::synth::builtin_blueprints() {
            factory.register_arc(blueprint);
        }
        factory
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Register a blueprint under its name, replacing any previous one
    pub fn register(&mut self, blueprint: impl Blueprint + 'static) {
        self.register_arc(Arc::new(blueprint));
    }

    fn register_arc(&mut self, blueprint: Arc<dyn Blueprint>) {
        self.blueprints.insert(blueprint.name().to_string(), blueprint);
    }

    /// Registered instrument names, sorted
    pub fn instruments(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.blueprints.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn blueprint(&self, instrument: &str) -> Result<&dyn Blueprint> {
        self.blueprints
            .get(instrument)
            .map(|b| b.as_ref())
            .ok_or_else(|| EngineError::UnknownInstrument(instrument.to_string()))
    }

    /// Check up front that `provided` covers every name the instrument reads
    pub fn check(&self, instrument: &str, provided: &BTreeSet<String>) -> Result<()> {
        let blueprint = self.blueprint(instrument)?;
        match blueprint.required().iter().find(|name| !provided.contains(**name)) {
            Some(name) => Err(EngineError::MissingParameter {
                instrument: instrument.to_string(),
                name: name.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Build exactly one voice for `record`
    ///
    /// Fails with `MissingParameter` before any node is built if the record
    /// lacks a name the blueprint declares.
    pub fn create(&self, instrument: &str, record: &EventRecord) -> Result<Voice> {
        let blueprint = self.blueprint(instrument)?;
        let params = VoiceParameters::from_record(instrument, record);

        for name in blueprint.required() {
            params.require(name)?;
        }

        let node = blueprint.construct(&params, self.sample_rate)?;
        let envelope = Envelope::new(record.envelope(), record.duration(), self.sample_rate);
        let id: VoiceId = self.next_id.fetch_add(1, Ordering::Relaxed);

        Ok(Voice::new(id, params, envelope, record.amplitude() as f32, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::EventSchedule;
    use crate::sequence::ParameterSequence;
    use crate::voice::{ConstantNode, FnBlueprint, SignalNode, VoiceStage};

    fn dc_blueprint() -> impl Blueprint {
        FnBlueprint::new("dc", &["cutoff"], |params, _sr| {
            let cutoff = params.number("cutoff")?;
            Ok(Box::new(ConstantNode((cutoff / 10_000.0) as f32)) as Box<dyn SignalNode>)
        })
    }

    #[test]
    fn test_builtins_registered() {
        let factory = VoiceFactory::with_builtins(44100.0);
        assert_eq!(factory.instruments(), vec!["pulse_lowpass", "sine"]);
    }

    #[test]
    fn test_unknown_instrument() {
        let factory = VoiceFactory::new(44100.0);
        let record = EventSchedule::builder().param("x", 1.0).build().unwrap().next().unwrap();
        assert!(matches!(
            factory.create("nope", &record),
            Err(EngineError::UnknownInstrument(_))
        ));
    }

    #[test]
    fn test_missing_parameter_at_construction() {
        let mut factory = VoiceFactory::with_builtins(44100.0);
        factory.register(dc_blueprint());

        // degree and duty are bound, cutoff is not
        let mut schedule = EventSchedule::builder()
            .beat(0.5)
            .param("degree", ParameterSequence::new([5.00, 5.04]).unwrap())
            .param("duty", ParameterSequence::new([0.02, 0.1]).unwrap())
            .build()
            .unwrap();

        let err = factory.check("pulse_lowpass", &schedule.provided_names()).unwrap_err();
        assert_eq!(
            err,
            EngineError::MissingParameter {
                instrument: "pulse_lowpass".to_string(),
                name: "cutoff".to_string(),
            }
        );

        let record = schedule.next().unwrap();
        assert!(matches!(
            factory.create("dc", &record),
            Err(EngineError::MissingParameter { .. })
        ));
        assert!(matches!(
            factory.create("pulse_lowpass", &record),
            Err(EngineError::MissingParameter { .. })
        ));
    }

    #[test]
    fn test_parameters_round_trip() {
        let factory = VoiceFactory::with_builtins(44100.0);
        let record = EventSchedule::builder()
            .param("degree", 5.07)
            .param("duty", 0.25)
            .param("cutoff", 3000.0)
            .param("label", "lead")
            .build()
            .unwrap()
            .next()
            .unwrap();

        let voice = factory.create("pulse_lowpass", &record).unwrap();
        assert_eq!(voice.params().as_map(), record.params());
        assert_eq!(voice.params().instrument(), "pulse_lowpass");
        assert_eq!(voice.stage(), VoiceStage::Attack);
    }

    #[test]
    fn test_unique_ids() {
        let mut factory = VoiceFactory::new(44100.0);
        factory.register(dc_blueprint());
        let record = EventSchedule::builder().param("cutoff", 1.0).build().unwrap().next().unwrap();

        let a = factory.create("dc", &record).unwrap();
        let b = factory.create("dc", &record).unwrap();
        assert_ne!(a.id(), b.id());
    }
}
