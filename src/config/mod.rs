//! Configuration loading and validation

mod schema;

pub use schema::*;

use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

/// Load configuration from a YAML file, or JSON when the extension says so
pub fn load_config(path: &Path) -> Result<PolyvoxConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {:?}", path))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let config: PolyvoxConfig = if is_json {
        serde_json::from_str(&contents).with_context(|| format!("invalid JSON in {:?}", path))?
    } else {
        serde_yaml::from_str(&contents).with_context(|| format!("invalid YAML in {:?}", path))?
    };

    config.validate()?;
    debug!(path = ?path, params = config.events.params.len(), "configuration loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(suffix: &str, contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_minimal_config() {
        let yaml = r#"
events:
  instrument: sine
  freq: 440
"#;
        let file = write_temp(".yaml", yaml);
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.audio.sample_rate, 44100);
        assert_eq!(config.events.instrument, "sine");
    }

    #[test]
    fn test_load_json_config() {
        let json = r#"{
  "audio": { "sample_rate": 48000 },
  "events": { "instrument": "sine", "beat": 0.25, "midinote": { "seq": [60, 64, 67] } }
}"#;
        let file = write_temp(".json", json);
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.audio.sample_rate, 48000);
        assert_eq!(config.events.beat, 0.25);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let file = write_temp(".yaml", "audio:\n  sample_rate: 100\nevents:\n  instrument: sine\n  freq: 1\n");
        assert!(load_config(file.path()).is_err());

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"events: [").unwrap();
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_non_finite_parameter_rejected() {
        let yaml = r#"
events:
  instrument: pulse_lowpass
  degree: 5.00
  duty: 0.5
  cutoff: .nan
"#;
        let file = write_temp(".yaml", yaml);
        let err = load_config(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("cutoff"), "{:#}", err);
    }

    #[test]
    fn test_example_config_builds_engine() {
        let file = write_temp(".yaml", include_str!("../../polyvox.example.yaml"));
        let config = load_config(file.path()).unwrap();

        let mut engine = Engine::from_config(&config).unwrap();
        let mut block = vec![0.0f32; config.audio.block_size];
        for _ in 0..200 {
            engine.render_block(&mut block);
        }
        assert!(engine.stats().spawned > 0);
        assert_eq!(engine.stats().failed, 0);
    }

    #[test]
    fn test_missing_instrument_parameter() {
        let yaml = r#"
events:
  instrument: pulse_lowpass
  degree: 5.00
  duty: 0.5
"#;
        let file = write_temp(".yaml", yaml);
        let config = load_config(file.path()).unwrap();
        assert!(Engine::from_config(&config).is_err());
    }
}
