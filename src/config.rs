//! Sampler configuration.
//!
//! Read from the JSON file named by `NVSAMPLE_CONFIG`; defaults apply when
//! the variable is unset.

use crate::error::SamplerError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "NVSAMPLE_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SamplerConfig {
    /// Read throttle reasons and append the four throttle fields
    #[serde(default = "default_true")]
    pub throttle_reasons: bool,
}

fn default_true() -> bool {
    true
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            throttle_reasons: true,
        }
    }
}

impl SamplerConfig {
    pub fn from_env() -> Result<Self, SamplerError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn load(path: &Path) -> Result<Self, SamplerError> {
        let config_err = |reason: String| SamplerError::Config {
            path: PathBuf::from(path),
            reason,
        };
        let content = std::fs::read_to_string(path).map_err(|e| config_err(e.to_string()))?;
        Self::parse(&content).map_err(|e| config_err(e.to_string()))
    }

    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn empty_object_uses_defaults() {
        let config = SamplerConfig::parse("{}").unwrap();
        assert_eq!(config, SamplerConfig::default());
        assert!(config.throttle_reasons);
    }

    #[test]
    fn throttle_reasons_can_be_disabled() {
        let config = SamplerConfig::parse(r#"{ "throttle_reasons": false }"#).unwrap();
        assert!(!config.throttle_reasons);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(SamplerConfig::parse(r#"{ "device_index": 1 }"#).is_err());
    }

    #[test]
    fn load_reads_file() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("nvsample.json");
        fs::write(&file, r#"{"throttle_reasons": false}"#).unwrap();

        let config = SamplerConfig::load(&file).unwrap();
        assert!(!config.throttle_reasons);
    }

    #[test]
    fn load_reports_path_on_error() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("missing.json");

        let err = SamplerConfig::load(&file).unwrap_err();
        assert!(err.to_string().contains("missing.json"));

        fs::write(&file, "not json").unwrap();
        let err = SamplerConfig::load(&file).unwrap_err();
        assert!(matches!(err, SamplerError::Config { .. }));
    }
}
