use prio_core::TempKeyGenerator;
use prio_core::ids::{DEFAULT_MAX_HINT_LEN, DEFAULT_TEMP_PREFIX};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

pub const ENV_PREFIX: &str = "PRIO";
pub const DEFAULT_CONFIG_FILE: &str = "prio";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Leading segment of temporary keys.
    pub temp_key_prefix: String,
    pub max_hint_len: usize,
    /// Drop pending operations a refetch already reflects.
    pub prune_on_refetch: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            temp_key_prefix: DEFAULT_TEMP_PREFIX.to_string(),
            max_hint_len: DEFAULT_MAX_HINT_LEN,
            prune_on_refetch: true,
        }
    }
}

impl EngineConfig {
    /// Defaults, overlaid by an optional `prio.{toml,json,yaml}` in the working
    /// directory, overlaid by `PRIO_*` environment variables.
    pub fn load() -> Result<Self, EngineError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    pub fn load_from(file: &str) -> Result<Self, EngineError> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&EngineConfig::default())?)
            .add_source(config::File::with_name(file).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .try_parsing(true),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn temp_key_generator(&self) -> TempKeyGenerator {
        TempKeyGenerator::new(self.temp_key_prefix.clone(), self.max_hint_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent");
        let loaded = EngineConfig::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(loaded, EngineConfig::default());
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("prio.toml"),
            "temp_key_prefix = \"draft\"\nprune_on_refetch = false\n",
        )
        .unwrap();

        let stem = dir.path().join("prio");
        let loaded = EngineConfig::load_from(stem.to_str().unwrap()).unwrap();
        assert_eq!(loaded.temp_key_prefix, "draft");
        assert!(!loaded.prune_on_refetch);
        assert_eq!(loaded.max_hint_len, DEFAULT_MAX_HINT_LEN);
    }

    #[test]
    fn generator_uses_configured_prefix() {
        let cfg = EngineConfig {
            temp_key_prefix: "draft".into(),
            ..EngineConfig::default()
        };
        let key = cfg.temp_key_generator().next_key("Plan").unwrap();
        assert!(key.as_str().starts_with("draft-Plan-"));
    }
}
