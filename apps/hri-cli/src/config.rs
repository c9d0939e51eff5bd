use anyhow::{bail, Context, Result};
use batch_eval::BatchOptions;
use confirm_composer::ComposerConfig;
use confirmation_gate::GatePolicy;
use intent_parser::InterpreterConfig;
use llm_backend::BackendConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HriConfig {
    pub backend: BackendConfig,
    /// Environment variable holding the backend's bearer token
    pub api_key_env: String,
    pub interpreter: InterpreterConfig,
    pub composer: ComposerConfig,
    pub gate: GatePolicy,
    pub batch: BatchOptions,
    /// YAML lexicon extension applied on top of the built-in vocabulary
    pub lexicon: Option<String>,
}

impl Default for HriConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            interpreter: InterpreterConfig::default(),
            composer: ComposerConfig::default(),
            gate: GatePolicy::default(),
            batch: BatchOptions::default(),
            lexicon: None,
        }
    }
}

impl HriConfig {
    /// Load the config, writing the defaults first if the file does not exist
    pub fn load(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::read(path)
        } else {
            let config = Self::default();
            config.save(path)?;
            tracing::info!("Wrote default config to {}", path);
            Ok(config)
        }
    }

    /// Load the config, or use the defaults without touching the disk
    pub fn read(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).with_context(|| format!("reading config {path}"))?;
        serde_json::from_str(&contents).with_context(|| format!("parsing config {path}"))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("writing config {path}"))?;
        Ok(())
    }

    /// Backend settings with the API key taken from the environment
    pub fn backend_config(&self) -> Result<BackendConfig> {
        let mut backend = self.backend.clone();
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => backend.api_key = Some(key),
            _ => bail!(
                "environment variable {} is not set; the http backend needs an API key",
                self.api_key_env
            ),
        }
        Ok(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hri.json");
        let path = path.to_str().unwrap();

        let config = HriConfig::load(path).unwrap();
        assert_eq!(config.gate.max_attempts, 3);
        assert!(Path::new(path).exists());

        let written = fs::read_to_string(path).unwrap();
        assert!(!written.contains("api_key\""));
    }

    #[test]
    fn read_leaves_a_missing_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hri.json");
        let path = path.to_str().unwrap();

        let config = HriConfig::read(path).unwrap();
        assert_eq!(config.batch.concurrency, 4);
        assert!(!Path::new(path).exists());
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hri.json");
        fs::write(&path, r#"{"gate": {"max_attempts": 5}, "api_key_env": "HRI_TEST_KEY"}"#)
            .unwrap();

        let config = HriConfig::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.gate.max_attempts, 5);
        assert_eq!(config.interpreter.temperature, 0.0);
        assert_eq!(config.backend.model, "gpt-3.5-turbo");
    }

    #[test]
    fn backend_config_requires_the_key_variable() {
        let config = HriConfig {
            api_key_env: "HRI_CLI_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..HriConfig::default()
        };
        assert!(config.backend_config().is_err());
    }
}
