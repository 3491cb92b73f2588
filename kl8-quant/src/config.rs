use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::convergence::ConvergenceConfig;
use crate::analysis::modulo::DEFAULT_MODULUS;
use crate::generator::GeneratorConfig;

/// Paramètres ajustables du pipeline. Les seuils des caractéristiques restent fixes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantConfig {
    pub generator: GeneratorConfig,
    pub convergence: ConvergenceConfig,
    pub modulus: u8,
    /// Attente simulée par source de données, en millisecondes.
    pub provider_delay_ms: u64,
}

impl Default for QuantConfig {
    fn default() -> Self {
        Self {
            generator: GeneratorConfig::default(),
            convergence: ConvergenceConfig::default(),
            modulus: DEFAULT_MODULUS,
            provider_delay_ms: 200,
        }
    }
}

impl QuantConfig {
    pub fn provider_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.provider_delay_ms)
    }
}

pub fn save_config(config: &QuantConfig, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)
        .with_context(|| format!("Impossible d'écrire {}", path.display()))?;
    Ok(())
}

pub fn load_config(path: &Path) -> Result<QuantConfig> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    let config: QuantConfig = serde_json::from_str(&json)
        .with_context(|| format!("Configuration invalide : {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kl8.json");
        let mut config = QuantConfig::default();
        config.modulus = 7;
        config.generator.years_back = 2;
        save_config(&config, &path).unwrap();
        assert_eq!(load_config(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{ "provider_delay_ms": 0 }"#).unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.provider_delay_ms, 0);
        assert_eq!(config.modulus, DEFAULT_MODULUS);
        assert_eq!(config.generator, GeneratorConfig::default());
    }

    #[test]
    fn test_nested_partial_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested.json");
        std::fs::write(&path, r#"{ "generator": { "years_back": 2 }, "convergence": { "steps": 10 } }"#)
            .unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(
            config.generator,
            GeneratorConfig { years_back: 2, ..GeneratorConfig::default() }
        );
        assert_eq!(
            config.convergence,
            ConvergenceConfig { steps: 10, ..ConvergenceConfig::default() }
        );
        assert_eq!(config.provider_delay_ms, 200);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(&dir.path().join("absent.json")).is_err());
    }
}
