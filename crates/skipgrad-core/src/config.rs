//! Centralized configuration management with TOML support.
//!
//! The numeric kernels themselves take explicit buffers and dimensions; this
//! config layer is the caller-facing record of the shapes and constants a
//! training run commits to, with load/save and validation.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, SkipgradError};

/// Any prediction-target key at or above this value marks the remainder of
/// its row as exhausted (variable-depth hierarchical-softmax codes end
/// early; the tail slots carry this sentinel instead of a real key).
///
/// Callers may lower the threshold via [`BatchConfig::exhausted_key`]; the
/// kernels treat `key >= threshold` as "skip slot", nothing more.
pub const DEFAULT_EXHAUSTED_KEY: u32 = u32::MAX;

/// Embedding table shape configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Number of rows (vocabulary / key count) in the anchor table.
    pub vocab_size: usize,
    /// Embedding dimension, fixed for the lifetime of a table pair.
    pub dim: usize,
    /// Row count of the context/output-side table. Defaults to `vocab_size`.
    pub context_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            vocab_size: 50_000,
            dim: 300,
            context_size: 50_000,
        }
    }
}

impl EmbeddingConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.dim == 0 {
            return Err(SkipgradError::InvalidConfig("dim must be > 0".into()));
        }
        if self.vocab_size == 0 {
            return Err(SkipgradError::InvalidConfig(
                "vocab_size must be > 0".into(),
            ));
        }
        if self.context_size == 0 {
            return Err(SkipgradError::InvalidConfig(
                "context_size must be > 0".into(),
            ));
        }
        Ok(())
    }
}

/// Minibatch / prediction-target layout configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Minibatch size (rows of the prediction-target matrix).
    pub batch_size: usize,
    /// Slots per minibatch row: 1 positive + negatives, or the maximum
    /// hierarchical-softmax code depth.
    pub pn_size: usize,
    /// Row-exhaustion sentinel threshold; keys at or above it are skipped.
    pub exhausted_key: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 256,
            pn_size: 9,
            exhausted_key: DEFAULT_EXHAUSTED_KEY,
        }
    }
}

impl BatchConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(SkipgradError::InvalidConfig(
                "batch_size must be > 0".into(),
            ));
        }
        if self.pn_size == 0 {
            return Err(SkipgradError::InvalidConfig("pn_size must be > 0".into()));
        }
        Ok(())
    }
}

/// Adaptive-update hyperparameters.
///
/// The moment decay (0.98) and denominator smoothing (0.001) are fixed
/// constants of the update kernel; only the learning rate is a knob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateConfig {
    /// Learning rate applied per adaptive-update step.
    pub learn_rate: f32,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self { learn_rate: 2e-4 }
    }
}

impl UpdateConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if !(self.learn_rate > 0.0 && self.learn_rate.is_finite()) {
            return Err(SkipgradError::InvalidConfig(
                "learn_rate must be positive and finite".into(),
            ));
        }
        Ok(())
    }
}

/// Top-level configuration for a training run's numeric core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Embedding table shapes.
    pub embedding: EmbeddingConfig,
    /// Minibatch layout.
    pub batch: BatchConfig,
    /// Adaptive-update hyperparameters.
    pub update: UpdateConfig,
}

impl CoreConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.validate()?;
        let content = toml::to_string_pretty(self)
            .map_err(|e| SkipgradError::InvalidConfig(format!("serialize failed: {e}")))?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Validate all sub-configs.
    pub fn validate(&self) -> Result<()> {
        self.embedding.validate()?;
        self.batch.validate()?;
        self.update.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs_are_valid() {
        EmbeddingConfig::default().validate().unwrap();
        BatchConfig::default().validate().unwrap();
        UpdateConfig::default().validate().unwrap();
        CoreConfig::default().validate().unwrap();
    }

    #[test]
    fn test_zero_dim_rejected() {
        let cfg = EmbeddingConfig {
            dim: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_bad_learn_rate_rejected() {
        assert!(UpdateConfig { learn_rate: 0.0 }.validate().is_err());
        assert!(UpdateConfig {
            learn_rate: f32::NAN
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_config_roundtrip() {
        let mut cfg = CoreConfig::default();
        cfg.batch.exhausted_key = 1 << 30;
        let tmp = tempfile::NamedTempFile::new().unwrap();
        cfg.save(tmp.path()).unwrap();
        let loaded = CoreConfig::from_file(tmp.path()).unwrap();
        assert_eq!(cfg.embedding.dim, loaded.embedding.dim);
        assert_eq!(cfg.batch.exhausted_key, loaded.batch.exhausted_key);
        assert_eq!(cfg.update.learn_rate, loaded.update.learn_rate);
    }
}
