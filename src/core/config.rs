use crate::kmer::MAX_KMER_LENGTH;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub features: FeatureConfig,
    pub scales: ScaleConfig,
    pub performance: PerformanceConfig,
    pub models: ModelConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// k-mer lengths counted for every sequence
    pub kmer_lengths: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleConfig {
    /// Sequence length breakpoints, one trained model per breakpoint
    pub breakpoints: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Worker threads per classification call (0 = all logical CPUs)
    pub threads: usize,
    /// Maximum number of sequences whose features are held at once
    pub batch_size: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory holding scale_<L>.json model files
    pub directory: Option<String>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            kmer_lengths: vec![3, 4, 5, 6, 7],
        }
    }
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            breakpoints: vec![1000, 10000, 100000, 500000],
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            threads: 8,
            batch_size: crate::core::scheduler::DEFAULT_BATCH_SIZE,
        }
    }
}

impl Config {
    /// Reject settings no classifier can be built from.
    pub fn validate(&self) -> Result<(), crate::PlasClassError> {
        let ks = &self.features.kmer_lengths;
        if ks.is_empty() {
            return Err(crate::PlasClassError::Config(
                "features.kmer_lengths must not be empty".to_string(),
            ));
        }
        if let Some(k) = ks.iter().find(|&&k| k == 0 || k > MAX_KMER_LENGTH) {
            return Err(crate::PlasClassError::Config(format!(
                "features.kmer_lengths: {} is outside 1..={}",
                k, MAX_KMER_LENGTH
            )));
        }
        if self.scales.breakpoints.is_empty() {
            return Err(crate::PlasClassError::Config(
                "scales.breakpoints must not be empty".to_string(),
            ));
        }
        if self.scales.breakpoints.contains(&0) {
            return Err(crate::PlasClassError::Config(
                "scales.breakpoints must be positive".to_string(),
            ));
        }
        if self.performance.batch_size == 0 {
            return Err(crate::PlasClassError::Config(
                "performance.batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn default_config() -> Config {
    Config::default()
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, crate::PlasClassError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)
        .map_err(|e| crate::PlasClassError::Config(format!("Failed to parse config: {}", e)))?;
    config.validate()?;
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(path: P, config: &Config) -> Result<(), crate::PlasClassError> {
    let contents = toml::to_string_pretty(config)
        .map_err(|e| crate::PlasClassError::Config(format!("Failed to serialize config: {}", e)))?;
    std::fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = default_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.features.kmer_lengths, vec![3, 4, 5, 6, 7]);
        assert_eq!(config.scales.breakpoints, vec![1000, 10000, 100000, 500000]);
        assert_eq!(config.performance.batch_size, 100_000);
        assert!(config.models.directory.is_none());
    }

    #[test]
    fn test_validate_rejects() {
        let mut config = default_config();
        config.features.kmer_lengths = vec![3, 13];
        assert!(config.validate().is_err());

        let mut config = default_config();
        config.scales.breakpoints.clear();
        assert!(config.validate().is_err());

        let mut config = default_config();
        config.performance.batch_size = 0;
        assert!(config.validate().is_err());
    }
}
