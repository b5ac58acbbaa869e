/// Shared fixtures for the integration tests
///
/// Models here are synthetic: deterministic weights with no biological
/// meaning, sized to whatever feature dimension a configuration produces.
use plasclass::core::config::{default_config, Config};
use plasclass::core::model::{LinearClassifier, ScaleModel, Standardizer};
use plasclass::kmer::CanonicalIndexTable;
use std::collections::HashMap;

/// Default configuration with custom k-mer lengths and scales.
#[allow(dead_code)]
pub fn config_with(kmer_lengths: &[usize], breakpoints: &[u64]) -> Config {
    let mut config = default_config();
    config.features.kmer_lengths = kmer_lengths.to_vec();
    config.scales.breakpoints = breakpoints.to_vec();
    config.performance.threads = 2;
    config
}

/// Deterministic model for every scale in `config`.
#[allow(dead_code)]
pub fn synthetic_models(config: &Config) -> HashMap<u64, ScaleModel> {
    let dimension = CanonicalIndexTable::build(&config.features.kmer_lengths)
        .expect("valid k-mer lengths")
        .dimension();

    config
        .scales
        .breakpoints
        .iter()
        .map(|&scale| {
            let salt = (scale % 97) as usize;
            let mean = (0..dimension)
                .map(|i| ((i + salt) % 7) as f64 / 700.0)
                .collect();
            let spread = (0..dimension)
                .map(|i| 0.01 + ((i * 3 + salt) % 5) as f64 / 100.0)
                .collect();
            let weights = (0..dimension)
                .map(|i| (((i * 31 + salt) % 19) as f64 - 9.0) / 90.0)
                .collect();
            let bias = (salt % 11) as f64 / 10.0 - 0.5;
            (
                scale,
                ScaleModel::new(
                    Standardizer::new(mean, spread),
                    LinearClassifier::new(weights, bias),
                ),
            )
        })
        .collect()
}

/// Pseudo-random nucleotide string with roughly one `N` in `n_every` bases
/// (never if `n_every` is 0).
#[allow(dead_code)]
pub fn pseudo_random_sequence(length: usize, seed: u64, n_every: u64) -> Vec<u8> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..length)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let r = state >> 33;
            if n_every > 0 && r % n_every == 0 {
                b'N'
            } else {
                b"ACGT"[(r % 4) as usize]
            }
        })
        .collect()
}
