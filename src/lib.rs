pub mod bio;
pub mod cli;
pub mod core;
pub mod kmer;
pub mod utils;

pub use crate::core::{
    classifier::{ClassificationRequest, ClassificationResponse, PlasmidClassifier},
    config::Config,
    model::{ModelDirectory, ModelSet, ModelSource, ScaleModel},
    scale::LengthScales,
};
pub use crate::kmer::{CanonicalIndexTable, KmerProfiler};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlasClassError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("No model loaded for length scale {scale}")]
    MissingModel { scale: u64 },

    #[error("Model for length scale {scale} has {found} {part} entries, expected {expected}")]
    ModelShape {
        scale: u64,
        part: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Worker error: {0}")]
    Worker(String),
}

impl From<serde_json::Error> for PlasClassError {
    fn from(err: serde_json::Error) -> Self {
        PlasClassError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PlasClassError>;
