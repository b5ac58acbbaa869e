/// Multi-scale plasmid classifier

use super::config::Config;
use super::model::{ModelSet, ModelSource};
use super::scale::LengthScales;
use super::scheduler::ClassificationScheduler;
use crate::kmer::{CanonicalIndexTable, KmerProfiler};
use crate::PlasClassError;
use std::sync::Arc;

/// Either one sequence or an ordered collection of them.
#[derive(Debug, Clone, Copy)]
pub enum ClassificationRequest<'a> {
    Single(&'a [u8]),
    Batch(&'a [&'a [u8]]),
}

/// Mirrors the shape of the [`ClassificationRequest`] it answers.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassificationResponse {
    Single(f64),
    Batch(Vec<f64>),
}

/// Scores sequences with the model of their length scale.
///
/// The canonical k-mer table and every scale model are loaded once at
/// construction and shared read-only with all workers afterwards.
pub struct PlasmidClassifier {
    profiler: KmerProfiler,
    scales: LengthScales,
    models: ModelSet,
    threads: usize,
    batch_size: usize,
}

impl PlasmidClassifier {
    /// Build the index table and load a model for every configured scale.
    /// Fails if any scale has no usable model.
    pub fn new(config: &Config, source: &dyn ModelSource) -> Result<Self, PlasClassError> {
        config.validate()?;

        let table = Arc::new(CanonicalIndexTable::build(&config.features.kmer_lengths)?);
        let scales = LengthScales::new(&config.scales.breakpoints)?;
        tracing::debug!(
            "k-mer lengths {:?} give {} features",
            table.kmer_lengths(),
            table.dimension()
        );

        let models = ModelSet::load(&scales, source, table.dimension())?;

        Ok(Self {
            profiler: KmerProfiler::new(table),
            scales,
            models,
            threads: config.performance.threads,
            batch_size: config.performance.batch_size,
        })
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn profiler(&self) -> &KmerProfiler {
        &self.profiler
    }

    pub fn scales(&self) -> &LengthScales {
        &self.scales
    }

    pub fn feature_dimension(&self) -> usize {
        self.profiler.dimension()
    }

    pub fn classify(
        &self,
        request: ClassificationRequest<'_>,
    ) -> Result<ClassificationResponse, PlasClassError> {
        match request {
            ClassificationRequest::Single(sequence) => {
                self.classify_one(sequence).map(ClassificationResponse::Single)
            }
            ClassificationRequest::Batch(sequences) => {
                self.classify_batch(sequences).map(ClassificationResponse::Batch)
            }
        }
    }

    /// Plasmid probability of one sequence, computed on the calling thread.
    pub fn classify_one(&self, sequence: &[u8]) -> Result<f64, PlasClassError> {
        let index = self.scales.select_index(sequence.len());
        let model = self.models.get(index).ok_or(PlasClassError::MissingModel {
            scale: self.scales.as_slice()[index],
        })?;

        tracing::debug!("Counting k-mers for sequence of length {}", sequence.len());
        let mut features = self.profiler.count(sequence);
        Ok(model.score_in_place(&mut features))
    }

    /// Plasmid probabilities in input order.
    pub fn classify_batch<S>(&self, sequences: &[S]) -> Result<Vec<f64>, PlasClassError>
    where
        S: AsRef<[u8]> + Sync,
    {
        ClassificationScheduler::new(&self.profiler, &self.scales, &self.models)
            .with_threads(self.threads)
            .with_batch_size(self.batch_size)
            .run(sequences)
    }
}
