//! Batched, scale-partitioned classification.

use super::model::ModelSet;
use super::scale::LengthScales;
use crate::kmer::FeatureExtractor;
use crate::utils::parallel::build_worker_pool;
use crate::PlasClassError;
use rayon::prelude::*;
use rayon::ThreadPool;

/// Upper bound on sequences whose feature matrices are held at once.
pub const DEFAULT_BATCH_SIZE: usize = 100_000;

/// Splits input into batches, partitions each batch by length scale,
/// extracts features in parallel and scores each partition with its scale's
/// model. Results come back in input order.
///
/// A worker pool is built for every [`run`](Self::run) call and dropped when
/// it returns.
pub struct ClassificationScheduler<'a, E: FeatureExtractor + ?Sized> {
    extractor: &'a E,
    scales: &'a LengthScales,
    models: &'a ModelSet,
    threads: usize,
    batch_size: usize,
}

impl<'a, E: FeatureExtractor + ?Sized> ClassificationScheduler<'a, E> {
    pub fn new(extractor: &'a E, scales: &'a LengthScales, models: &'a ModelSet) -> Self {
        Self {
            extractor,
            scales,
            models,
            threads: 1,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Worker pool size, 0 for every logical CPU.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Plasmid probability for every sequence, `result[i]` for `sequences[i]`.
    ///
    /// Any failed extraction aborts the call; nothing partial is returned.
    pub fn run<S>(&self, sequences: &[S]) -> Result<Vec<f64>, PlasClassError>
    where
        S: AsRef<[u8]> + Sync,
    {
        self.check_models()?;
        if sequences.is_empty() {
            return Ok(Vec::new());
        }

        let pool = build_worker_pool(self.threads)?;
        tracing::info!(
            "{} sequences to classify in batches of {} on {} threads",
            sequences.len(),
            self.batch_size,
            pool.current_num_threads()
        );

        let mut results = Vec::with_capacity(sequences.len());
        for (number, batch) in sequences.chunks(self.batch_size).enumerate() {
            tracing::debug!("Starting batch {} ({} sequences)", number + 1, batch.len());
            results.extend(self.run_batch(&pool, batch)?);
        }

        Ok(results)
    }

    fn check_models(&self) -> Result<(), PlasClassError> {
        let dimension = self.extractor.dimension();
        if dimension == 0 {
            return Err(PlasClassError::InvalidInput(
                "feature extractor produces empty rows".to_string(),
            ));
        }
        for (index, &scale) in self.scales.as_slice().iter().enumerate() {
            self.models
                .get(index)
                .ok_or(PlasClassError::MissingModel { scale })?
                .validate(scale, dimension)?;
        }
        Ok(())
    }

    fn run_batch<S>(&self, pool: &ThreadPool, batch: &[S]) -> Result<Vec<f64>, PlasClassError>
    where
        S: AsRef<[u8]> + Sync,
    {
        let assignments: Vec<usize> = batch
            .iter()
            .map(|s| self.scales.select_index(s.as_ref().len()))
            .collect();

        let mut partitions: Vec<Vec<usize>> = vec![Vec::new(); self.scales.len()];
        for (position, &slot) in assignments.iter().enumerate() {
            partitions[slot].push(position);
        }

        let mut queues = Vec::with_capacity(partitions.len());
        for (slot, members) in partitions.iter().enumerate() {
            if members.is_empty() {
                queues.push(Vec::new().into_iter());
                continue;
            }

            let scale = self.scales.as_slice()[slot];
            let model = self
                .models
                .get(slot)
                .ok_or(PlasClassError::MissingModel { scale })?;

            tracing::debug!(
                "Getting k-mer frequencies for {} sequences at length scale {}",
                members.len(),
                scale
            );
            let mut matrix = self.extract(pool, batch, members)?;

            tracing::debug!("Classifying sequences of length scale {}", scale);
            let probabilities = model.predict_matrix(&mut matrix, self.extractor.dimension());
            queues.push(probabilities.into_iter());
        }

        assignments
            .iter()
            .map(|&slot| {
                queues[slot].next().ok_or_else(|| {
                    PlasClassError::Worker(format!(
                        "length scale {} produced fewer results than sequences",
                        self.scales.as_slice()[slot]
                    ))
                })
            })
            .collect()
    }

    /// Row-major feature matrix for `members`, one disjoint row per task.
    fn extract<S>(
        &self,
        pool: &ThreadPool,
        batch: &[S],
        members: &[usize],
    ) -> Result<Vec<f64>, PlasClassError>
    where
        S: AsRef<[u8]> + Sync,
    {
        let dimension = self.extractor.dimension();
        let mut matrix = vec![0.0; members.len() * dimension];

        pool.install(|| {
            matrix
                .par_chunks_mut(dimension)
                .zip(members.par_iter())
                .try_for_each(|(row, &position)| {
                    self.extractor.extract_into(batch[position].as_ref(), row)
                })
        })?;

        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{logistic, LinearClassifier, ScaleModel, Standardizer};
    use std::collections::HashMap;

    /// GC fraction as a single feature.
    struct GcFraction;

    impl FeatureExtractor for GcFraction {
        fn dimension(&self) -> usize {
            1
        }

        fn extract_into(&self, sequence: &[u8], out: &mut [f64]) -> Result<(), PlasClassError> {
            let gc = sequence.iter().filter(|&&b| b == b'G' || b == b'C').count();
            out[0] = if sequence.is_empty() {
                0.0
            } else {
                gc as f64 / sequence.len() as f64
            };
            Ok(())
        }
    }

    /// Fails on any sequence containing `X`.
    struct Picky;

    impl FeatureExtractor for Picky {
        fn dimension(&self) -> usize {
            1
        }

        fn extract_into(&self, sequence: &[u8], out: &mut [f64]) -> Result<(), PlasClassError> {
            if sequence.contains(&b'X') {
                return Err(PlasClassError::InvalidInput("unexpected X".to_string()));
            }
            out[0] = 0.0;
            Ok(())
        }
    }

    fn models(scales: &LengthScales, biases: &[f64]) -> ModelSet {
        let source: HashMap<u64, ScaleModel> = scales
            .as_slice()
            .iter()
            .zip(biases)
            .map(|(&scale, &bias)| {
                (
                    scale,
                    ScaleModel::new(
                        Standardizer::identity(1),
                        LinearClassifier::new(vec![1.0], bias),
                    ),
                )
            })
            .collect();
        ModelSet::load(scales, &source, 1).unwrap()
    }

    #[test]
    fn test_identity_model_returns_logistic_of_feature() {
        let scales = LengthScales::new(&[1000]).unwrap();
        let models = models(&scales, &[0.0]);
        let scheduler = ClassificationScheduler::new(&GcFraction, &scales, &models);

        let probs = scheduler.run(&["GGCA", "ATAT", "GGGG"]).unwrap();
        for (p, feature) in probs.iter().zip([0.75, 0.0, 1.0]) {
            assert!((p - logistic(feature)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_mixed_scales_keep_input_order() {
        let scales = LengthScales::new(&[4, 8, 16]).unwrap();
        // Distinct biases make the scale visible in the output.
        let models = models(&scales, &[-10.0, 0.0, 10.0]);
        let scheduler = ClassificationScheduler::new(&GcFraction, &scales, &models).with_threads(3);

        let seqs = [
            "GGGGGGGGGGGGGGGG",
            "AT",
            "GCGCGC",
            "ATATATATATATATATATAT",
            "G",
            "ACGTACGT",
        ];
        let batched = scheduler.run(&seqs).unwrap();

        assert_eq!(batched.len(), seqs.len());
        for (i, seq) in seqs.iter().enumerate() {
            let alone = scheduler.run(&[seq]).unwrap();
            assert_eq!(batched[i].to_bits(), alone[0].to_bits(), "sequence {}", i);
        }
    }

    #[test]
    fn test_batch_size_does_not_change_results() {
        let scales = LengthScales::new(&[4, 8]).unwrap();
        let models = models(&scales, &[-1.0, 1.0]);
        let seqs: Vec<String> = (0..37)
            .map(|i| "GATC".repeat(4)[..1 + i % 13].to_string())
            .collect();

        let reference = ClassificationScheduler::new(&GcFraction, &scales, &models)
            .run(&seqs)
            .unwrap();
        for batch_size in [1, 2, 5, 36, 37, 1000] {
            let probs = ClassificationScheduler::new(&GcFraction, &scales, &models)
                .with_batch_size(batch_size)
                .with_threads(2)
                .run(&seqs)
                .unwrap();
            let bits: Vec<u64> = probs.iter().map(|p| p.to_bits()).collect();
            let expected: Vec<u64> = reference.iter().map(|p| p.to_bits()).collect();
            assert_eq!(bits, expected, "batch size {}", batch_size);
        }
    }

    #[test]
    fn test_failed_extraction_aborts() {
        let scales = LengthScales::new(&[10]).unwrap();
        let models = models(&scales, &[0.0]);
        let scheduler = ClassificationScheduler::new(&Picky, &scales, &models).with_threads(2);

        assert!(scheduler.run(&["ACGT", "AC"]).is_ok());
        assert!(matches!(
            scheduler.run(&["ACGT", "AXGT", "AC"]),
            Err(PlasClassError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_empty_input() {
        let scales = LengthScales::new(&[10]).unwrap();
        let models = models(&scales, &[0.0]);
        let scheduler = ClassificationScheduler::new(&GcFraction, &scales, &models);
        let empty: [&str; 0] = [];
        assert!(scheduler.run(&empty).unwrap().is_empty());
    }

    #[test]
    fn test_model_dimension_mismatch() {
        let scales = LengthScales::new(&[10]).unwrap();
        let mut source = HashMap::new();
        source.insert(
            10,
            ScaleModel::new(Standardizer::identity(2), LinearClassifier::new(vec![1.0; 2], 0.0)),
        );
        let models = ModelSet::load(&scales, &source, 2).unwrap();
        let scheduler = ClassificationScheduler::new(&GcFraction, &scales, &models);
        assert!(matches!(
            scheduler.run(&["ACGT"]),
            Err(PlasClassError::ModelShape { .. })
        ));
    }
}
