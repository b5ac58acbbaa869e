//! Multi-k canonical k-mer frequency profiles.

use super::canonical::CanonicalIndexTable;
use super::encoder::RollingKmer;
use super::FeatureExtractor;
use crate::PlasClassError;
use std::sync::Arc;

/// Counts canonical k-mers for every configured k in a single left-to-right
/// scan and emits the concatenated per-k frequency vectors.
///
/// Each k keeps its own rolling window. A non-`ACGT` byte invalidates every
/// window that contains it; each k then re-synchronizes on its own once `k`
/// fresh valid bases have been read, so no counted window ever spans an
/// invalid byte.
#[derive(Debug, Clone)]
pub struct KmerProfiler {
    table: Arc<CanonicalIndexTable>,
    kmer_lengths: Vec<usize>,
}

impl KmerProfiler {
    pub fn new(table: Arc<CanonicalIndexTable>) -> Self {
        let kmer_lengths = table.kmer_lengths();
        Self {
            table,
            kmer_lengths,
        }
    }

    pub fn table(&self) -> &CanonicalIndexTable {
        &self.table
    }

    pub fn dimension(&self) -> usize {
        self.table.dimension()
    }

    /// Normalized feature vector for `sequence`.
    pub fn count(&self, sequence: &[u8]) -> Vec<f64> {
        let mut out = vec![0.0; self.dimension()];
        self.tally(sequence, &mut out);
        self.normalize(&mut out);
        out
    }

    /// Write the normalized feature vector into a pre-sized slot.
    pub fn count_into(&self, sequence: &[u8], out: &mut [f64]) -> Result<(), PlasClassError> {
        if out.len() != self.dimension() {
            return Err(PlasClassError::InvalidInput(format!(
                "feature slot has length {}, expected {}",
                out.len(),
                self.dimension()
            )));
        }
        out.fill(0.0);
        self.tally(sequence, out);
        self.normalize(out);
        Ok(())
    }

    /// Unnormalized window counts, laid out like the feature vector.
    pub fn raw_counts(&self, sequence: &[u8]) -> Vec<f64> {
        let mut out = vec![0.0; self.dimension()];
        self.tally(sequence, &mut out);
        out
    }

    fn tally(&self, seq: &[u8], out: &mut [f64]) {
        let n = seq.len();
        let ks = &self.kmer_lengths;
        let min_k = ks[0];

        // Prime each window with the bases of the window starting at 0.
        let mut windows: Vec<RollingKmer> = ks.iter().map(|&k| RollingKmer::new(k)).collect();
        for w in windows.iter_mut() {
            for &b in &seq[..w.k().min(n)] {
                w.push(b);
            }
        }

        if n < min_k {
            return;
        }

        // While the largest window fits every k is live; past that point the
        // tail shrinks the live set from the top until only min_k remains.
        let mut live = ks.len();
        for start in 0..=n - min_k {
            while start + ks[live - 1] > n {
                live -= 1;
            }

            for (position, w) in windows[..live].iter_mut().enumerate() {
                let (offset, _, slots) = self.table.block(position);
                if let Some(code) = w.current() {
                    out[offset + slots[code as usize] as usize] += 1.0;
                }
                if let Some(&next) = seq.get(start + w.k()) {
                    w.push(next);
                }
            }
        }
    }

    fn normalize(&self, out: &mut [f64]) {
        for position in 0..self.kmer_lengths.len() {
            let (offset, class_count, _) = self.table.block(position);
            let block = &mut out[offset..offset + class_count];
            let total: f64 = block.iter().sum();
            if total > 0.0 {
                block.iter_mut().for_each(|v| *v /= total);
            }
        }
    }
}

impl FeatureExtractor for KmerProfiler {
    fn dimension(&self) -> usize {
        self.table.dimension()
    }

    fn extract_into(&self, sequence: &[u8], out: &mut [f64]) -> Result<(), PlasClassError> {
        self.count_into(sequence, out)
    }
}
