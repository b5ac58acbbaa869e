//! Canonical k-mer slot assignment.

use super::encoder::{reverse_complement, MAX_KMER_LENGTH};
use crate::PlasClassError;

/// Slot table for one k.
#[derive(Debug, Clone)]
struct KmerSlots {
    k: usize,
    offset: usize,
    class_count: usize,
    slots: Vec<u32>,
}

/// Maps every 2-bit k-mer code to the feature slot shared with its reverse
/// complement, for each configured k.
///
/// Slots are assigned in lexicographic k-mer order: the first member of each
/// reverse-complement pair to be enumerated opens a new slot and the second
/// reuses it. Built once and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct CanonicalIndexTable {
    tables: Vec<KmerSlots>,
    dimension: usize,
}

impl CanonicalIndexTable {
    /// Build tables for `kmer_lengths`. The lengths are sorted and
    /// deduplicated; each must lie in `1..=MAX_KMER_LENGTH`.
    pub fn build(kmer_lengths: &[usize]) -> Result<Self, PlasClassError> {
        let mut ks = kmer_lengths.to_vec();
        ks.sort_unstable();
        ks.dedup();

        if ks.is_empty() {
            return Err(PlasClassError::Config(
                "at least one k-mer length is required".to_string(),
            ));
        }
        if let Some(&k) = ks.iter().find(|&&k| k == 0 || k > MAX_KMER_LENGTH) {
            return Err(PlasClassError::Config(format!(
                "k-mer length {} outside supported range 1..={}",
                k, MAX_KMER_LENGTH
            )));
        }

        let mut tables = Vec::with_capacity(ks.len());
        let mut offset = 0;
        for k in ks {
            let (slots, class_count) = assign_slots(k);
            tracing::debug!("k={} -> {} canonical classes", k, class_count);
            tables.push(KmerSlots {
                k,
                offset,
                class_count,
                slots,
            });
            offset += class_count;
        }

        Ok(Self {
            tables,
            dimension: offset,
        })
    }

    /// Configured k values, ascending.
    pub fn kmer_lengths(&self) -> Vec<usize> {
        self.tables.iter().map(|t| t.k).collect()
    }

    /// Total feature vector length, the sum of all class counts.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn class_count(&self, k: usize) -> Option<usize> {
        self.find(k).map(|t| t.class_count)
    }

    /// Start of the block for `k` within the feature vector.
    pub fn offset(&self, k: usize) -> Option<usize> {
        self.find(k).map(|t| t.offset)
    }

    /// Canonical slot of `code` within the block for `k`.
    pub fn index(&self, k: usize, code: u64) -> Option<usize> {
        self.find(k)
            .and_then(|t| t.slots.get(code as usize))
            .map(|&s| s as usize)
    }

    /// Offset, class count and slot array of the `position`-th k.
    pub(crate) fn block(&self, position: usize) -> (usize, usize, &[u32]) {
        let t = &self.tables[position];
        (t.offset, t.class_count, &t.slots)
    }

    fn find(&self, k: usize) -> Option<&KmerSlots> {
        self.tables.iter().find(|t| t.k == k)
    }
}

fn assign_slots(k: usize) -> (Vec<u32>, usize) {
    let total = 1usize << (2 * k);
    let mut slots = vec![0u32; total];
    let mut next = 0u32;

    // Ascending code order is lexicographic order, so a reverse complement
    // with a smaller code has already been assigned.
    for code in 0..total {
        let rc = reverse_complement(code as u64, k) as usize;
        if rc < code {
            slots[code] = slots[rc];
        } else {
            slots[code] = next;
            next += 1;
        }
    }

    (slots, next as usize)
}
