pub mod canonical;
pub mod counter;
pub mod encoder;

pub use canonical::CanonicalIndexTable;
pub use counter::KmerProfiler;
pub use encoder::{encode, encode_base, reverse_complement, roll, RollingKmer, MAX_KMER_LENGTH};

use crate::PlasClassError;

/// Turns one sequence into a fixed-length feature row.
///
/// Implementations are shared read-only across worker threads and write
/// only into the slot they are handed.
pub trait FeatureExtractor: Send + Sync {
    /// Length of every row this extractor produces.
    fn dimension(&self) -> usize;

    /// Fill `out` (exactly `dimension()` long) with the features of `sequence`.
    fn extract_into(&self, sequence: &[u8], out: &mut [f64]) -> Result<(), PlasClassError>;
}
