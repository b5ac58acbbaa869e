/// Length-scale selection

use crate::PlasClassError;

/// Ascending length-scale breakpoints. Each sequence length maps to exactly
/// one of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthScales {
    breakpoints: Vec<u64>,
}

impl LengthScales {
    /// Sorts and deduplicates `breakpoints`; rejects an empty set and zero.
    pub fn new(breakpoints: &[u64]) -> Result<Self, PlasClassError> {
        let mut breakpoints = breakpoints.to_vec();
        breakpoints.sort_unstable();
        breakpoints.dedup();

        if breakpoints.is_empty() {
            return Err(PlasClassError::Config(
                "at least one length scale is required".to_string(),
            ));
        }
        if breakpoints[0] == 0 {
            return Err(PlasClassError::Config(
                "length scales must be positive".to_string(),
            ));
        }

        Ok(Self { breakpoints })
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.breakpoints
    }

    pub fn len(&self) -> usize {
        self.breakpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakpoints.is_empty()
    }

    /// Scale used for a sequence of `length` bases.
    pub fn select(&self, length: usize) -> u64 {
        self.breakpoints[self.select_index(length)]
    }

    /// Position of the selected scale.
    ///
    /// Lengths up to the first breakpoint use it; otherwise the first
    /// adjacent pair whose midpoint is at least `length` yields its lower
    /// member, and anything beyond every midpoint uses the largest scale.
    pub fn select_index(&self, length: usize) -> usize {
        let length = length as u128;
        let scales = &self.breakpoints;

        if length <= scales[0] as u128 {
            return 0;
        }

        scales
            .windows(2)
            .position(|pair| 2 * length <= pair[0] as u128 + pair[1] as u128)
            .unwrap_or(scales.len() - 1)
    }
}
