//! 2-bit nucleotide packing for k-mer windows.
//!
//! Codes are LSB-aligned: the last base of a window occupies the two lowest
//! bits, so numeric order of codes equals lexicographic order of the k-mers
//! over `A < C < G < T`.

/// Largest supported k-mer length. The canonical table for `k` holds `4^k`
/// entries.
pub const MAX_KMER_LENGTH: usize = 12;

/// ASCII to 2-bit lookup (A=0, C=1, G=2, T=3), 0xFF for everything else.
/// Only uppercase bases are valid.
static BASE_LUT: [u8; 256] = {
    const X: u8 = 0xFF;
    let mut t = [X; 256];
    t[b'A' as usize] = 0;
    t[b'C' as usize] = 1;
    t[b'G' as usize] = 2;
    t[b'T' as usize] = 3;
    t
};

/// 2-bit code for a base, `None` if the byte is not one of `ACGT`.
#[inline]
pub fn encode_base(b: u8) -> Option<u8> {
    let v = BASE_LUT[b as usize];
    if v <= 3 {
        Some(v)
    } else {
        None
    }
}

/// Mask covering the low `2k` bits.
#[inline]
pub fn kmer_mask(k: usize) -> u64 {
    debug_assert!(k > 0 && k <= 32);
    if k == 32 {
        u64::MAX
    } else {
        (1u64 << (2 * k)) - 1
    }
}

/// Encode a whole window. `None` if any byte is outside `ACGT` or the
/// window is empty/too long.
#[inline]
pub fn encode(window: &[u8]) -> Option<u64> {
    if window.is_empty() || window.len() > 32 {
        return None;
    }
    let mut code = 0u64;
    for &b in window {
        code = (code << 2) | encode_base(b)? as u64;
    }
    Some(code)
}

/// Slide the window one base to the right.
#[inline]
pub fn roll(prev: u64, base_code: u8, k: usize) -> u64 {
    ((prev << 2) | base_code as u64) & kmer_mask(k)
}

/// Reverse complement of an LSB-aligned code.
#[inline]
pub fn reverse_complement(code: u64, k: usize) -> u64 {
    let mut rc = 0u64;
    let mut fwd = code;
    for _ in 0..k {
        rc = (rc << 2) | ((fwd & 0b11) ^ 0b11);
        fwd >>= 2;
    }
    rc
}

/// Rolling window state for one k.
///
/// An invalid base resets the window; it becomes valid again after `k`
/// consecutive valid bases have been pushed.
#[derive(Debug, Clone)]
pub struct RollingKmer {
    k: usize,
    code: u64,
    filled: usize,
}

impl RollingKmer {
    pub fn new(k: usize) -> Self {
        Self { k, code: 0, filled: 0 }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    #[inline]
    pub fn push(&mut self, base: u8) {
        match encode_base(base) {
            Some(c) => {
                self.code = roll(self.code, c, self.k);
                if self.filled < self.k {
                    self.filled += 1;
                }
            }
            None => {
                self.code = 0;
                self.filled = 0;
            }
        }
    }

    /// Code of the current window, if every base in it is valid.
    #[inline]
    pub fn current(&self) -> Option<u64> {
        if self.filled == self.k {
            Some(self.code)
        } else {
            None
        }
    }
}
