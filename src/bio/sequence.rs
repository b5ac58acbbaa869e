use serde::{Deserialize, Serialize};

/// A named nucleotide record. Residues are stored as read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sequence {
    pub id: String,
    pub sequence: Vec<u8>,
}

impl Sequence {
    pub fn new(id: String, sequence: Vec<u8>) -> Self {
        Self { id, sequence }
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Uppercase the residues in place. Returns whether anything changed,
    /// so callers can warn about soft-masked input.
    pub fn normalize_case(&mut self) -> bool {
        if !self.sequence.iter().any(u8::is_ascii_lowercase) {
            return false;
        }
        self.sequence.make_ascii_uppercase();
        true
    }
}

impl AsRef<[u8]> for Sequence {
    fn as_ref(&self) -> &[u8] {
        &self.sequence
    }
}
