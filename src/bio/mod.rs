pub mod fastx;
pub mod sequence;

pub use sequence::Sequence;
