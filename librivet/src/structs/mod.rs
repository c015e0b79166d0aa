mod sequence;
pub use sequence::*;
