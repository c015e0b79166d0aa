mod index;
pub use index::*;

mod extend;
pub use extend::*;

use serde::{Deserialize, Serialize};

/// A reduced-alphabet k-mer match anchoring a candidate alignment.
///
/// Transient: produced and consumed within one matching pass.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Seed {
    /// Index of the matched sequence in the target collection
    pub target: u32,
    /// 1-based position of the k-mer in the query
    pub query_start: usize,
    /// 1-based position of the k-mer in the target
    pub target_start: usize,
    pub length: usize,
}

impl Seed {
    pub fn diagonal(&self) -> isize {
        self.query_start as isize - self.target_start as isize
    }
}
