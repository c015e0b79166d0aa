use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One run of alignment columns, tagged by what each column consumes.
///
/// Kept as explicit variants rather than a CIGAR string so decoding
/// is exhaustively checked at compile time.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlignOp {
    /// Aligned residue pairs (match or mismatch); consumes both sequences
    Match(u32),
    /// Residues present in the query but absent from the hit
    InsertQuery(u32),
    /// Residues present in the hit but absent from the query
    InsertTarget(u32),
}

impl AlignOp {
    pub fn length(&self) -> u32 {
        match self {
            AlignOp::Match(n) | AlignOp::InsertQuery(n) | AlignOp::InsertTarget(n) => *n,
        }
    }

    fn same_kind(&self, other: &AlignOp) -> bool {
        matches!(
            (self, other),
            (AlignOp::Match(_), AlignOp::Match(_))
                | (AlignOp::InsertQuery(_), AlignOp::InsertQuery(_))
                | (AlignOp::InsertTarget(_), AlignOp::InsertTarget(_))
        )
    }

    fn with_length(&self, length: u32) -> AlignOp {
        match self {
            AlignOp::Match(_) => AlignOp::Match(length),
            AlignOp::InsertQuery(_) => AlignOp::InsertQuery(length),
            AlignOp::InsertTarget(_) => AlignOp::InsertTarget(length),
        }
    }
}

/// Merges adjacent ops of the same kind and drops zero-length ops.
pub fn coalesce_ops(ops: impl IntoIterator<Item = AlignOp>) -> Vec<AlignOp> {
    let mut merged: Vec<AlignOp> = vec![];
    for op in ops {
        if op.length() == 0 {
            continue;
        }
        match merged.last_mut() {
            Some(last) if last.same_kind(&op) => {
                *last = last.with_length(last.length() + op.length());
            }
            _ => merged.push(op),
        }
    }
    merged
}

#[derive(Error, Debug)]
pub enum MalformedAlignmentError {
    #[error(
        "alignment of query {query} vs hit {target}: \
         ops consume query positions through {consumed}, declared end is {declared}"
    )]
    QuerySpanMismatch {
        query: String,
        target: String,
        consumed: usize,
        declared: usize,
    },
    #[error(
        "alignment of query {query} vs hit {target}: \
         ops consume hit positions through {consumed}, declared end is {declared}"
    )]
    TargetSpanMismatch {
        query: String,
        target: String,
        consumed: usize,
        declared: usize,
    },
    #[error("alignment of query {query} vs hit {target}: empty operation list")]
    EmptyOps { query: String, target: String },
}

/// One local alignment between a query and a database hit.
///
/// Coordinates are 1-based and inclusive, matching the 1-based digital
/// sequence convention. Immutable after construction.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PairwiseAlignment {
    pub query_name: String,
    pub target_name: String,
    pub query_start: usize,
    pub query_end: usize,
    pub target_start: usize,
    pub target_end: usize,
    pub ops: Vec<AlignOp>,
    /// The raw substitution-matrix score
    pub score: i32,
    /// The score in bits under the Karlin-Altschul parameters
    pub bits: f64,
    pub e_value: f64,
    pub gap_opens: usize,
}

impl PairwiseAlignment {
    pub fn query_span(&self) -> usize {
        self.query_end - self.query_start + 1
    }

    /// The length of the overlap between this alignment's query span
    /// and another's, in query columns.
    pub fn query_overlap(&self, other: &PairwiseAlignment) -> usize {
        let start = self.query_start.max(other.query_start);
        let end = self.query_end.min(other.query_end);
        end.saturating_sub(start - 1)
    }

    /// Decodes the op list into an explicit column-to-column mapping.
    ///
    /// Walks the ops with a cursor on each sequence and checks that
    /// both cursors land exactly on the declared end coordinates; a
    /// shortfall or overrun means the record is corrupt.
    pub fn column_map(&self) -> Result<ColumnMap, MalformedAlignmentError> {
        if self.ops.is_empty() {
            return Err(MalformedAlignmentError::EmptyOps {
                query: self.query_name.clone(),
                target: self.target_name.clone(),
            });
        }

        let mut pairs: Vec<ColumnPair> = Vec::new();
        let mut query_cursor = self.query_start;
        let mut target_cursor = self.target_start;

        for op in &self.ops {
            match op {
                AlignOp::Match(count) => {
                    for _ in 0..*count {
                        pairs.push(ColumnPair {
                            query: Some(query_cursor),
                            target: Some(target_cursor),
                        });
                        query_cursor += 1;
                        target_cursor += 1;
                    }
                }
                AlignOp::InsertQuery(count) => {
                    for _ in 0..*count {
                        pairs.push(ColumnPair {
                            query: Some(query_cursor),
                            target: None,
                        });
                        query_cursor += 1;
                    }
                }
                AlignOp::InsertTarget(count) => {
                    for _ in 0..*count {
                        pairs.push(ColumnPair {
                            query: None,
                            target: Some(target_cursor),
                        });
                        target_cursor += 1;
                    }
                }
            }
        }

        if query_cursor != self.query_end + 1 {
            return Err(MalformedAlignmentError::QuerySpanMismatch {
                query: self.query_name.clone(),
                target: self.target_name.clone(),
                consumed: query_cursor - 1,
                declared: self.query_end,
            });
        }

        if target_cursor != self.target_end + 1 {
            return Err(MalformedAlignmentError::TargetSpanMismatch {
                query: self.query_name.clone(),
                target: self.target_name.clone(),
                consumed: target_cursor - 1,
                declared: self.target_end,
            });
        }

        Ok(ColumnMap {
            target_name: self.target_name.clone(),
            pairs,
        })
    }
}

/// One decoded alignment column: a 1-based query position, a 1-based
/// hit position, or both. Never both None.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnPair {
    pub query: Option<usize>,
    pub target: Option<usize>,
}

/// The decoded form of one PairwiseAlignment.
#[derive(Debug)]
pub struct ColumnMap {
    pub target_name: String,
    pub pairs: Vec<ColumnPair>,
}
