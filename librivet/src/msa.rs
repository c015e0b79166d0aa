use crate::align::PairwiseAlignment;
use crate::structs::Sequence;

use std::io::Write;

use anyhow::Result;
use thiserror::Error;

pub const GAP_BYTE: u8 = b'-';

#[derive(Error, Debug)]
pub enum AssemblyInconsistencyError {
    #[error("hit for target {hit} was paired with sequence {sequence}")]
    NameMismatch { hit: String, sequence: String },
    #[error("hit for target {target} places query column {column} outside alignment width {width}")]
    QueryColumnOutOfRange {
        target: String,
        column: usize,
        width: usize,
    },
    #[error("hit for target {target} references residue {position} of a {length} residue sequence")]
    TargetResidueOutOfRange {
        target: String,
        position: usize,
        length: usize,
    },
    #[error("row for target {target} is {length} columns wide in a {width} column alignment")]
    RowWidthMismatch {
        target: String,
        length: usize,
        width: usize,
    },
}

/// One aligned target row: residues plus gap bytes, exactly as many
/// columns as the query has residues.
#[derive(Clone, Debug)]
pub struct MsaRow {
    pub name: String,
    pub residues: Vec<u8>,
}

/// A query-anchored multiple alignment.
///
/// Every column corresponds to one query residue. Target residues that
/// fall between query columns are dropped rather than opening new
/// columns, so all rows stay the same width and the query row carries
/// no gaps.
#[derive(Clone, Debug)]
pub struct Msa {
    pub query_name: String,
    pub query_residues: Vec<u8>,
    pub rows: Vec<MsaRow>,
}

impl Msa {
    /// Builds the alignment from a query and its filtered hits, each
    /// paired with the target sequence it aligns.
    ///
    /// Hits are laid onto the query coordinate system through their
    /// column maps. Query columns a hit does not reach stay as gaps.
    pub fn assemble<'a>(
        query: &Sequence,
        hits: impl IntoIterator<Item = (&'a PairwiseAlignment, &'a Sequence)>,
    ) -> Result<Self> {
        let width = query.length;
        let mut rows: Vec<MsaRow> = Vec::new();

        for (hit, target) in hits {
            if hit.target_name != target.name {
                return Err(AssemblyInconsistencyError::NameMismatch {
                    hit: hit.target_name.clone(),
                    sequence: target.name.clone(),
                }
                .into());
            }

            let map = hit.column_map()?;
            let mut residues = vec![GAP_BYTE; width];
            for pair in &map.pairs {
                let Some(query_position) = pair.query else {
                    // a residue between query columns adds no column
                    continue;
                };
                if query_position < 1 || query_position > width {
                    return Err(AssemblyInconsistencyError::QueryColumnOutOfRange {
                        target: target.name.clone(),
                        column: query_position,
                        width,
                    }
                    .into());
                }

                if let Some(target_position) = pair.target {
                    if target_position < 1 || target_position > target.length {
                        return Err(AssemblyInconsistencyError::TargetResidueOutOfRange {
                            target: target.name.clone(),
                            position: target_position,
                            length: target.length,
                        }
                        .into());
                    }
                    residues[query_position - 1] = target.utf8_byte(target_position);
                }
            }

            rows.push(MsaRow {
                name: target.name.clone(),
                residues,
            });
        }

        let msa = Self {
            query_name: query.name.clone(),
            query_residues: query.utf8_bytes[1..].to_vec(),
            rows,
        };
        msa.validate()?;
        Ok(msa)
    }

    pub fn width(&self) -> usize {
        self.query_residues.len()
    }

    /// The number of aligned sequences, the query included.
    pub fn num_sequences(&self) -> usize {
        self.rows.len() + 1
    }

    /// Checks that every row spans exactly the query width.
    pub fn validate(&self) -> Result<(), AssemblyInconsistencyError> {
        let width = self.width();
        for row in &self.rows {
            if row.residues.len() != width {
                return Err(AssemblyInconsistencyError::RowWidthMismatch {
                    target: row.name.clone(),
                    length: row.residues.len(),
                    width,
                });
            }
        }
        Ok(())
    }

    /// Writes A3M. With no insert columns kept, every line is exactly
    /// the alignment width; the query row leads.
    pub fn write_a3m(&self, out: &mut impl Write) -> Result<()> {
        writeln!(out, ">{}", self.query_name)?;
        out.write_all(&self.query_residues)?;
        writeln!(out)?;
        for row in &self.rows {
            writeln!(out, ">{}", row.name)?;
            out.write_all(&row.residues)?;
            writeln!(out)?;
        }
        Ok(())
    }

    /// Writes aligned FASTA: the same columns as the A3M form, with
    /// residues wrapped at 80 columns per line.
    pub fn write_afa(&self, out: &mut impl Write) -> Result<()> {
        let write_wrapped = |out: &mut dyn Write, residues: &[u8]| -> Result<()> {
            for chunk in residues.chunks(80) {
                out.write_all(chunk)?;
                writeln!(out)?;
            }
            Ok(())
        };

        writeln!(out, ">{}", self.query_name)?;
        write_wrapped(out, &self.query_residues)?;
        for row in &self.rows {
            writeln!(out, ">{}", row.name)?;
            write_wrapped(out, &row.residues)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::AlignOp;

    fn hit_with_ops(
        target_name: &str,
        query_start: usize,
        query_end: usize,
        target_start: usize,
        target_end: usize,
        ops: Vec<AlignOp>,
    ) -> PairwiseAlignment {
        PairwiseAlignment {
            query_name: "q".to_string(),
            target_name: target_name.to_string(),
            query_start,
            query_end,
            target_start,
            target_end,
            ops,
            score: 0,
            bits: 0.0,
            e_value: 0.0,
            gap_opens: 0,
        }
    }

    #[test]
    fn test_exact_copy_row_matches_query() -> Result<()> {
        let query = Sequence::named_from_utf8("q", b"MKVLATTREQ")?;
        let target = Sequence::named_from_utf8("t1", b"MKVLATTREQ")?;
        let hit = hit_with_ops("t1", 1, 10, 1, 10, vec![AlignOp::Match(10)]);

        let msa = Msa::assemble(&query, [(&hit, &target)])?;
        assert_eq!(msa.width(), 10);
        assert_eq!(msa.rows[0].residues, query.utf8_bytes[1..].to_vec());
        Ok(())
    }

    #[test]
    fn test_partial_coverage_leaves_flanking_gaps() -> Result<()> {
        let query = Sequence::named_from_utf8("q", b"MKVLATTREQ")?;
        let target = Sequence::named_from_utf8("t1", b"VLAT")?;
        let hit = hit_with_ops("t1", 3, 6, 1, 4, vec![AlignOp::Match(4)]);

        let msa = Msa::assemble(&query, [(&hit, &target)])?;
        assert_eq!(msa.rows[0].residues, b"--VLAT----".to_vec());
        Ok(())
    }

    #[test]
    fn test_insert_target_columns_are_dropped() -> Result<()> {
        let query = Sequence::named_from_utf8("q", b"MKVLAT")?;
        let target = Sequence::named_from_utf8("t1", b"MKVGLAT")?;
        let hit = hit_with_ops(
            "t1",
            1,
            6,
            1,
            7,
            vec![
                AlignOp::Match(3),
                AlignOp::InsertTarget(1),
                AlignOp::Match(3),
            ],
        );

        let msa = Msa::assemble(&query, [(&hit, &target)])?;
        // the G between query columns vanishes; width stays the query width
        assert_eq!(msa.rows[0].residues, b"MKVLAT".to_vec());
        Ok(())
    }

    #[test]
    fn test_insert_query_columns_become_gaps() -> Result<()> {
        let query = Sequence::named_from_utf8("q", b"MKVGLAT")?;
        let target = Sequence::named_from_utf8("t1", b"MKVLAT")?;
        let hit = hit_with_ops(
            "t1",
            1,
            7,
            1,
            6,
            vec![
                AlignOp::Match(3),
                AlignOp::InsertQuery(1),
                AlignOp::Match(3),
            ],
        );

        let msa = Msa::assemble(&query, [(&hit, &target)])?;
        assert_eq!(msa.rows[0].residues, b"MKV-LAT".to_vec());
        Ok(())
    }

    #[test]
    fn test_no_hits_yields_query_only_alignment() -> Result<()> {
        let query = Sequence::named_from_utf8("q", b"MKVLAT")?;
        let msa = Msa::assemble(&query, std::iter::empty::<(&PairwiseAlignment, &Sequence)>())?;
        assert_eq!(msa.num_sequences(), 1);
        assert_eq!(msa.width(), 6);
        Ok(())
    }

    #[test]
    fn test_name_mismatch_is_rejected() -> Result<()> {
        let query = Sequence::named_from_utf8("q", b"MKVLAT")?;
        let target = Sequence::named_from_utf8("somebody_else", b"MKVLAT")?;
        let hit = hit_with_ops("t1", 1, 6, 1, 6, vec![AlignOp::Match(6)]);

        let result = Msa::assemble(&query, [(&hit, &target)]);
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn test_malformed_hit_propagates() -> Result<()> {
        let query = Sequence::named_from_utf8("q", b"MKVLAT")?;
        let target = Sequence::named_from_utf8("t1", b"MKVLAT")?;
        // ops claim fewer columns than the declared span
        let hit = hit_with_ops("t1", 1, 6, 1, 6, vec![AlignOp::Match(3)]);

        assert!(Msa::assemble(&query, [(&hit, &target)]).is_err());
        Ok(())
    }

    #[test]
    fn test_assembly_is_idempotent() -> Result<()> {
        let query = Sequence::named_from_utf8("q", b"MKVLATTREQ")?;
        let target = Sequence::named_from_utf8("t1", b"KVLATT")?;
        let hit = hit_with_ops("t1", 2, 7, 1, 6, vec![AlignOp::Match(6)]);

        let first = Msa::assemble(&query, [(&hit, &target)])?;
        let second = Msa::assemble(&query, [(&hit, &target)])?;
        assert_eq!(first.rows[0].residues, second.rows[0].residues);
        assert_eq!(first.query_residues, second.query_residues);
        Ok(())
    }

    #[test]
    fn test_validate_catches_short_row() -> Result<()> {
        let query = Sequence::named_from_utf8("q", b"MKVLAT")?;
        let mut msa =
            Msa::assemble(&query, std::iter::empty::<(&PairwiseAlignment, &Sequence)>())?;
        msa.rows.push(MsaRow {
            name: "bad".to_string(),
            residues: b"MKV".to_vec(),
        });
        assert!(msa.validate().is_err());
        Ok(())
    }

    #[test]
    fn test_a3m_output_format() -> Result<()> {
        let query = Sequence::named_from_utf8("q", b"MKVLAT")?;
        let target = Sequence::named_from_utf8("t1", b"MKVLAT")?;
        let hit = hit_with_ops("t1", 1, 6, 1, 6, vec![AlignOp::Match(6)]);

        let msa = Msa::assemble(&query, [(&hit, &target)])?;
        let mut buffer: Vec<u8> = Vec::new();
        msa.write_a3m(&mut buffer)?;
        assert_eq!(
            String::from_utf8(buffer)?,
            ">q\nMKVLAT\n>t1\nMKVLAT\n"
        );
        Ok(())
    }

    #[test]
    fn test_afa_output_wraps_long_rows() -> Result<()> {
        let residues: Vec<u8> = b"MKVLATGRES".repeat(10);
        let query = Sequence::named_from_utf8("q", &residues)?;
        let target = Sequence::named_from_utf8("t1", &residues)?;
        let hit = hit_with_ops("t1", 1, 100, 1, 100, vec![AlignOp::Match(100)]);

        let msa = Msa::assemble(&query, [(&hit, &target)])?;
        let mut buffer: Vec<u8> = Vec::new();
        msa.write_afa(&mut buffer)?;
        let text = String::from_utf8(buffer)?;

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], ">q");
        assert_eq!(lines[1].len(), 80);
        assert_eq!(lines[2].len(), 20);
        assert_eq!(lines[3], ">t1");
        Ok(())
    }
}
