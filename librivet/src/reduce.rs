use crate::alphabet::{canonical_residue, AMINO_ALPHABET_SIZE, SEQUENCE_PAD_BYTE};
use crate::structs::Sequence;

use anyhow::Result;
use thiserror::Error;

#[derive(Error, Debug)]
#[error("invalid residue byte: {byte} at position {position} in sequence: {name}")]
pub struct InvalidResidueError {
    pub name: String,
    pub position: usize,
    pub byte: u8,
}

#[derive(Error, Debug)]
#[error("unknown reduction scheme: {name}")]
pub struct UnknownSchemeError {
    pub name: String,
}

/// A fixed mapping from the 20-letter amino alphabet onto a smaller
/// group alphabet, plus the k-mer parameters used when probing the
/// reduced database.
///
/// Schemes are static configuration, never computed at runtime. They
/// only drive prefiltering; final alignment scores always come from
/// the full-alphabet substitution matrix.
#[derive(Debug, Clone)]
pub struct ReductionScheme {
    pub name: &'static str,
    /// The number of residue groups
    pub num_groups: u8,
    /// residue group for each canonical digital residue 0..19
    pub groups: [u8; AMINO_ALPHABET_SIZE],
    /// The default k-mer length used with this scheme
    pub kmer_length: usize,
    /// The default Hamming tolerance for k-mer probes (0 or 1)
    pub hamming_tolerance: u8,
}

// group tables are indexed by canonical digital residue:
//   A C D E F G H I K L M N P Q R S T V W Y

/// Murphy, Wallqvist & Levitt (2000) 4-group alphabet:
/// [LVIMC] [AGSTP] [FYW] [EDNQKRH]
pub const MURPHY_4: ReductionScheme = ReductionScheme {
    name: "murphy4",
    num_groups: 4,
    groups: [1, 0, 3, 3, 2, 1, 3, 0, 3, 0, 0, 3, 1, 3, 3, 1, 1, 0, 2, 2],
    kmer_length: 8,
    hamming_tolerance: 0,
};

/// Murphy, Wallqvist & Levitt (2000) 8-group alphabet:
/// [LVIMC] [AG] [ST] [P] [FYW] [EDNQ] [KR] [H]
pub const MURPHY_8: ReductionScheme = ReductionScheme {
    name: "murphy8",
    num_groups: 8,
    groups: [1, 0, 5, 5, 4, 1, 7, 0, 6, 0, 0, 5, 3, 5, 6, 2, 2, 0, 4, 4],
    kmer_length: 5,
    hamming_tolerance: 0,
};

/// Murphy, Wallqvist & Levitt (2000) 10-group alphabet:
/// [LVIM] [C] [A] [G] [ST] [P] [FYW] [EDNQ] [KR] [H]
pub const MURPHY_10: ReductionScheme = ReductionScheme {
    name: "murphy10",
    num_groups: 10,
    groups: [2, 1, 7, 7, 6, 3, 9, 0, 8, 0, 0, 7, 5, 7, 8, 4, 4, 0, 6, 6],
    kmer_length: 5,
    hamming_tolerance: 0,
};

/// Murphy, Wallqvist & Levitt (2000) 15-group alphabet:
/// [LVIM] [C] [A] [G] [S] [T] [P] [FY] [W] [E] [D] [N] [Q] [KR] [H]
pub const MURPHY_15: ReductionScheme = ReductionScheme {
    name: "murphy15",
    num_groups: 15,
    groups: [
        2, 1, 10, 9, 7, 3, 14, 0, 13, 0, 0, 11, 6, 12, 13, 4, 5, 0, 8, 7,
    ],
    kmer_length: 4,
    hamming_tolerance: 0,
};

pub const SCHEMES: [&ReductionScheme; 4] = [&MURPHY_4, &MURPHY_8, &MURPHY_10, &MURPHY_15];

impl ReductionScheme {
    pub fn by_name(name: &str) -> Result<Self> {
        SCHEMES
            .iter()
            .find(|s| s.name == name)
            .map(|s| (*s).clone())
            .ok_or_else(|| {
                UnknownSchemeError {
                    name: name.to_string(),
                }
                .into()
            })
    }

    pub fn names() -> Vec<&'static str> {
        SCHEMES.iter().map(|s| s.name).collect()
    }

    /// The residue group for a digital byte. Degenerate codes resolve
    /// through their canonical representative.
    #[inline]
    pub fn group_of(&self, digital_byte: u8) -> Option<u8> {
        canonical_residue(digital_byte).map(|r| self.groups[r as usize])
    }

    /// Transforms a sequence into its reduced-alphabet view.
    ///
    /// The output has the same length and 1-based pad convention as
    /// the source; it fails only on a byte outside the digital
    /// alphabet.
    pub fn reduce<'a>(&self, sequence: &'a Sequence) -> Result<ReducedSequence<'a>> {
        let mut groups: Vec<u8> = Vec::with_capacity(sequence.length + 1);
        groups.push(SEQUENCE_PAD_BYTE);

        for (idx, &byte) in sequence.digital_bytes[1..].iter().enumerate() {
            match self.group_of(byte) {
                Some(group) => groups.push(group),
                None => {
                    return Err(InvalidResidueError {
                        name: sequence.name.clone(),
                        position: idx + 1,
                        byte,
                    }
                    .into())
                }
            }
        }

        Ok(ReducedSequence {
            source: sequence,
            groups,
        })
    }
}

/// A reduced-alphabet view of a sequence, tied to the lifetime of its
/// source. Transient: built for one search pass, never persisted.
pub struct ReducedSequence<'a> {
    pub source: &'a Sequence,
    /// The residue groups, 1-based like the source digital bytes
    pub groups: Vec<u8>,
}

impl ReducedSequence<'_> {
    pub fn length(&self) -> usize {
        self.groups.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduce_preserves_length() -> anyhow::Result<()> {
        let seq = Sequence::from_utf8(b"ACDEFGHIKLMNPQRSTVWY")?;
        for scheme in SCHEMES {
            let reduced = scheme.reduce(&seq)?;
            assert_eq!(reduced.length(), seq.length);
        }
        Ok(())
    }

    #[test]
    fn test_reduce_groups_by_scheme() -> anyhow::Result<()> {
        // L, V, I and M share a group under every Murphy scheme
        let seq = Sequence::from_utf8(b"LVIM")?;
        for scheme in SCHEMES {
            let reduced = scheme.reduce(&seq)?;
            assert!(reduced.groups[1..].iter().all(|&g| g == reduced.groups[1]));
        }

        // K and R share a group under murphy8, but E does not
        let seq = Sequence::from_utf8(b"KRE")?;
        let reduced = MURPHY_8.reduce(&seq)?;
        assert_eq!(reduced.groups[1], reduced.groups[2]);
        assert_ne!(reduced.groups[1], reduced.groups[3]);
        Ok(())
    }

    #[test]
    fn test_reduce_handles_degenerates() -> anyhow::Result<()> {
        // B resolves to D, which groups with E under murphy8
        let seq = Sequence::from_utf8(b"BE")?;
        let reduced = MURPHY_8.reduce(&seq)?;
        assert_eq!(reduced.groups[1], reduced.groups[2]);
        Ok(())
    }

    #[test]
    fn test_group_tables_are_dense() {
        for scheme in SCHEMES {
            assert!(scheme.groups.iter().all(|&g| g < scheme.num_groups));
            // every group label is used at least once
            for group in 0..scheme.num_groups {
                assert!(scheme.groups.contains(&group));
            }
        }
    }

    #[test]
    fn test_unknown_scheme_name() {
        assert!(ReductionScheme::by_name("murphy7").is_err());
        assert!(ReductionScheme::by_name("murphy10").is_ok());
    }
}
