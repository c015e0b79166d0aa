use crate::alphabet::{canonical_residue, AMINO_ALPHABET_SIZE, DEGENERATE_ALPHABET_SIZE};

use lazy_static::lazy_static;

/// BLOSUM62, digital residue order: A C D E F G H I K L M N P Q R S T V W Y
#[rustfmt::skip]
pub const BLOSUM_62: [[i32; AMINO_ALPHABET_SIZE]; AMINO_ALPHABET_SIZE] = [
    //  A   C   D   E   F   G   H   I   K   L   M   N   P   Q   R   S   T   V   W   Y
    [   4,  0, -2, -1, -2,  0, -2, -1, -1, -1, -1, -2, -1, -1, -1,  1,  0,  0, -3, -2], // A
    [   0,  9, -3, -4, -2, -3, -3, -1, -3, -1, -1, -3, -3, -3, -3, -1, -1, -1, -2, -2], // C
    [  -2, -3,  6,  2, -3, -1, -1, -3, -1, -4, -3,  1, -1,  0, -2,  0, -1, -3, -4, -3], // D
    [  -1, -4,  2,  5, -3, -2,  0, -3,  1, -3, -2,  0, -1,  2,  0,  0, -1, -2, -3, -2], // E
    [  -2, -2, -3, -3,  6, -3, -1,  0, -3,  0,  0, -3, -4, -3, -3, -2, -2, -1,  1,  3], // F
    [   0, -3, -1, -2, -3,  6, -2, -4, -2, -4, -3,  0, -2, -2, -2,  0, -2, -3, -2, -3], // G
    [  -2, -3, -1,  0, -1, -2,  8, -3, -1, -3, -2,  1, -2,  0,  0, -1, -2, -3, -2,  2], // H
    [  -1, -1, -3, -3,  0, -4, -3,  4, -3,  2,  1, -3, -3, -3, -3, -2, -1,  3, -3, -1], // I
    [  -1, -3, -1,  1, -3, -2, -1, -3,  5, -2, -1,  0, -1,  1,  2,  0, -1, -2, -3, -2], // K
    [  -1, -1, -4, -3,  0, -4, -3,  2, -2,  4,  2, -3, -3, -2, -2, -2, -1,  1, -2, -1], // L
    [  -1, -1, -3, -2,  0, -3, -2,  1, -1,  2,  5, -2, -2,  0, -1, -1, -1,  1, -1, -1], // M
    [  -2, -3,  1,  0, -3,  0,  1, -3,  0, -3, -2,  6, -2,  0,  0,  1,  0, -3, -4, -2], // N
    [  -1, -3, -1, -1, -4, -2, -2, -3, -1, -3, -2, -2,  7, -1, -2, -1, -1, -2, -4, -3], // P
    [  -1, -3,  0,  2, -3, -2,  0, -3,  1, -2,  0,  0, -1,  5,  1,  0, -1, -2, -2, -1], // Q
    [  -1, -3, -2,  0, -3, -2,  0, -3,  2, -2, -1,  0, -2,  1,  5, -1, -1, -3, -3, -2], // R
    [   1, -1,  0,  0, -2,  0, -1, -2,  0, -2, -1,  1, -1,  0, -1,  4,  1, -2, -3, -2], // S
    [   0, -1, -1, -1, -2, -2, -2, -1, -1, -1, -1,  0, -1, -1, -1,  1,  5,  0, -2, -2], // T
    [   0, -1, -3, -2, -1, -3, -3,  3, -2,  1,  1, -3, -2, -2, -3, -2,  0,  4, -3, -1], // V
    [  -3, -2, -4, -3,  1, -2, -2, -3, -3, -2, -1, -4, -4, -2, -3, -3, -2, -3, 11,  2], // W
    [  -2, -2, -3, -2,  3, -3,  2, -1, -2, -1, -1, -2, -3, -1, -2, -2, -2, -1,  2,  7], // Y
];

/// The digital code for the fully-ambiguous residue X
const X_CODE: u8 = 22;

/// The score BLAST assigns any pair involving X
const X_SCORE: i32 = -1;

lazy_static! {
    /// The full 26x26 substitution table: the BLOSUM62 core, with
    /// degenerate codes scored through their canonical representative
    /// and X pinned at -1 against everything.
    static ref SUBSTITUTION_TABLE: [[i32; DEGENERATE_ALPHABET_SIZE]; DEGENERATE_ALPHABET_SIZE] = {
        let mut table = [[X_SCORE; DEGENERATE_ALPHABET_SIZE]; DEGENERATE_ALPHABET_SIZE];
        for a in 0..DEGENERATE_ALPHABET_SIZE as u8 {
            for b in 0..DEGENERATE_ALPHABET_SIZE as u8 {
                if a == X_CODE || b == X_CODE {
                    continue;
                }
                let (ra, rb) = match (canonical_residue(a), canonical_residue(b)) {
                    (Some(ra), Some(rb)) => (ra, rb),
                    _ => continue,
                };
                table[a as usize][b as usize] = BLOSUM_62[ra as usize][rb as usize];
            }
        }
        table
    };
}

/// The substitution score between two digital bytes.
///
/// Bytes outside the digital alphabet (the pad byte included) score
/// as X; callers are expected to never align pad positions.
#[inline]
pub fn substitution_score(a: u8, b: u8) -> i32 {
    if (a as usize) < DEGENERATE_ALPHABET_SIZE && (b as usize) < DEGENERATE_ALPHABET_SIZE {
        SUBSTITUTION_TABLE[a as usize][b as usize]
    } else {
        X_SCORE
    }
}

/// Affine gap penalties, stored as positive costs.
#[derive(Debug, Clone, Copy)]
pub struct GapPenalties {
    pub open: i32,
    pub extend: i32,
}

impl Default for GapPenalties {
    fn default() -> Self {
        // the standard BLOSUM62 gapped pairing: 11/1
        Self { open: 11, extend: 1 }
    }
}

/// Karlin-Altschul statistical parameters for a scoring system.
#[derive(Debug, Clone, Copy)]
pub struct KarlinParams {
    pub lambda: f64,
    pub k: f64,
}

impl Default for KarlinParams {
    fn default() -> Self {
        // published gapped BLOSUM62 (11/1) parameters
        Self {
            lambda: 0.267,
            k: 0.041,
        }
    }
}

/// S' = (lambda * S - ln K) / ln 2
pub fn bit_score(raw_score: i32, params: &KarlinParams) -> f64 {
    (params.lambda * raw_score as f64 - params.k.ln()) / std::f64::consts::LN_2
}

/// E = m * n * 2^(-S'), where m * n is the search space: query length
/// times total database residue count.
pub fn e_value(bit_score: f64, search_space: f64) -> f64 {
    search_space * 2.0_f64.powf(-bit_score)
}

/// The score of aligning a sequence against itself over a span,
/// i.e. the maximum achievable score for that span.
pub fn self_alignment_score(digital_bytes: &[u8]) -> i32 {
    digital_bytes
        .iter()
        .map(|&b| substitution_score(b, b))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_is_symmetric() {
        for a in 0..AMINO_ALPHABET_SIZE {
            for b in 0..AMINO_ALPHABET_SIZE {
                assert_eq!(BLOSUM_62[a][b], BLOSUM_62[b][a]);
            }
        }
    }

    #[test]
    fn test_substitution_score() {
        // W self-score is the matrix maximum
        assert_eq!(substitution_score(18, 18), 11);
        // A vs C
        assert_eq!(substitution_score(0, 1), 0);
        // B scores as D
        assert_eq!(substitution_score(23, 2), 6);
        // X scores -1 against everything, itself included
        assert_eq!(substitution_score(22, 18), -1);
        assert_eq!(substitution_score(22, 22), -1);
    }

    #[test]
    fn test_bit_score_and_e_value() {
        let params = KarlinParams::default();
        let bits = bit_score(100, &params);
        let expected = (0.267 * 100.0 - 0.041_f64.ln()) / std::f64::consts::LN_2;
        assert!((bits - expected).abs() < 1e-9);

        let e = e_value(50.0, 1e5);
        let expected = 1e5 * 2.0_f64.powf(-50.0);
        assert!((e - expected).abs() < 1e-12);

        // higher scores always mean lower E-values
        assert!(e_value(bit_score(120, &params), 1e5) < e_value(bit_score(80, &params), 1e5));
    }
}
