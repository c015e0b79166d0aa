use phf::phf_map;

pub const UTF8_SPACE: u8 = 32;
pub const UTF8_DASH: u8 = 45;
pub const UTF8_DOT: u8 = 46;

pub const AMINO_ALPHABET: [&str; 20] = [
    "A", "C", "D", "E", "F", "G", "H", "I", "K", "L", "M", "N", "P", "Q", "R", "S", "T", "V", "W",
    "Y",
];

/// The number of canonical residues in the digital alphabet.
///
/// Digital bytes 0..19 are the canonical residues; 20..25 are
/// the degenerate codes O, U, X, B, Z, J in that order.
pub const AMINO_ALPHABET_SIZE: usize = 20;

pub const DEGENERATE_ALPHABET_SIZE: usize = 26;

/// The pad byte that sits at index 0 of every digital sequence.
pub const SEQUENCE_PAD_BYTE: u8 = 255;

pub const UTF8_TO_DIGITAL_AMINO: phf::Map<u8, u8> = phf_map! {
    // upper case
    65u8 => 0,    // A
    67u8 => 1,    // C
    68u8 => 2,    // D
    69u8 => 3,    // E
    70u8 => 4,    // F
    71u8 => 5,    // G
    72u8 => 6,    // H
    73u8 => 7,    // I
    75u8 => 8,    // K
    76u8 => 9,    // L
    77u8 => 10,   // M
    78u8 => 11,   // N
    80u8 => 12,   // P
    81u8 => 13,   // Q
    82u8 => 14,   // R
    83u8 => 15,   // S
    84u8 => 16,   // T
    86u8 => 17,   // V
    87u8 => 18,   // W
    89u8 => 19,   // Y
    // lower case
    97u8 => 0,    // a
    99u8 => 1,    // c
    100u8 => 2,   // d
    101u8 => 3,   // e
    102u8 => 4,   // f
    103u8 => 5,   // g
    104u8 => 6,   // h
    105u8 => 7,   // i
    107u8 => 8,   // k
    108u8 => 9,   // l
    109u8 => 10,  // m
    110u8 => 11,  // n
    112u8 => 12,  // p
    113u8 => 13,  // q
    114u8 => 14,  // r
    115u8 => 15,  // s
    116u8 => 16,  // t
    118u8 => 17,  // v
    119u8 => 18,  // w
    121u8 => 19,  // y
    // degenerate characters
    79u8 => 20,   // O
    85u8 => 21,   // U
    88u8 => 22,   // X
    66u8 => 23,   // B
    90u8 => 24,   // Z
    74u8 => 25,   // J
    111u8 => 20,  // o
    117u8 => 21,  // u
    120u8 => 22,  // x
    98u8 => 23,   // b
    122u8 => 24,  // z
    106u8 => 25,  // j
};

pub const AMINO_INVERSE_MAP: phf::Map<u8, u8> = phf_map! {
    0u8  => 65,   // A
    1u8  => 67,   // C
    2u8  => 68,   // D
    3u8  => 69,   // E
    4u8  => 70,   // F
    5u8  => 71,   // G
    6u8  => 72,   // H
    7u8  => 73,   // I
    8u8  => 75,   // K
    9u8  => 76,   // L
    10u8 => 77,   // M
    11u8 => 78,   // N
    12u8 => 80,   // P
    13u8 => 81,   // Q
    14u8 => 82,   // R
    15u8 => 83,   // S
    16u8 => 84,   // T
    17u8 => 86,   // V
    18u8 => 87,   // W
    19u8 => 89,   // Y
    // end base alphabet
    20u8 => 79,   // O
    21u8 => 85,   // U
    22u8 => 88,   // X
    23u8 => 66,   // B
    24u8 => 90,   // Z
    25u8 => 74,   // J
    45u8 => 45,   // -
    46u8 => 46,   // .
    32u8 => 32,   // space
    255u8 => 32,  // space
};

/// Maps each degenerate digital code to a canonical representative
/// residue: O -> K, U -> C, X -> A, B -> D, Z -> E, J -> L.
///
/// X only resolves to a representative for table indexing; scoring
/// treats it specially (see `score::substitution_score`).
pub const DEGENERATE_REPRESENTATIVE: [u8; 6] = [8, 1, 0, 2, 3, 9];

/// Collapses a digital byte onto a canonical residue in 0..19.
///
/// Returns None for bytes outside the digital alphabet (including
/// the pad byte).
#[inline]
pub fn canonical_residue(digital_byte: u8) -> Option<u8> {
    match digital_byte {
        0..=19 => Some(digital_byte),
        20..=25 => Some(DEGENERATE_REPRESENTATIVE[digital_byte as usize - 20]),
        _ => None,
    }
}
