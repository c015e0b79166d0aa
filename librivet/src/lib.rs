pub mod align;
pub mod alphabet;
pub mod filter;
pub mod msa;
pub mod output;
pub mod reduce;
pub mod score;
pub mod search;
pub mod structs;
