use crate::reduce::{ReducedSequence, ReductionScheme};
use crate::structs::Sequence;

use super::Seed;

use anyhow::{bail, Result};

/// Caps how many database positions one k-mer code can carry, so a
/// low-complexity k-mer cannot dominate the position lists.
pub const MAX_POSITIONS_PER_KMER: usize = 256;

/// Number of target sequences per index shard.
pub const TARGETS_PER_SHARD: usize = 1024;

/// Largest direct-address table the index will allocate per shard.
const MAX_TABLE_SIZE: usize = 1 << 24;

/// One database position holding a k-mer: (target, 1-based position).
#[derive(Clone, Copy, Debug)]
pub struct KmerPosition {
    pub target: u32,
    pub position: u32,
}

/// Positional base-g encoding of a reduced k-mer, where g is the
/// scheme's group count. Windows never include the pad byte, so every
/// group fits below the base.
#[inline]
pub fn encode_kmer(groups: &[u8], num_groups: usize) -> usize {
    groups
        .iter()
        .fold(0usize, |code, &g| code * num_groups + g as usize)
}

/// The k-mer table for one contiguous slice of the target collection.
pub struct IndexShard {
    table: Vec<Vec<KmerPosition>>,
}

impl IndexShard {
    /// Builds the shard table for `targets`, whose first sequence has
    /// collection index `first_target`.
    pub fn build(
        targets: &[Sequence],
        first_target: u32,
        scheme: &ReductionScheme,
        kmer_length: usize,
    ) -> Result<Self> {
        let table_size = table_size(scheme, kmer_length)?;
        let mut table: Vec<Vec<KmerPosition>> = vec![Vec::new(); table_size];
        let num_groups = scheme.num_groups as usize;

        for (offset, target) in targets.iter().enumerate() {
            let reduced = scheme.reduce(target)?;
            if reduced.length() < kmer_length {
                continue;
            }

            for position in 1..=(reduced.length() - kmer_length + 1) {
                let window = &reduced.groups[position..position + kmer_length];
                let code = encode_kmer(window, num_groups);
                let positions = &mut table[code];
                if positions.len() < MAX_POSITIONS_PER_KMER {
                    positions.push(KmerPosition {
                        target: first_target + offset as u32,
                        position: position as u32,
                    });
                }
            }
        }

        Ok(Self { table })
    }

    fn positions(&self, code: usize) -> &[KmerPosition] {
        &self.table[code]
    }
}

fn table_size(scheme: &ReductionScheme, kmer_length: usize) -> Result<usize> {
    if kmer_length == 0 {
        bail!("k-mer length must be at least 1");
    }

    let mut size: usize = 1;
    for _ in 0..kmer_length {
        size = size.saturating_mul(scheme.num_groups as usize);
        if size > MAX_TABLE_SIZE {
            bail!(
                "k-mer table too large: {} groups ^ {} k-mer length exceeds {}",
                scheme.num_groups,
                kmer_length,
                MAX_TABLE_SIZE
            );
        }
    }
    Ok(size)
}

/// A sharded k-mer index over the reduced target database.
///
/// Built once per database and shared read-only across workers. Shards
/// cover contiguous target ranges and are probed in shard order, so
/// results are deterministic no matter how the shards were built.
pub struct KmerIndex {
    scheme: ReductionScheme,
    kmer_length: usize,
    hamming_tolerance: u8,
    shards: Vec<IndexShard>,
    /// The total residue count of the database, for E-value search space
    pub total_residues: usize,
    pub num_targets: usize,
}

impl KmerIndex {
    /// Builds all shards serially. Callers that want parallel builds
    /// construct shards with [`IndexShard::build`] over
    /// [`shard_ranges`] and assemble with [`KmerIndex::from_shards`].
    pub fn build(
        targets: &[Sequence],
        scheme: &ReductionScheme,
        kmer_length: usize,
        hamming_tolerance: u8,
    ) -> Result<Self> {
        let shards = shard_ranges(targets.len())
            .into_iter()
            .map(|range| {
                let first_target = range.start as u32;
                IndexShard::build(&targets[range], first_target, scheme, kmer_length)
            })
            .collect::<Result<Vec<_>>>()?;

        Self::from_shards(targets, scheme, kmer_length, hamming_tolerance, shards)
    }

    pub fn from_shards(
        targets: &[Sequence],
        scheme: &ReductionScheme,
        kmer_length: usize,
        hamming_tolerance: u8,
        shards: Vec<IndexShard>,
    ) -> Result<Self> {
        if hamming_tolerance > 1 {
            bail!("hamming tolerance above 1 is not supported");
        }
        // an empty database builds no shards, so the table parameters
        // still need a check here
        table_size(scheme, kmer_length)?;

        Ok(Self {
            scheme: scheme.clone(),
            kmer_length,
            hamming_tolerance,
            shards,
            total_residues: targets.iter().map(|t| t.length).sum(),
            num_targets: targets.len(),
        })
    }

    pub fn scheme(&self) -> &ReductionScheme {
        &self.scheme
    }

    pub fn kmer_length(&self) -> usize {
        self.kmer_length
    }

    /// Finds all seeds for a reduced query.
    ///
    /// Probes every query k-mer (plus its single-substitution
    /// neighborhood when the Hamming tolerance is 1) against each
    /// shard in shard order, then deduplicates per (target, diagonal),
    /// keeping the leftmost seed on each diagonal. An empty result is
    /// an expected outcome, not an error.
    pub fn find_seeds(&self, query: &ReducedSequence) -> Vec<Seed> {
        let k = self.kmer_length;
        let num_groups = self.scheme.num_groups as usize;
        let mut seeds: Vec<Seed> = Vec::new();

        if query.length() < k {
            return seeds;
        }

        let mut codes: Vec<usize> = Vec::new();
        for query_start in 1..=(query.length() - k + 1) {
            let window = &query.groups[query_start..query_start + k];
            let code = encode_kmer(window, num_groups);

            codes.clear();
            codes.push(code);
            if self.hamming_tolerance == 1 {
                neighbor_codes(window, num_groups, &mut codes);
            }

            for shard in &self.shards {
                for &probe in codes.iter() {
                    for kmer_position in shard.positions(probe) {
                        seeds.push(Seed {
                            target: kmer_position.target,
                            query_start,
                            target_start: kmer_position.position as usize,
                            length: k,
                        });
                    }
                }
            }
        }

        // keep one seed per (target, diagonal): the leftmost
        seeds.sort_by_key(|s| (s.target, s.diagonal(), s.query_start));
        seeds.dedup_by_key(|s| (s.target, s.diagonal()));
        seeds.sort_by_key(|s| (s.target, s.query_start, s.target_start));

        seeds
    }
}

/// Appends the codes of every k-mer within Hamming distance 1 of
/// `window` (the exact code excluded).
fn neighbor_codes(window: &[u8], num_groups: usize, codes: &mut Vec<usize>) {
    let exact = encode_kmer(window, num_groups);
    let k = window.len();

    let mut place: usize = 1;
    for position in (0..k).rev() {
        let original = window[position] as usize;
        let zeroed = exact - original * place;
        for group in 0..num_groups {
            if group != original {
                codes.push(zeroed + group * place);
            }
        }
        place *= num_groups;
    }
}

/// The contiguous target ranges covered by each shard, in shard order.
pub fn shard_ranges(num_targets: usize) -> Vec<std::ops::Range<usize>> {
    (0..num_targets)
        .step_by(TARGETS_PER_SHARD.max(1))
        .map(|start| start..(start + TARGETS_PER_SHARD).min(num_targets))
        .collect()
}
