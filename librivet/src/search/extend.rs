use crate::align::{coalesce_ops, AlignOp};
use crate::score::{substitution_score, GapPenalties};
use crate::structs::Sequence;

use super::Seed;

/// Sentinel for unreachable DP cells. Deep enough below any reachable
/// score that adding a substitution score cannot bring it back.
const NEG: i32 = i32::MIN / 4;

const FROM_M: u8 = 0b00;
const FROM_X: u8 = 0b01;
const FROM_Y: u8 = 0b10;
const X_EXTENDS: u8 = 0b0100;
const Y_EXTENDS: u8 = 0b1000;

#[derive(Clone, Debug)]
pub struct ExtendParams {
    pub penalties: GapPenalties,
    /// Both the ungapped and the gapped extensions stop once the
    /// running score falls this far below the best score seen.
    pub x_drop: i32,
    /// Seeds whose ungapped extension scores below this are discarded
    /// before the gapped stage.
    pub min_ungapped_score: i32,
}

impl Default for ExtendParams {
    fn default() -> Self {
        Self {
            penalties: GapPenalties::default(),
            x_drop: 20,
            min_ungapped_score: 15,
        }
    }
}

/// A scored local alignment between a query and one target, before
/// names and statistics are attached. Coordinates are 1-based and
/// inclusive.
#[derive(Clone, Debug)]
pub struct CandidateAlignment {
    pub target: u32,
    pub query_start: usize,
    pub query_end: usize,
    pub target_start: usize,
    pub target_end: usize,
    pub ops: Vec<AlignOp>,
    pub score: i32,
    pub gap_opens: usize,
}

impl CandidateAlignment {
    pub fn query_span(&self) -> usize {
        self.query_end - self.query_start + 1
    }
}

/// The result of a one-sided gapped extension over unpadded digital
/// slices. Consumed counts say how far past the anchor the extension
/// reached on each sequence.
struct Extension {
    score: i32,
    query_consumed: usize,
    target_consumed: usize,
    ops: Vec<AlignOp>,
}

/// Walks the diagonal from the start of both slices, accumulating
/// substitution scores, and stops once the running score drops more
/// than `x_drop` below the best prefix. Returns the best prefix score
/// and its length.
fn ungapped_extend(query: &[u8], target: &[u8], x_drop: i32) -> (i32, usize) {
    let mut running = 0i32;
    let mut best = 0i32;
    let mut best_length = 0usize;

    for (step, (&q, &t)) in query.iter().zip(target.iter()).enumerate() {
        running += substitution_score(q, t);
        if running > best {
            best = running;
            best_length = step + 1;
        } else if running < best - x_drop {
            break;
        }
    }

    (best, best_length)
}

/// Gapped x-drop extension from the origin of two unpadded digital
/// slices.
///
/// Affine-gap DP over three states: M ends in a substitution, X ends
/// in a gap in the target (a query residue consumed alone), Y ends in
/// a gap in the query. Rows are processed with a live band that starts
/// at the previous row's first live column and ends once a cell dies
/// past the previous row's last live column, so the work stays
/// proportional to the band rather than the full matrix. Ties prefer
/// M over X over Y and gap extension over gap open, which keeps the
/// traceback deterministic and the gap count minimal.
fn xdrop_extend(query: &[u8], target: &[u8], penalties: &GapPenalties, x_drop: i32) -> Extension {
    let tlen = target.len();

    let mut prev_m = vec![NEG; tlen + 1];
    let mut prev_x = vec![NEG; tlen + 1];
    let mut prev_y = vec![NEG; tlen + 1];
    let mut cur_m = vec![NEG; tlen + 1];
    let mut cur_x = vec![NEG; tlen + 1];
    let mut cur_y = vec![NEG; tlen + 1];

    // backpointers per row: (first column computed, packed bytes)
    let mut rows: Vec<(usize, Vec<u8>)> = Vec::new();

    let mut best = 0i32;
    let mut best_i = 0usize;
    let mut best_j = 0usize;

    // row 0 holds the origin and a single run of gaps in the query
    let mut row_zero_bp: Vec<u8> = vec![0];
    prev_m[0] = 0;
    let mut prev_first_live = 0usize;
    let mut prev_last_live = 0usize;
    let mut guard_lo = 0usize;
    let mut guard_hi = 0usize;
    for j in 1..=tlen {
        let open_cost = penalties.open + penalties.extend;
        let y = if j == 1 {
            -open_cost
        } else {
            prev_y[j - 1] - penalties.extend
        };
        if y < best - x_drop {
            break;
        }
        prev_y[j] = y;
        row_zero_bp.push(if j == 1 { 0 } else { Y_EXTENDS });
        prev_last_live = j;
        guard_hi = j;
    }
    rows.push((0, row_zero_bp));

    for i in 1..=query.len() {
        let qc = query[i - 1];
        let row_start = prev_first_live;

        let mut left_m = NEG;
        let mut left_y = NEG;
        let mut first_live: Option<usize> = None;
        let mut last_live = row_start;
        let mut last_computed = row_start;
        let mut bp_row: Vec<u8> = Vec::new();

        for j in row_start..=tlen {
            last_computed = j;
            let mut bp: u8 = 0;

            let prev_at = |v: &[i32], column: usize| -> i32 {
                if column >= guard_lo && column <= guard_hi {
                    v[column]
                } else {
                    NEG
                }
            };

            let m = if j >= 1 {
                let diag_m = prev_at(&prev_m, j - 1);
                let diag_x = prev_at(&prev_x, j - 1);
                let diag_y = prev_at(&prev_y, j - 1);
                let (source, diag_best) = if diag_m >= diag_x && diag_m >= diag_y {
                    (FROM_M, diag_m)
                } else if diag_x >= diag_y {
                    (FROM_X, diag_x)
                } else {
                    (FROM_Y, diag_y)
                };
                if diag_best <= NEG {
                    NEG
                } else {
                    bp |= source;
                    diag_best + substitution_score(qc, target[j - 1])
                }
            } else {
                NEG
            };

            let up_x = prev_at(&prev_x, j) - penalties.extend;
            let up_m = prev_at(&prev_m, j) - penalties.open - penalties.extend;
            let x = if up_x >= up_m {
                bp |= X_EXTENDS;
                up_x
            } else {
                up_m
            };

            let from_y = left_y - penalties.extend;
            let from_m = left_m - penalties.open - penalties.extend;
            let y = if from_y >= from_m {
                bp |= Y_EXTENDS;
                from_y
            } else {
                from_m
            };

            if m.max(x).max(y) < best - x_drop {
                cur_m[j] = NEG;
                cur_x[j] = NEG;
                cur_y[j] = NEG;
                left_m = NEG;
                left_y = NEG;
                bp_row.push(0);
                if j > prev_last_live {
                    break;
                }
                continue;
            }

            if m > best {
                best = m;
                best_i = i;
                best_j = j;
            }

            cur_m[j] = m;
            cur_x[j] = x;
            cur_y[j] = y;
            left_m = m;
            left_y = y;
            bp_row.push(bp);
            first_live.get_or_insert(j);
            last_live = j;
        }

        rows.push((row_start, bp_row));

        let Some(first_live) = first_live else {
            break;
        };

        std::mem::swap(&mut prev_m, &mut cur_m);
        std::mem::swap(&mut prev_x, &mut cur_x);
        std::mem::swap(&mut prev_y, &mut cur_y);
        prev_first_live = first_live;
        prev_last_live = last_live;
        guard_lo = row_start;
        guard_hi = last_computed;
    }

    // traceback from the best M cell to the origin
    let mut ops: Vec<AlignOp> = Vec::new();
    let push = |ops: &mut Vec<AlignOp>, op: AlignOp| match (ops.last_mut(), &op) {
        (Some(AlignOp::Match(run)), AlignOp::Match(_)) => *run += 1,
        (Some(AlignOp::InsertQuery(run)), AlignOp::InsertQuery(_)) => *run += 1,
        (Some(AlignOp::InsertTarget(run)), AlignOp::InsertTarget(_)) => *run += 1,
        _ => ops.push(op),
    };

    let mut i = best_i;
    let mut j = best_j;
    let mut state = FROM_M;
    while i > 0 || j > 0 {
        let (row_lo, bytes) = &rows[i];
        let bp = bytes[j - row_lo];
        match state {
            FROM_X => {
                push(&mut ops, AlignOp::InsertQuery(1));
                state = if bp & X_EXTENDS != 0 { FROM_X } else { FROM_M };
                i -= 1;
            }
            FROM_Y => {
                push(&mut ops, AlignOp::InsertTarget(1));
                state = if bp & Y_EXTENDS != 0 { FROM_Y } else { FROM_M };
                j -= 1;
            }
            _ => {
                push(&mut ops, AlignOp::Match(1));
                state = bp & 0b11;
                i -= 1;
                j -= 1;
            }
        }
    }
    ops.reverse();

    Extension {
        score: best,
        query_consumed: best_i,
        target_consumed: best_j,
        ops,
    }
}

/// Extends one seed into a gapped candidate alignment, or discards it.
///
/// The seed anchor is scored as-is, ungapped extensions run outward on
/// both sides, and the seed is dropped when the combined ungapped
/// score misses `min_ungapped_score`. Surviving seeds get a gapped
/// x-drop extension on each side of the anchor, and the three op runs
/// are stitched together around the anchor.
fn seed_in_bounds(seed: &Seed, query: &Sequence, target: &Sequence) -> bool {
    seed.length >= 1
        && seed.query_start >= 1
        && seed.target_start >= 1
        && seed.query_start + seed.length - 1 <= query.length
        && seed.target_start + seed.length - 1 <= target.length
}

pub fn extend_seed(
    query: &Sequence,
    target: &Sequence,
    seed: &Seed,
    params: &ExtendParams,
) -> Option<CandidateAlignment> {
    let qd = &query.digital_bytes;
    let td = &target.digital_bytes;
    let k = seed.length;

    let mut anchor_score = 0i32;
    for offset in 0..k {
        anchor_score += substitution_score(
            qd[seed.query_start + offset],
            td[seed.target_start + offset],
        );
    }

    let right_query = &qd[seed.query_start + k..];
    let right_target = &td[seed.target_start + k..];
    let left_query: Vec<u8> = qd[1..seed.query_start].iter().rev().copied().collect();
    let left_target: Vec<u8> = td[1..seed.target_start].iter().rev().copied().collect();

    let (right_ungapped, _) = ungapped_extend(right_query, right_target, params.x_drop);
    let (left_ungapped, _) = ungapped_extend(&left_query, &left_target, params.x_drop);
    if anchor_score + left_ungapped + right_ungapped < params.min_ungapped_score {
        return None;
    }

    let right = xdrop_extend(right_query, right_target, &params.penalties, params.x_drop);
    let mut left = xdrop_extend(&left_query, &left_target, &params.penalties, params.x_drop);

    // the left extension ran over reversed slices, so its ops run
    // outward from the anchor and flip back with a single reverse
    left.ops.reverse();
    let mut ops = left.ops;
    ops.push(AlignOp::Match(k as u32));
    ops.extend(right.ops);
    let ops = coalesce_ops(ops);

    let gap_opens = ops
        .iter()
        .filter(|op| !matches!(op, AlignOp::Match(_)))
        .count();

    Some(CandidateAlignment {
        target: seed.target,
        query_start: seed.query_start - left.query_consumed,
        query_end: seed.query_start + k - 1 + right.query_consumed,
        target_start: seed.target_start - left.target_consumed,
        target_end: seed.target_start + k - 1 + right.target_consumed,
        ops,
        score: anchor_score + left.score + right.score,
        gap_opens,
    })
}

/// Extends every seed against its target and keeps the single best
/// candidate per target, breaking score ties toward the candidate that
/// starts earliest on the query.
pub fn extend_seeds(
    query: &Sequence,
    targets: &[Sequence],
    seeds: &[Seed],
    params: &ExtendParams,
) -> Vec<CandidateAlignment> {
    let mut best: Vec<CandidateAlignment> = Vec::new();

    for seed in seeds {
        // seeds from a stale seeds file can point past the target
        // collection or past either sequence's residues
        let Some(target) = targets.get(seed.target as usize) else {
            continue;
        };
        if !seed_in_bounds(seed, query, target) {
            continue;
        }
        let Some(candidate) = extend_seed(query, target, seed, params) else {
            continue;
        };

        match best.last_mut() {
            Some(current) if current.target == candidate.target => {
                if candidate.score > current.score
                    || (candidate.score == current.score
                        && candidate.query_start < current.query_start)
                {
                    *current = candidate;
                }
            }
            _ => best.push(candidate),
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::self_alignment_score;
    use anyhow::Result;

    fn anchor_seed(length: usize) -> Seed {
        Seed {
            target: 0,
            query_start: 1,
            target_start: 1,
            length,
        }
    }

    #[test]
    fn test_identical_sequences_full_span() -> Result<()> {
        let query = Sequence::named_from_utf8("q", b"MKVLATTREQWFDNAGHLKW")?;
        let target = Sequence::named_from_utf8("t", b"MKVLATTREQWFDNAGHLKW")?;
        let params = ExtendParams::default();

        let candidate = extend_seed(&query, &target, &anchor_seed(5), &params)
            .expect("identical sequences must survive the ungapped gate");

        assert_eq!(candidate.query_start, 1);
        assert_eq!(candidate.query_end, query.length);
        assert_eq!(candidate.target_start, 1);
        assert_eq!(candidate.target_end, target.length);
        assert_eq!(candidate.ops, vec![AlignOp::Match(query.length as u32)]);
        assert_eq!(candidate.gap_opens, 0);
        assert_eq!(
            candidate.score,
            self_alignment_score(&query.digital_bytes[1..])
        );
        Ok(())
    }

    #[test]
    fn test_left_extension_from_trailing_seed() -> Result<()> {
        let query = Sequence::named_from_utf8("q", b"MKVLATTREQWFDNAGHLKW")?;
        let target = Sequence::named_from_utf8("t", b"MKVLATTREQWFDNAGHLKW")?;
        let params = ExtendParams::default();

        let seed = Seed {
            target: 0,
            query_start: query.length - 4,
            target_start: target.length - 4,
            length: 5,
        };
        let candidate = extend_seed(&query, &target, &seed, &params)
            .expect("identical sequences must survive the ungapped gate");

        assert_eq!(candidate.query_start, 1);
        assert_eq!(candidate.query_end, query.length);
        assert_eq!(candidate.ops, vec![AlignOp::Match(query.length as u32)]);
        Ok(())
    }

    #[test]
    fn test_gap_in_query_is_recovered() -> Result<()> {
        // the target carries one extra residue after the anchor
        let query = Sequence::named_from_utf8("q", b"MKVLATTREQWFDN")?;
        let target = Sequence::named_from_utf8("t", b"MKVLATTGREQWFDN")?;
        let params = ExtendParams {
            min_ungapped_score: 0,
            ..ExtendParams::default()
        };

        let candidate = extend_seed(&query, &target, &anchor_seed(5), &params)
            .expect("seed should extend through the gap");

        assert_eq!(
            candidate.ops,
            vec![
                AlignOp::Match(7),
                AlignOp::InsertTarget(1),
                AlignOp::Match(7),
            ]
        );
        assert_eq!(candidate.gap_opens, 1);
        assert_eq!(candidate.query_end, query.length);
        assert_eq!(candidate.target_end, target.length);
        Ok(())
    }

    #[test]
    fn test_weak_seed_is_discarded() -> Result<()> {
        // one chance match inside otherwise unrelated sequences
        let query = Sequence::named_from_utf8("q", b"GGGGGGGGGG")?;
        let target = Sequence::named_from_utf8("t", b"GGGGGWWWWW")?;
        let params = ExtendParams {
            min_ungapped_score: 40,
            ..ExtendParams::default()
        };

        assert!(extend_seed(&query, &target, &anchor_seed(5), &params).is_none());
        Ok(())
    }

    #[test]
    fn test_ungapped_extend_stops_at_x_drop() {
        // five matches then a wall of mismatches
        let query = b"WWWWWAAAAAAAA";
        let target = b"WWWWWPPPPPPPP";
        let q = Sequence::from_utf8(query).unwrap();
        let t = Sequence::from_utf8(target).unwrap();

        let (score, length) = ungapped_extend(&q.digital_bytes[1..], &t.digital_bytes[1..], 20);
        assert_eq!(length, 5);
        assert_eq!(score, 5 * 11);
    }

    #[test]
    fn test_best_per_target_collapse() -> Result<()> {
        let query = Sequence::named_from_utf8("q", b"MKVLATTREQWFDNAGHLKW")?;
        let targets = vec![Sequence::named_from_utf8("t0", b"MKVLATTREQWFDNAGHLKW")?];

        // two seeds on the same target both extend to the same full
        // alignment, which must collapse to a single candidate
        let seeds = vec![
            Seed {
                target: 0,
                query_start: 1,
                target_start: 1,
                length: 5,
            },
            Seed {
                target: 0,
                query_start: 8,
                target_start: 8,
                length: 5,
            },
        ];
        let candidates = extend_seeds(&query, &targets, &seeds, &ExtendParams::default());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].query_span(), query.length);
        Ok(())
    }

    #[test]
    fn test_out_of_bounds_seeds_are_skipped() -> Result<()> {
        let query = Sequence::named_from_utf8("q", b"MKVLATTREQ")?;
        let targets = vec![Sequence::named_from_utf8("t0", b"MKVLATTREQWFDNAGHLKW")?];

        // positions from a seeds file built against different
        // sequences must be dropped, not indexed
        let seeds = vec![
            Seed {
                target: 0,
                query_start: 50,
                target_start: 1,
                length: 5,
            },
            Seed {
                target: 0,
                query_start: 1,
                target_start: 18,
                length: 5,
            },
            Seed {
                target: 0,
                query_start: 0,
                target_start: 1,
                length: 5,
            },
        ];
        let candidates = extend_seeds(&query, &targets, &seeds, &ExtendParams::default());
        assert!(candidates.is_empty());
        Ok(())
    }
}
