use crate::align::PairwiseAlignment;

use std::cmp::Ordering;

#[derive(Clone, Debug)]
pub struct FilterConfig {
    /// Hits with an E-value above this are dropped.
    pub max_evalue: f64,
    /// Highest tolerated fraction of query overlap between two kept
    /// hits, measured against the shorter of the two query spans.
    pub max_query_overlap: f64,
    /// Hard cap on the number of hits reported per query.
    pub max_hits: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_evalue: 10.0,
            max_query_overlap: 0.5,
            max_hits: 300,
        }
    }
}

/// Orders hits for reporting: higher scores first, ties broken by
/// target name so equal-scoring hits always land in the same order.
fn hit_order(a: &PairwiseAlignment, b: &PairwiseAlignment) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| a.target_name.cmp(&b.target_name))
}

/// Ranks hits and thins them down to a reportable set.
///
/// Hits above the E-value cutoff are removed first. The survivors are
/// sorted with [`hit_order`] and accepted greedily: a hit is kept only
/// if its query-interval overlap with every previously kept hit stays
/// within the configured fraction, so a strong hit shadows weaker hits
/// to the same stretch of the query while hits to distinct query
/// regions pass through. At most `max_hits` hits survive.
pub fn filter_hits(
    mut hits: Vec<PairwiseAlignment>,
    config: &FilterConfig,
) -> Vec<PairwiseAlignment> {
    hits.retain(|hit| hit.e_value <= config.max_evalue);
    hits.sort_by(hit_order);

    let mut kept: Vec<PairwiseAlignment> = Vec::with_capacity(hits.len().min(config.max_hits));
    for hit in hits {
        if kept.len() >= config.max_hits {
            break;
        }

        let shadowed = kept.iter().any(|other| {
            let overlap = hit.query_overlap(other);
            let shorter = hit.query_span().min(other.query_span());
            overlap as f64 > config.max_query_overlap * shorter as f64
        });

        if !shadowed {
            kept.push(hit);
        }
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::AlignOp;

    fn hit(target_name: &str, query_start: usize, query_end: usize, score: i32) -> PairwiseAlignment {
        let span = (query_end - query_start + 1) as u32;
        PairwiseAlignment {
            query_name: "q".to_string(),
            target_name: target_name.to_string(),
            query_start,
            query_end,
            target_start: 1,
            target_end: query_end - query_start + 1,
            ops: vec![AlignOp::Match(span)],
            score,
            bits: score as f64 * 0.385,
            e_value: 1e-6,
            gap_opens: 0,
        }
    }

    #[test]
    fn test_evalue_cutoff() {
        let mut weak = hit("t1", 1, 50, 20);
        weak.e_value = 25.0;
        let strong = hit("t2", 1, 50, 80);

        let kept = filter_hits(vec![weak, strong], &FilterConfig::default());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].target_name, "t2");
    }

    #[test]
    fn test_overlapping_weaker_hit_is_shadowed() {
        let strong = hit("t1", 1, 100, 200);
        let weaker_same_region = hit("t2", 10, 90, 50);
        let distinct_region = hit("t3", 150, 220, 40);

        let kept = filter_hits(
            vec![weaker_same_region, distinct_region, strong],
            &FilterConfig::default(),
        );
        let names: Vec<&str> = kept.iter().map(|h| h.target_name.as_str()).collect();
        assert_eq!(names, vec!["t1", "t3"]);
    }

    #[test]
    fn test_partial_overlap_within_tolerance_is_kept() {
        // spans 1..=100 and 81..=180 overlap by 20 of 100 columns
        let first = hit("t1", 1, 100, 200);
        let second = hit("t2", 81, 180, 150);

        let kept = filter_hits(vec![second, first], &FilterConfig::default());
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_sorted_by_score_then_target_name() {
        let kept = filter_hits(
            vec![
                hit("t_b", 1, 50, 60),
                hit("t_a", 100, 150, 60),
                hit("t_c", 200, 250, 90),
            ],
            &FilterConfig::default(),
        );
        let names: Vec<&str> = kept.iter().map(|h| h.target_name.as_str()).collect();
        assert_eq!(names, vec!["t_c", "t_a", "t_b"]);
    }

    #[test]
    fn test_max_hits_truncates() {
        let hits: Vec<PairwiseAlignment> = (0..10)
            .map(|i| hit(&format!("t{i}"), 1 + i * 100, 50 + i * 100, 100 - i as i32))
            .collect();

        let config = FilterConfig {
            max_hits: 3,
            ..FilterConfig::default()
        };
        let kept = filter_hits(hits, &config);
        assert_eq!(kept.len(), 3);
        assert_eq!(kept[0].target_name, "t0");
    }
}
