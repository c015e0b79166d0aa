use librivet::align::PairwiseAlignment;
use librivet::score::{bit_score, e_value, KarlinParams};
use librivet::search::{extend_seeds, ExtendParams, Seed};
use librivet::structs::Sequence;

pub trait ExtendStep: dyn_clone::DynClone {
    fn run(
        &mut self,
        query: &Sequence,
        targets: &[Sequence],
        seeds: &[Seed],
    ) -> Vec<PairwiseAlignment>;
}

dyn_clone::clone_trait_object!(ExtendStep);

/// Extends seeds with the x-drop machinery and attaches names and
/// alignment statistics to the survivors.
#[derive(Clone)]
pub struct XDropExtendStep {
    params: ExtendParams,
    karlin: KarlinParams,
    /// Residue count used for the E-value search space. Usually the
    /// database total, but can be overridden from the command line.
    database_residues: usize,
}

impl XDropExtendStep {
    pub fn new(params: ExtendParams, karlin: KarlinParams, database_residues: usize) -> Box<Self> {
        Box::new(Self {
            params,
            karlin,
            database_residues,
        })
    }
}

impl ExtendStep for XDropExtendStep {
    fn run(
        &mut self,
        query: &Sequence,
        targets: &[Sequence],
        seeds: &[Seed],
    ) -> Vec<PairwiseAlignment> {
        let search_space = (query.length * self.database_residues) as f64;

        extend_seeds(query, targets, seeds, &self.params)
            .into_iter()
            .map(|candidate| {
                let bits = bit_score(candidate.score, &self.karlin);
                PairwiseAlignment {
                    query_name: query.name.clone(),
                    target_name: targets[candidate.target as usize].name.clone(),
                    query_start: candidate.query_start,
                    query_end: candidate.query_end,
                    target_start: candidate.target_start,
                    target_end: candidate.target_end,
                    ops: candidate.ops,
                    score: candidate.score,
                    bits,
                    e_value: e_value(bits, search_space),
                    gap_opens: candidate.gap_opens,
                }
            })
            .collect()
    }
}
