use std::sync::Arc;

use indexmap::IndexMap;

use librivet::align::PairwiseAlignment;
use librivet::msa::Msa;
use librivet::structs::Sequence;

use super::TargetNotFoundError;

pub trait AssembleStep: dyn_clone::DynClone {
    fn run(
        &mut self,
        query: &Sequence,
        hits: &[PairwiseAlignment],
        targets: &[Sequence],
    ) -> anyhow::Result<Msa>;
}

dyn_clone::clone_trait_object!(AssembleStep);

/// Builds the query-anchored MSA from the filtered hits.
#[derive(Clone)]
pub struct QueryAnchoredAssembleStep {
    target_indices: Arc<IndexMap<String, usize>>,
}

impl QueryAnchoredAssembleStep {
    pub fn new(targets: &[Sequence]) -> Box<Self> {
        let target_indices = targets
            .iter()
            .enumerate()
            .map(|(idx, target)| (target.name.clone(), idx))
            .collect();

        Box::new(Self {
            target_indices: Arc::new(target_indices),
        })
    }
}

impl AssembleStep for QueryAnchoredAssembleStep {
    fn run(
        &mut self,
        query: &Sequence,
        hits: &[PairwiseAlignment],
        targets: &[Sequence],
    ) -> anyhow::Result<Msa> {
        let pairs = hits
            .iter()
            .map(|hit| {
                let target_idx =
                    self.target_indices
                        .get(&hit.target_name)
                        .ok_or(TargetNotFoundError {
                            target_name: hit.target_name.clone(),
                        })?;
                Ok((hit, &targets[*target_idx]))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Msa::assemble(query, pairs)
    }
}
