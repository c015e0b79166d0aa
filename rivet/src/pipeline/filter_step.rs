use librivet::align::PairwiseAlignment;
use librivet::filter::{filter_hits, FilterConfig};

pub trait FilterStep: dyn_clone::DynClone {
    fn run(&mut self, hits: Vec<PairwiseAlignment>) -> Vec<PairwiseAlignment>;
}

dyn_clone::clone_trait_object!(FilterStep);

/// Applies the E-value cutoff, overlap suppression, and hit cap.
#[derive(Clone)]
pub struct ThresholdFilterStep {
    config: FilterConfig,
}

impl ThresholdFilterStep {
    pub fn new(config: FilterConfig) -> Box<Self> {
        Box::new(Self { config })
    }
}

impl FilterStep for ThresholdFilterStep {
    fn run(&mut self, hits: Vec<PairwiseAlignment>) -> Vec<PairwiseAlignment> {
        filter_hits(hits, &self.config)
    }
}
