use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use librivet::search::{KmerIndex, Seed};
use librivet::structs::Sequence;

pub type SeedMap = HashMap<String, Vec<Seed>>;

pub trait SeedStep: dyn_clone::DynClone {
    fn run(&mut self, query: &Sequence) -> anyhow::Result<Vec<Seed>>;
}

dyn_clone::clone_trait_object!(SeedStep);

/// Finds seeds by probing the query against a shared k-mer index.
#[derive(Clone)]
pub struct IndexSeedStep {
    index: Arc<KmerIndex>,
}

impl IndexSeedStep {
    pub fn new(index: Arc<KmerIndex>) -> Box<Self> {
        Box::new(Self { index })
    }
}

impl SeedStep for IndexSeedStep {
    fn run(&mut self, query: &Sequence) -> anyhow::Result<Vec<Seed>> {
        let reduced = self
            .index
            .scheme()
            .reduce(query)
            .context("failed to reduce query sequence")?;

        Ok(self.index.find_seeds(&reduced))
    }
}

/// Serves seeds produced by an earlier run of the seed subcommand.
/// Only valid against the same target file the seeds were built from,
/// since seeds refer to targets by their position in that file.
#[derive(Clone)]
pub struct PrecomputedSeedStep {
    seeds: Arc<SeedMap>,
}

impl PrecomputedSeedStep {
    pub fn new(seeds_path: &Path) -> anyhow::Result<Box<Self>> {
        let seeds_string = std::fs::read_to_string(seeds_path).context(format!(
            "failed to open seeds file: {}",
            seeds_path.to_string_lossy()
        ))?;

        let seeds: SeedMap =
            serde_json::from_str(&seeds_string).context("failed to parse seeds file")?;

        Ok(Box::new(Self {
            seeds: Arc::new(seeds),
        }))
    }
}

impl SeedStep for PrecomputedSeedStep {
    fn run(&mut self, query: &Sequence) -> anyhow::Result<Vec<Seed>> {
        Ok(self.seeds.get(&query.name).cloned().unwrap_or_default())
    }
}
