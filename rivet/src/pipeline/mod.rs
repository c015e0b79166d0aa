mod seed_step;
pub use seed_step::*;

mod extend_step;
pub use extend_step::*;

mod filter_step;
pub use filter_step::*;

mod assemble_step;
pub use assemble_step::*;

mod output_step;
pub use output_step::*;

use std::cell::RefCell;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use thiserror::Error;
use thread_local::ThreadLocal;

use librivet::align::PairwiseAlignment;
use librivet::structs::Sequence;

use crate::stats::{CountedValue, Stats, ThreadedTimed};

#[derive(Error, Debug)]
#[error("no target with name: {target_name}")]
pub struct TargetNotFoundError {
    pub target_name: String,
}

#[derive(Clone)]
pub struct Pipeline {
    pub seed: Box<dyn SeedStep + Send + Sync>,
    pub extend: Box<dyn ExtendStep + Send + Sync>,
    pub filter: Box<dyn FilterStep + Send + Sync>,
    pub assemble: Box<dyn AssembleStep + Send + Sync>,
    pub output: Arc<Mutex<OutputStep>>,
    pub stats: Stats,
}

impl Pipeline {
    fn run(
        &mut self,
        query: &Sequence,
        targets: &[Sequence],
    ) -> anyhow::Result<Vec<PairwiseAlignment>> {
        let now = Instant::now();
        let seeds = self.seed.run(query)?;
        self.stats.add_count(CountedValue::Seeds, seeds.len());
        self.stats
            .add_threaded_time(ThreadedTimed::Seeding, now.elapsed());

        let now = Instant::now();
        let candidates = self.extend.run(query, targets, &seeds);
        self.stats
            .add_count(CountedValue::Candidates, candidates.len());
        self.stats
            .add_threaded_time(ThreadedTimed::Extension, now.elapsed());

        let now = Instant::now();
        let hits = self.filter.run(candidates);
        self.stats.add_count(CountedValue::Hits, hits.len());
        self.stats
            .add_threaded_time(ThreadedTimed::Filtering, now.elapsed());

        let now = Instant::now();
        let msa = self.assemble.run(query, &hits, targets)?;
        self.stats
            .add_threaded_time(ThreadedTimed::Assembly, now.elapsed());

        let now = Instant::now();
        match self.output.lock() {
            Ok(mut guard) => {
                self.stats
                    .add_threaded_time(ThreadedTimed::OutputMutex, now.elapsed());
                let now = Instant::now();
                guard.write(&hits, &msa)?;
                self.stats
                    .add_threaded_time(ThreadedTimed::OutputWrite, now.elapsed());
            }
            Err(_) => panic!("output mutex was poisoned"),
        };

        Ok(hits)
    }
}

/// Drives the pipeline over every query in parallel. Each worker
/// thread runs its own clone of the pipeline; the stats counters are
/// shared across clones. A query that fails is reported and skipped so
/// the rest of the search keeps going.
pub fn run_pipeline(queries: &[Sequence], targets: &[Sequence], pipeline: &mut Pipeline) {
    let thread_local_pipeline: ThreadLocal<RefCell<Pipeline>> = ThreadLocal::new();

    queries.par_iter().panic_fuse().for_each(|query| {
        let now = Instant::now();

        let mut pipeline = thread_local_pipeline
            .get_or(|| RefCell::new(pipeline.clone()))
            .borrow_mut();

        if let Err(err) = pipeline.run(query, targets) {
            eprintln!("skipping query {}: {err:#}", query.name);
            pipeline.stats.increment_count(CountedValue::QueriesFailed);
        }

        pipeline
            .stats
            .add_threaded_time(ThreadedTimed::Total, now.elapsed())
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    use anyhow::Result;

    use librivet::filter::FilterConfig;
    use librivet::reduce::MURPHY_8;
    use librivet::score::KarlinParams;
    use librivet::search::{ExtendParams, KmerIndex};

    fn test_pipeline(targets: &[Sequence]) -> Result<Pipeline> {
        let index = KmerIndex::build(targets, &MURPHY_8, 5, 1)?;
        let database_residues = targets.iter().map(|t| t.length).sum();

        Ok(Pipeline {
            seed: IndexSeedStep::new(Arc::new(index)),
            extend: XDropExtendStep::new(
                ExtendParams::default(),
                KarlinParams::default(),
                database_residues,
            ),
            filter: ThresholdFilterStep::new(FilterConfig::default()),
            assemble: QueryAnchoredAssembleStep::new(targets),
            output: Arc::new(Mutex::new(OutputStep::sink()?)),
            stats: Stats::default(),
        })
    }

    #[test]
    fn test_exact_copy_target_is_found_full_span() -> Result<()> {
        let query = Sequence::named_from_utf8("q1", b"MKVLATTREQWFDNAGHLKWECRIPSTY")?;
        let targets = vec![
            Sequence::named_from_utf8("t1", b"MKVLATTREQWFDNAGHLKWECRIPSTY")?,
            Sequence::named_from_utf8("t2", b"PPPPGGGGPPPPGGGGPPPPGGGG")?,
        ];

        let mut pipeline = test_pipeline(&targets)?;
        let hits = pipeline.run(&query, &targets)?;

        assert_eq!(hits.len(), 1);
        let hit = &hits[0];
        assert_eq!(hit.target_name, "t1");
        assert_eq!(hit.query_start, 1);
        assert_eq!(hit.query_end, query.length);
        assert_eq!(hit.target_start, 1);
        assert_eq!(hit.target_end, query.length);
        assert_eq!(hit.gap_opens, 0);
        assert!(hit.e_value < 1e-6);
        Ok(())
    }

    #[test]
    fn test_no_shared_kmers_yields_no_hits() -> Result<()> {
        let query = Sequence::named_from_utf8("q1", b"WWWWWWWWWWWWWWWWWWWW")?;
        let targets = vec![Sequence::named_from_utf8("t1", b"PPPPPPPPPPPPPPPPPPPP")?];

        let mut pipeline = test_pipeline(&targets)?;
        let hits = pipeline.run(&query, &targets)?;
        assert!(hits.is_empty());
        Ok(())
    }

    #[test]
    fn test_assembled_row_matches_exact_copy_target() -> Result<()> {
        let query = Sequence::named_from_utf8("q1", b"MKVLATTREQWFDNAGHLKWECRIPSTY")?;
        let targets = vec![Sequence::named_from_utf8(
            "t1",
            b"MKVLATTREQWFDNAGHLKWECRIPSTY",
        )?];

        let mut pipeline = test_pipeline(&targets)?;
        let hits = pipeline.run(&query, &targets)?;
        let msa = pipeline.assemble.run(&query, &hits, &targets)?;

        assert_eq!(msa.num_sequences(), 2);
        assert_eq!(msa.rows[0].residues, query.utf8_bytes[1..].to_vec());
        Ok(())
    }

    #[test]
    fn test_pipeline_is_deterministic() -> Result<()> {
        let query = Sequence::named_from_utf8("q1", b"MKVLATTREQWFDNAGHLKWECRIPSTY")?;
        let targets = vec![
            Sequence::named_from_utf8("t1", b"MKVLATTREQWFDNAGHLKW")?,
            Sequence::named_from_utf8("t2", b"ATTREQWFDNAGHLKWECRIPSTY")?,
        ];

        let mut pipeline = test_pipeline(&targets)?;
        let first = pipeline.run(&query, &targets)?;
        let second = pipeline.run(&query, &targets)?;

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.target_name, b.target_name);
            assert_eq!(a.score, b.score);
            assert_eq!(a.query_start, b.query_start);
            assert_eq!(a.query_end, b.query_end);
            assert_eq!(a.ops, b.ops);
        }
        Ok(())
    }

    #[test]
    fn test_run_pipeline_covers_all_queries() -> Result<()> {
        let queries = vec![
            Sequence::named_from_utf8("q1", b"MKVLATTREQWFDNAGHLKW")?,
            Sequence::named_from_utf8("q2", b"ECRIPSTYMKVLATTREQWF")?,
        ];
        let targets = vec![
            Sequence::named_from_utf8("t1", b"MKVLATTREQWFDNAGHLKW")?,
            Sequence::named_from_utf8("t2", b"ECRIPSTYMKVLATTREQWF")?,
        ];

        let mut pipeline = test_pipeline(&targets)?;
        run_pipeline(&queries, &targets, &mut pipeline);
        Ok(())
    }
}
