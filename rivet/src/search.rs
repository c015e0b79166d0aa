use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::Context;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use thiserror::Error;

use librivet::filter::FilterConfig;
use librivet::reduce::ReductionScheme;
use librivet::score::{GapPenalties, KarlinParams};
use librivet::search::{shard_ranges, ExtendParams, IndexShard, KmerIndex};
use librivet::structs::Sequence;

use crate::args::{SchemeArgs, SearchArgs, SeedArgs};
use crate::pipeline::{
    run_pipeline, IndexSeedStep, OutputStep, Pipeline, PrecomputedSeedStep,
    QueryAnchoredAssembleStep, SeedMap, SeedStep, ThresholdFilterStep, XDropExtendStep,
};
use crate::stats::{SerialTimed, Stats};
use crate::util::{check_fasta_format, PathBufExt};

#[derive(Error, Debug)]
#[error("query sequence is empty: {name}")]
pub struct EmptyQueryError {
    pub name: String,
}

fn read_queries(args_path: &std::path::PathBuf) -> anyhow::Result<Vec<Sequence>> {
    check_fasta_format(args_path)?;
    let queries = Sequence::amino_from_fasta(args_path).context("failed to read query fasta")?;

    for query in &queries {
        if query.length == 0 {
            return Err(EmptyQueryError {
                name: query.name.clone(),
            }
            .into());
        }
    }

    Ok(queries)
}

fn read_targets(args_path: &std::path::PathBuf) -> anyhow::Result<Vec<Sequence>> {
    check_fasta_format(args_path)?;
    Sequence::amino_from_fasta(args_path).context("failed to read target fasta")
}

fn scheme_from_args(args: &SchemeArgs) -> anyhow::Result<ReductionScheme> {
    let mut scheme = ReductionScheme::by_name(&args.scheme)?;

    if let Some(kmer_length) = args.kmer_length {
        scheme.kmer_length = kmer_length;
    }
    if let Some(hamming_tolerance) = args.hamming_tolerance {
        scheme.hamming_tolerance = hamming_tolerance;
    }

    Ok(scheme)
}

/// Builds the index shards in parallel across the rayon pool, one
/// shard per contiguous slice of the target file.
fn build_index(targets: &[Sequence], scheme: &ReductionScheme) -> anyhow::Result<KmerIndex> {
    let shards = shard_ranges(targets.len())
        .into_par_iter()
        .map(|range| {
            let first_target = range.start as u32;
            IndexShard::build(&targets[range], first_target, scheme, scheme.kmer_length)
        })
        .collect::<anyhow::Result<Vec<IndexShard>>>()?;

    KmerIndex::from_shards(
        targets,
        scheme,
        scheme.kmer_length,
        scheme.hamming_tolerance,
        shards,
    )
}

pub fn search(args: &SearchArgs) -> anyhow::Result<()> {
    {
        // quickly make sure we can write the results
        args.output_args
            .tbl_results_path
            .open(args.common_args.allow_overwrite)?;
    }

    let total_timer = Instant::now();

    let queries = read_queries(&args.query_path)?;
    let targets = read_targets(&args.target_path)?;
    let scheme = scheme_from_args(&args.scheme_args)?;

    let mut stats = Stats::new(&queries, &targets);

    let now = Instant::now();
    let seed_step: Box<dyn SeedStep + Send + Sync> = match &args.seeds_path {
        Some(path) => PrecomputedSeedStep::new(path)?,
        None => IndexSeedStep::new(Arc::new(build_index(&targets, &scheme)?)),
    };
    stats.set_serial_time(SerialTimed::IndexBuild, now.elapsed());

    let database_residues = match args.rivet_args.target_database_residues {
        Some(residues) => residues,
        None => targets.iter().map(|t| t.length).sum(),
    };

    let extend_params = ExtendParams {
        penalties: GapPenalties {
            open: args.rivet_args.gap_open,
            extend: args.rivet_args.gap_extend,
        },
        x_drop: args.rivet_args.x_drop,
        min_ungapped_score: args.rivet_args.min_ungapped_score,
    };

    let filter_config = FilterConfig {
        max_evalue: args.output_args.e_value_threshold,
        max_query_overlap: args.rivet_args.max_query_overlap,
        max_hits: args.rivet_args.max_hits,
    };

    let mut pipeline = Pipeline {
        seed: seed_step,
        extend: XDropExtendStep::new(extend_params, KarlinParams::default(), database_residues),
        filter: ThresholdFilterStep::new(filter_config),
        assemble: QueryAnchoredAssembleStep::new(&targets),
        output: Arc::new(Mutex::new(OutputStep::new(&args.output_args)?)),
        stats: stats.clone(),
    };

    let now = Instant::now();
    run_pipeline(&queries, &targets, &mut pipeline);
    stats.set_serial_time(SerialTimed::Search, now.elapsed());
    stats.set_serial_time(SerialTimed::Total, total_timer.elapsed());

    if let Some(path) = &args.output_args.stats_results_path {
        let mut stats_writer = path.open(args.common_args.allow_overwrite)?;
        stats.write(&mut stats_writer)?;
    }

    Ok(())
}

pub fn seed(args: &SeedArgs) -> anyhow::Result<()> {
    let mut seeds_writer = args.seeds_path.open(args.common_args.allow_overwrite)?;

    let queries = read_queries(&args.query_path)?;
    let targets = read_targets(&args.target_path)?;
    let scheme = scheme_from_args(&args.scheme_args)?;

    let index = build_index(&targets, &scheme)?;

    let seed_map: SeedMap = queries
        .iter()
        .map(|query| {
            let reduced = scheme.reduce(query)?;
            Ok((query.name.clone(), index.find_seeds(&reduced)))
        })
        .collect::<anyhow::Result<SeedMap>>()?;

    serde_json::to_writer(&mut seeds_writer, &seed_map)
        .context("failed to write seeds to file")?;

    Ok(())
}
