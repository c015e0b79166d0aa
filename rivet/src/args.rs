use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Subcommand)]
pub enum SubCommands {
    #[command(about = "Run the entire rivet pipeline: seed, extend, filter, & assemble")]
    Search(SearchArgs),
    #[command(about = "Find reduced-alphabet k-mer seeds and write them to a file")]
    Seed(SeedArgs),
}

#[derive(Parser)]
#[command(name = "rivet")]
#[command(
    about = "Using a reduced-alphabet k-mer index to find alignment seeds, search a protein database and assemble query-anchored MSAs from the hits"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: SubCommands,
}

#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// The number of threads that rivet will use
    #[arg(
        short = 't',
        long = "threads",
        default_value_t = 8usize,
        value_name = "n"
    )]
    pub num_threads: usize,

    /// Allow rivet to overwrite files
    #[arg(long = "allow-overwrite", default_value_t = false)]
    pub allow_overwrite: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SchemeArgs {
    /// The alphabet reduction scheme: murphy4, murphy8, murphy10, or murphy15
    #[arg(short = 'r', long = "scheme", default_value = "murphy8")]
    pub scheme: String,

    /// Override the scheme's default k-mer length
    #[arg(short = 'k', long = "kmer", value_name = "N")]
    pub kmer_length: Option<usize>,

    /// Override the scheme's default seed Hamming tolerance (0 or 1)
    #[arg(long = "hamming", value_name = "N")]
    pub hamming_tolerance: Option<u8>,
}

#[derive(Args, Debug, Clone)]
pub struct RivetArgs {
    /// Override the target database residue count used for E-value calculation
    #[arg(short = 'Z', value_name = "N")]
    pub target_database_residues: Option<usize>,

    /// Gap open penalty
    #[arg(long = "gap-open", default_value_t = 11, value_name = "N")]
    pub gap_open: i32,

    /// Gap extend penalty
    #[arg(long = "gap-extend", default_value_t = 1, value_name = "N")]
    pub gap_extend: i32,

    /// Terminate extension once the running score drops this far below the best score
    #[arg(short = 'X', long = "x-drop", default_value_t = 20, value_name = "N")]
    pub x_drop: i32,

    /// Discard seeds whose ungapped extension scores below this threshold
    #[arg(long = "min-ungapped-score", default_value_t = 15, value_name = "N")]
    pub min_ungapped_score: i32,

    /// The highest tolerated fraction of query overlap between two reported hits
    #[arg(long = "max-overlap", default_value_t = 0.5, value_name = "F")]
    pub max_query_overlap: f64,

    /// The maximum number of hits reported per query
    #[arg(long = "max-hits", default_value_t = 300, value_name = "N")]
    pub max_hits: usize,
}

#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Only report hits with an E-value below this value
    #[arg(short = 'E', default_value_t = 10.0, value_name = "F")]
    pub e_value_threshold: f64,

    /// Where to place tabular output
    #[arg(
        short = 'T',
        long = "tab-output",
        default_value = "results.tbl",
        value_name = "path"
    )]
    pub tbl_results_path: PathBuf,

    /// The directory where per-query MSA files will be placed
    #[arg(short = 'O', long = "msa-dir", default_value = "msa/", value_name = "path")]
    pub msa_dir_path: PathBuf,

    /// Where to place stats output
    #[arg(short = 'S', long = "stats-output", value_name = "path")]
    pub stats_results_path: Option<PathBuf>,

    /// A command run on each MSA after it is written; "{msa}" expands to the MSA path
    #[arg(long = "predict-cmd", value_name = "CMD")]
    pub predict_command: Option<String>,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Query file
    #[arg(value_name = "QUERY.fasta")]
    pub query_path: PathBuf,

    /// Target file
    #[arg(value_name = "TARGET.fasta")]
    pub target_path: PathBuf,

    /// The path to pre-computed alignment seeds
    #[arg(short = 's', long = "seeds")]
    pub seeds_path: Option<PathBuf>,

    /// Arguments that control output options
    #[command(flatten)]
    pub output_args: OutputArgs,

    /// Arguments that are passed to librivet functions
    #[command(flatten)]
    pub rivet_args: RivetArgs,

    /// Arguments that control the alphabet reduction scheme
    #[command(flatten)]
    pub scheme_args: SchemeArgs,

    /// Arguments that are common across all rivet subcommands
    #[command(flatten)]
    pub common_args: CommonArgs,
}

#[derive(Args, Debug, Clone)]
pub struct SeedArgs {
    /// Query file
    #[arg(value_name = "QUERY.fasta")]
    pub query_path: PathBuf,

    /// Target file
    #[arg(value_name = "TARGET.fasta")]
    pub target_path: PathBuf,

    /// Where to place the seeds output file
    #[arg(short = 's', long = "seeds", default_value = "seeds.json")]
    pub seeds_path: PathBuf,

    /// Arguments that control the alphabet reduction scheme
    #[command(flatten)]
    pub scheme_args: SchemeArgs,

    /// Arguments that are common across all rivet subcommands
    #[command(flatten)]
    pub common_args: CommonArgs,
}
