mod args;
mod pipeline;
mod predict;
mod search;
mod stats;
mod util;

use args::{Cli, SubCommands};
use search::{search, seed};
use util::set_threads;

use clap::Parser;

#[cfg(feature = "jemalloc")]
#[global_allocator]
static GLOBAL: jemallocator::Jemalloc = jemallocator::Jemalloc;

fn main() -> anyhow::Result<()> {
    color_backtrace::install();

    match Cli::parse().command {
        SubCommands::Search(args) => {
            set_threads(args.common_args.num_threads)?;
            search(&args)?;
        }
        SubCommands::Seed(args) => {
            set_threads(args.common_args.num_threads)?;
            seed(&args)?;
        }
    }
    Ok(())
}
