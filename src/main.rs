// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::process;

use clap::Parser;

use exercise_rules::cli::args::{Cli, Commands};
use exercise_rules::cli::inspect::{run_catalog, run_parse, run_rules};
use exercise_rules::cli::logging::set_verbose;
use exercise_rules::cli::score::{run_rank, run_score};
use exercise_rules::error;

fn main() {
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Score(args) => {
            set_verbose(args.common.verbose);
            run_score(args).map(|_| ())
        }
        Commands::Rank(args) => {
            set_verbose(args.common.verbose);
            run_rank(args)
        }
        Commands::Rules(args) => {
            set_verbose(args.common.verbose);
            run_rules(args)
        }
        Commands::Parse(args) => {
            set_verbose(args.common.verbose);
            run_parse(args)
        }
        Commands::Catalog(args) => {
            set_verbose(args.verbose);
            run_catalog(args)
        }
    };

    if let Err(e) = result {
        error!("{e}");
        process::exit(1);
    }
}
