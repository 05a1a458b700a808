// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// CLI arguments parser.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(after_help = r#"Common Options:
    --catalog <FILE>       Exercise catalog JSON [default: built-in]
    --config <FILE>        Rule configuration JSON [default: built-in thresholds]
    --threshold <SCORE>    Minimum score for a match (1.0 requires every check)
    --verbose              Show verbose output

Examples:
    exercise-rules score tracks/curl_01.json --activity "Dumbbell Curl"
    exercise-rules score tracks/ --workers 4 --save runs/report.json
    exercise-rules rank tracks/unknown.json --top-k 5
    exercise-rules rules tracks/curl_01.json
    exercise-rules parse "Hold a kettlebell close to the chest and squat down"
    exercise-rules catalog --catalog my_exercises.json"#)]
pub struct Cli {
    #[command(subcommand)]
    /// Subcommand to execute.
    pub command: Commands,
}

/// Commands for the CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score recorded attempts against an activity
    Score(ScoreArgs),
    /// Rank catalog activities against one recorded attempt
    Rank(RankArgs),
    /// Print the observed rules of a recorded attempt
    Rules(RulesArgs),
    /// Print the expected rules derived from a free-text description
    Parse(ParseArgs),
    /// List the catalog activities
    Catalog(CommonArgs),
}

/// Options shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Exercise catalog JSON file
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Rule configuration JSON file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Minimum score for a match
    #[arg(long)]
    pub threshold: Option<f32>,

    /// Show verbose output
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub verbose: bool,
}

/// Arguments for the score command.
#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// Track file or directory of track files
    pub source: PathBuf,

    /// Activity to score against [default: the track's own]
    #[arg(short, long)]
    pub activity: Option<String>,

    /// Number of parallel workers (0 = one per CPU)
    #[arg(short, long, default_value_t = 0)]
    pub workers: usize,

    /// Save the JSON report to this file
    #[arg(long)]
    pub save: Option<PathBuf>,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Arguments for the rank command.
#[derive(Args, Debug)]
pub struct RankArgs {
    /// Track file
    pub source: PathBuf,

    /// Number of activities to report
    #[arg(short = 'k', long, default_value_t = 3)]
    pub top_k: usize,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Arguments for the rules command.
#[derive(Args, Debug)]
pub struct RulesArgs {
    /// Track file
    pub source: PathBuf,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Arguments for the parse command.
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Exercise description
    pub description: String,

    /// Activity name for the printed reference
    #[arg(short, long, default_value = "Custom Exercise")]
    pub activity: String,

    #[command(flatten)]
    pub common: CommonArgs,
}
