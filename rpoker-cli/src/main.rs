mod config;
mod play;
mod recommend;
mod simulate;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(version, about, long_about = None, propagate_version = true)]
struct Cli {
    #[command(flatten)]
    rules: config::RuleArgs,

    /// Log more (-v info, -vv debug, -vvv trace). `RUST_LOG` takes precedence
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: CliCommands,
}

#[derive(Debug, Subcommand)]
enum CliCommands {
    /// Deal the dealer's hidden cards and settle a single hand
    Play(play::PlayArgs),
    /// Estimate whether to stand, exchange cards or buy a sixth card
    Recommend(recommend::RecommendArgs),
    /// Play a batch of random hands and report the results
    Simulate(simulate::SimulateArgs),
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let rules = cli.rules.load()?;

    match &cli.command {
        CliCommands::Play(args) => play::run(args, &rules),
        CliCommands::Recommend(args) => recommend::run(args, &rules),
        CliCommands::Simulate(args) => simulate::run(args, &rules),
    }
}
