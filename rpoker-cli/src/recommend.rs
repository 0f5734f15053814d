use anyhow::Result;
use clap::Args;
use tracing::info;

use rpoker_core::prelude::{
    unseen_cards, BranchEstimate, RecommendationEngine, RecommendationResult, RuleConfiguration,
};

use crate::config::{parse_card, parse_hand};

#[derive(Debug, Args)]
pub struct RecommendArgs {
    /// The player's five cards, e.g. "JS JD 8C 5H 2S"
    #[arg(long = "hand")]
    hand: String,

    /// The dealer's face-up card, removed from the sampled cards
    #[arg(long = "dealer")]
    dealer: Option<String>,

    /// Trials for the buy branch (exchanges get a quarter of this by default)
    #[arg(short = 't', long = "trials")]
    trials: Option<usize>,

    /// Seed for the sampler; random if omitted
    #[arg(long = "seed")]
    seed: Option<u64>,

    /// Print the result as JSON
    #[arg(long = "json", default_value = "false")]
    json: bool,
}

fn print_estimate(estimate: &BranchEstimate) {
    println!(
        " - {:<14} {:>+9.3} ({} trials)",
        estimate.action.to_string(),
        estimate.ev,
        estimate.trials
    );
}

fn print_report(result: &RecommendationResult) {
    println!("Recommendation: {}", result.label());
    for estimate in [&result.stand, &result.draw, &result.buy] {
        print_estimate(estimate);
    }
    println!("{}", result.explanation);
}

pub fn run(args: &RecommendArgs, rules: &RuleConfiguration) -> Result<()> {
    let player = parse_hand(&args.hand)?;
    let upcard = args.dealer.as_deref().map(parse_card).transpose()?;
    let remaining = unseen_cards(&player, upcard)?;

    let trials = args.trials.unwrap_or(rules.trial_count);
    let seed = args.seed.unwrap_or_else(rand::random);
    info!(seed, trials, unseen = remaining.count(), "estimating actions");

    let result = RecommendationEngine::new(rules).recommend(&player, &remaining, trials, seed)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_report(&result);
    }
    Ok(())
}
