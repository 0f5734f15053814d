use anyhow::Result;
use clap::Args;

use rpoker_core::prelude::{deal_round, Elections, RoundResult, RuleConfiguration};

use crate::config::{parse_card, parse_hand, rng_from};

#[derive(Debug, Args)]
pub struct PlayArgs {
    /// The player's five cards, e.g. "AS KH 9D 7C 2S"
    #[arg(long = "hand")]
    hand: String,

    /// The dealer's face-up card
    #[arg(long = "dealer")]
    dealer: String,

    /// Let the dealer buy a replacement card if it does not open
    #[arg(long = "buy", default_value = "false")]
    buy: bool,

    /// Take insurance against the dealer not opening
    #[arg(long = "insurance", default_value = "false")]
    insurance: bool,

    /// Seed for dealing the dealer's hidden cards
    #[arg(long = "seed")]
    seed: Option<u64>,

    /// Print the result as JSON
    #[arg(long = "json", default_value = "false")]
    json: bool,
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn print_report(result: &RoundResult) {
    println!("Dealer opens:  {}", yes_no(result.dealer_opens));
    println!("Dealer bought: {}", yes_no(result.dealer_bought));
    println!("Player combo:  {}", result.player_combo);
    if result.dealer_opens {
        println!("Dealer combo:  {}", result.dealer_combo);
    }
    println!("Winner:        {}", result.winner);
    if result.ak_bonus {
        println!("A-K bonus paid");
    }
    if result.insurance_payout > 0 {
        println!("Insurance:     {}", result.insurance_payout);
    }
    println!(
        "Payout:        {} (cost: {}, net: {})",
        result.payout, result.cost, result.net_gain
    );
    println!("Dealer hand:   {}", result.dealer_hand);
}

pub fn run(args: &PlayArgs, rules: &RuleConfiguration) -> Result<()> {
    let player = parse_hand(&args.hand)?;
    let upcard = parse_card(&args.dealer)?;

    let mut elections = Elections::empty();
    elections.set(Elections::Buy, args.buy);
    elections.set(Elections::Insurance, args.insurance);

    let mut rng = rng_from(args.seed);
    let result = deal_round(&player, upcard, elections, rules, &mut rng)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_report(&result);
    }
    Ok(())
}
