use std::collections::HashMap;

use anyhow::{Context, Result};
use clap::Args;
use itertools::Itertools;
use rand::prelude::*;
use rayon::prelude::*;
use strum::IntoEnumIterator;
use tracing::info;

use rpoker_core::prelude::{
    random_round, Chips, Elections, HandCategory, RoundResult, RuleConfiguration, Winner,
};

#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// Run on a single thread (for profiling)
    #[arg(long = "single-threaded", default_value = "false")]
    single_threaded: bool,

    /// Play this many hands, in thousands
    #[arg(short = 'n', long = "hands", default_value = "100")]
    hands: usize,

    /// Let the dealer buy a replacement card when it does not open
    #[arg(long = "buy", default_value = "false")]
    buy: bool,

    /// Take insurance on every hand
    #[arg(long = "insurance", default_value = "false")]
    insurance: bool,

    /// Hand `i` is dealt from `seed + i`, so results do not depend on threading
    #[arg(long = "seed", default_value = "0")]
    seed: u64,
}

#[derive(Default)]
struct Tally {
    rounds: usize,
    net: Chips,
    wagered: Chips,
    ak_bonuses: usize,
    winners: HashMap<Winner, usize>,
    player_combos: HashMap<HandCategory, (usize, Chips)>,
}

impl Tally {
    fn add(&mut self, result: &RoundResult) {
        self.rounds += 1;
        self.net += result.net_gain;
        self.wagered += result.cost;
        self.ak_bonuses += usize::from(result.ak_bonus);
        *self.winners.entry(result.winner).or_insert(0) += 1;
        let entry = self
            .player_combos
            .entry(result.player_combo)
            .or_insert((0, 0));
        entry.0 += 1;
        entry.1 += result.net_gain;
    }

    fn merge(mut self, other: Self) -> Self {
        self.rounds += other.rounds;
        self.net += other.net;
        self.wagered += other.wagered;
        self.ak_bonuses += other.ak_bonuses;
        for (winner, count) in other.winners {
            *self.winners.entry(winner).or_insert(0) += count;
        }
        for (combo, (count, net)) in other.player_combos {
            let entry = self.player_combos.entry(combo).or_insert((0, 0));
            entry.0 += count;
            entry.1 += net;
        }
        self
    }
}

fn generate_tally<G>(single_threaded: bool, hands: usize, play_hand: G) -> Result<Tally>
where
    G: Fn(usize) -> rpoker_core::prelude::Result<RoundResult> + Sync + Send,
{
    let tally = if single_threaded {
        (0..hands).map(play_hand).try_fold(Tally::default(), |mut tally, result| {
            tally.add(&result?);
            Ok::<_, rpoker_core::prelude::Error>(tally)
        })?
    } else {
        (0..hands)
            .into_par_iter()
            .map(play_hand)
            .try_fold(Tally::default, |mut tally, result| {
                tally.add(&result?);
                Ok::<_, rpoker_core::prelude::Error>(tally)
            })
            .try_reduce(Tally::default, |left, right| Ok(left.merge(right)))?
    };

    Ok(tally)
}

#[allow(clippy::cast_precision_loss)]
fn print_tally(tally: &Tally) {
    let rounds = tally.rounds.max(1) as f64;

    println!("Winners:");
    for winner in Winner::iter() {
        let count = tally.winners.get(&winner).copied().unwrap_or(0);
        println!(
            " - {:<8} {:>7.3}%",
            winner.to_string(),
            count as f64 / rounds * 100.0
        );
    }

    let name_width = HandCategory::iter()
        .map(|category| category.to_string().len())
        .max()
        .unwrap_or(0);
    println!("Player hands:");
    for (category, (count, net)) in tally
        .player_combos
        .iter()
        .sorted_by_key(|(category, _)| **category)
    {
        println!(
            " - {:name_width$} {:>7.3}% (avg net: {:>+7.3})",
            category.to_string(),
            *count as f64 / rounds * 100.0,
            *net as f64 / *count as f64,
        );
    }

    println!("A-K bonuses: {}", tally.ak_bonuses);
    println!("Mean net gain per hand: {:+.4}", tally.net as f64 / rounds);
    if tally.wagered > 0 {
        println!(
            "House edge: {:.3}% of chips wagered",
            -(tally.net as f64) / tally.wagered as f64 * 100.0
        );
    }
}

fn total_hands(thousands: usize) -> Result<usize> {
    thousands
        .checked_mul(1_000)
        .with_context(|| format!("{thousands} thousand hands is too many"))
}

pub fn run(args: &SimulateArgs, rules: &RuleConfiguration) -> Result<()> {
    let hands = total_hands(args.hands)?;

    let mut elections = Elections::empty();
    elections.set(Elections::Buy, args.buy);
    elections.set(Elections::Insurance, args.insurance);

    let seed = args.seed;
    let play_hand = |index: usize| {
        let mut rng = SmallRng::seed_from_u64(seed.wrapping_add(index as u64));
        random_round(elections, rules, &mut rng)
    };

    info!(hands, ?elections, seed, "simulating");
    let tally = generate_tally(args.single_threaded, hands, play_hand)?;

    println!(
        "Played {} hands (buy: {}, insurance: {}):",
        tally.rounds, args.buy, args.insurance
    );
    print_tally(&tally);
    Ok(())
}
