use std::fs;
use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use clap::Args;
use rand::{rngs::SmallRng, SeedableRng};
use tracing::info;

use rpoker_core::prelude::{Card, CardCollection, CardView, Hand, RuleConfiguration, HAND_SIZE};

#[derive(Debug, Args)]
pub struct RuleArgs {
    /// JSON file with house rules; missing fields keep their defaults
    #[arg(long = "rules", global = true)]
    rules: Option<PathBuf>,

    /// Override the ante
    #[arg(long = "ante", global = true)]
    ante: Option<i64>,

    /// Override the bet
    #[arg(long = "bet", global = true)]
    bet: Option<i64>,
}

impl RuleArgs {
    pub fn load(&self) -> Result<RuleConfiguration> {
        let mut rules = match &self.rules {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading rules from {}", path.display()))?;
                let rules: RuleConfiguration = serde_json::from_str(&text)
                    .with_context(|| format!("parsing rules in {}", path.display()))?;
                info!(path = %path.display(), "loaded house rules");
                rules
            }
            None => RuleConfiguration::default(),
        };

        if let Some(ante) = self.ante {
            rules.ante = ante;
        }
        if let Some(bet) = self.bet {
            rules.bet = bet;
        }

        rules.validate()?;
        Ok(rules)
    }
}

pub fn parse_hand(codes: &str) -> Result<Hand> {
    let cards = CardCollection::parse(codes).with_context(|| format!("parsing hand `{codes}`"))?;
    ensure!(
        cards.len() == HAND_SIZE,
        "a hand needs exactly {HAND_SIZE} cards, got {} in `{codes}`",
        cards.len()
    );
    Ok(Hand::from_slice(cards.view())?)
}

pub fn parse_card(code: &str) -> Result<Card> {
    code.trim()
        .parse()
        .with_context(|| format!("parsing card `{code}`"))
}

/// A seeded generator, or a fresh one from entropy.
pub fn rng_from(seed: Option<u64>) -> SmallRng {
    seed.map_or_else(SmallRng::from_entropy, SmallRng::seed_from_u64)
}
