use std::cmp::Ordering;
use std::collections::BTreeMap;

use bitflags::bitflags;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::table::cards::{Hand, HandCategory};
use crate::table::error::{Error, Result};
use crate::table::hand_evaluator::EvaluationResult;

/// Chip amounts. Signed so that net results can go negative.
pub type Chips = i64;

bitflags! {
    /// Optional side decisions taken by the player before the showdown.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
    pub struct Elections: u32 {
        /// Pay an ante for the dealer to swap a card when it does not open.
        const Buy       = 0b0001;
        /// Side bet that pays when the dealer does not open.
        const Insurance = 0b0010;
    }
}

/// When the dealer's hand is good enough to play.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualificationRule {
    /// One pair or better, or any hand holding both an Ace and a King.
    #[default]
    PairOrAceKing,
    /// One pair or better.
    PairOnly,
}

impl QualificationRule {
    pub fn qualifies(self, result: &EvaluationResult, hand: &Hand) -> bool {
        let paired = result.category >= HandCategory::OnePair;
        match self {
            Self::PairOrAceKing => paired || hand.has_ace_king(),
            Self::PairOnly => paired,
        }
    }
}

/// Which wager the insurance stake is a multiple of.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsuranceBasis {
    Ante,
    #[default]
    Bet,
}

/// How hands of the same category are ordered at showdown.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Same category is a tie.
    #[default]
    CategoryOnly,
    /// Same category falls back to comparing face values.
    Kickers,
}

impl TieBreak {
    pub fn compare(self, left: &EvaluationResult, right: &EvaluationResult) -> Ordering {
        match self {
            Self::CategoryOnly => left.strength.cmp(&right.strength),
            Self::Kickers => left.cmp_with_kickers(right),
        }
    }
}

/// How the six five-card sub-hands of a bought sixth card are scored.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SixCardPolicy {
    /// Only the best sub-hand counts.
    BestOnly,
    /// The two highest distinct sub-hand scores are added together.
    #[default]
    TopTwo,
}

impl SixCardPolicy {
    pub fn aggregate(self, scores: impl IntoIterator<Item = f64>) -> f64 {
        let take = match self {
            Self::BestOnly => 1,
            Self::TopTwo => 2,
        };
        scores
            .into_iter()
            .sorted_by(|a, b| b.total_cmp(a))
            .dedup()
            .take(take)
            .sum()
    }
}

const DRAW_TRIAL_DIVISOR: usize = 4;

/// The buy branch needs more trials than each exchange subset, so at least
/// two.
pub(crate) const MIN_TRIAL_COUNT: usize = 2;

pub(crate) fn chip_overflow() -> Error {
    Error::InvalidConfiguration("chip amount out of range".to_owned())
}

pub(crate) fn checked_sum(amounts: impl IntoIterator<Item = Chips>) -> Result<Chips> {
    amounts
        .into_iter()
        .try_fold(0, |total: Chips, amount| total.checked_add(amount))
        .ok_or_else(chip_overflow)
}

pub(crate) fn checked_product(left: Chips, right: Chips) -> Result<Chips> {
    left.checked_mul(right).ok_or_else(chip_overflow)
}

/// House rules for a single round. Passed by reference into every engine;
/// nothing here is global.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfiguration {
    pub ante: Chips,
    pub bet: Chips,
    /// Multiplier applied to the bet for a winning hand of each category.
    pub payouts: BTreeMap<HandCategory, Chips>,
    pub insurance_multiplier: Chips,
    pub insurance_basis: InsuranceBasis,
    pub ak_bonus: Chips,
    pub qualification: QualificationRule,
    pub tie_break: TieBreak,
    pub six_card_policy: SixCardPolicy,
    /// Player's cost of exchanging cards.
    pub exchange_cost: Chips,
    /// Player's cost of buying a sixth card.
    pub buy_cost: Chips,
    /// Trials for the buy branch of a recommendation.
    pub trial_count: usize,
    /// Trials per exchanged subset. Defaults to a quarter of `trial_count`,
    /// and is always below it.
    pub draw_trials: Option<usize>,
}

impl Default for RuleConfiguration {
    fn default() -> Self {
        let payouts = [
            (HandCategory::HighCard, 1),
            (HandCategory::OnePair, 1),
            (HandCategory::TwoPair, 2),
            (HandCategory::ThreeOfAKind, 3),
            (HandCategory::Straight, 4),
            (HandCategory::Flush, 5),
            (HandCategory::FullHouse, 7),
            (HandCategory::FourOfAKind, 20),
            (HandCategory::StraightFlush, 50),
            (HandCategory::RoyalFlush, 100),
        ];

        Self {
            ante: 1,
            bet: 2,
            payouts: payouts.into_iter().collect(),
            insurance_multiplier: 3,
            insurance_basis: InsuranceBasis::default(),
            ak_bonus: 1,
            qualification: QualificationRule::default(),
            tie_break: TieBreak::default(),
            six_card_policy: SixCardPolicy::default(),
            exchange_cost: 1,
            buy_cost: 1,
            trial_count: 2_000,
            draw_trials: None,
        }
    }
}

impl RuleConfiguration {
    pub fn payout_multiplier(&self, category: HandCategory) -> Result<Chips> {
        self.payouts.get(&category).copied().ok_or_else(|| {
            Error::InvalidConfiguration(format!("no payout multiplier for {category}"))
        })
    }

    /// Stake charged for insurance, which is also what it pays out.
    pub fn insurance_stake(&self) -> Result<Chips> {
        let basis = match self.insurance_basis {
            InsuranceBasis::Ante => self.ante,
            InsuranceBasis::Bet => self.bet,
        };
        checked_product(basis, self.insurance_multiplier)
    }

    /// Trials per exchange subset when the buy branch runs `trial_count`.
    pub fn draw_trials_for(&self, trial_count: usize) -> usize {
        let ceiling = trial_count.saturating_sub(1).max(1);
        self.draw_trials
            .unwrap_or(trial_count / DRAW_TRIAL_DIVISOR)
            .clamp(1, ceiling)
    }

    /// The most a round can pay back and the most it can cost must both fit
    /// in `Chips`.
    fn check_worst_case(&self) -> Result<()> {
        let max_multiplier = self.payouts.values().copied().max().unwrap_or(0);
        let stake = self.insurance_stake()?;
        checked_sum([
            checked_product(self.bet, max_multiplier)?,
            self.ak_bonus,
            self.ante,
            stake,
        ])?;
        checked_sum([checked_product(self.ante, 2)?, self.bet, stake])?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(Error::InvalidConfiguration(message));

        if self.ante <= 0 || self.bet <= 0 {
            return invalid(format!(
                "ante and bet must be positive (ante {}, bet {})",
                self.ante, self.bet
            ));
        }
        for category in HandCategory::iter() {
            if self.payout_multiplier(category)? < 0 {
                return invalid(format!("negative payout multiplier for {category}"));
            }
        }
        if self.insurance_multiplier < 0 || self.ak_bonus < 0 {
            return invalid("insurance multiplier and AK bonus cannot be negative".to_owned());
        }
        if self.exchange_cost < 0 || self.buy_cost < 0 {
            return invalid("exchange and buy costs cannot be negative".to_owned());
        }
        if self.trial_count < MIN_TRIAL_COUNT || self.draw_trials == Some(0) {
            return invalid(format!(
                "need at least {MIN_TRIAL_COUNT} buy trials and one exchange trial"
            ));
        }
        if self.draw_trials.is_some_and(|draw| draw >= self.trial_count) {
            return invalid(format!(
                "exchange trials must be fewer than the {} buy trials",
                self.trial_count
            ));
        }
        self.check_worst_case()?;
        Ok(())
    }
}
