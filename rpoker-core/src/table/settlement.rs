use std::cmp::Ordering;

use serde::Serialize;
use strum_macros::{Display, EnumIter};
use tracing::{debug, trace};

use crate::table::cards::{Deck, Hand, HandCategory, HAND_SIZE};
use crate::table::cardset::CardSet;
use crate::table::error::{Error, Result};
use crate::table::hand_evaluator::{EvaluationResult, HandEvaluator};
use crate::table::rules::{
    checked_product, checked_sum, chip_overflow, Chips, Elections, RuleConfiguration,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, EnumIter, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    Player,
    Dealer,
    Tie,
    /// The dealer never opened, so there was no showdown.
    NoShow,
}

/// Full accounting of one settled round.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RoundResult {
    pub dealer_opens: bool,
    pub dealer_bought: bool,
    pub winner: Winner,
    pub player_combo: HandCategory,
    pub dealer_combo: HandCategory,
    pub ak_bonus: bool,
    pub insurance_payout: Chips,
    pub payout: Chips,
    pub cost: Chips,
    pub net_gain: Chips,
    pub dealer_hand: Hand,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Stage {
    Init,
    QualifyCheck,
    Buy,
    Requalify,
    Settle,
    Done,
}

/// Running state of a round as it moves through the stages.
struct Ledger {
    stage: Stage,
    dealer: Hand,
    dealer_result: EvaluationResult,
    dealer_opens: bool,
    dealer_bought: bool,
    insurance_payout: Chips,
    cost: Chips,
}

impl Ledger {
    fn advance(&mut self, stage: Stage) {
        trace!(from = ?self.stage, to = ?stage, cost = self.cost, "settlement transition");
        self.stage = stage;
    }
}

pub struct SettlementEngine<'a> {
    rules: &'a RuleConfiguration,
}

impl<'a> SettlementEngine<'a> {
    pub fn new(rules: &'a RuleConfiguration) -> Self {
        Self { rules }
    }

    fn ensure_complete(hand: &Hand) -> Result<()> {
        if hand.len() == HAND_SIZE {
            Ok(())
        } else {
            Err(Error::InvalidHandSize {
                expected: HAND_SIZE,
                found: hand.len(),
            })
        }
    }

    /// No card may be held twice across the two hands and the draw source.
    fn ensure_disjoint(player: &Hand, dealer: &Hand, deck: &Deck) -> Result<()> {
        CardSet::distinct(player)?
            .union_disjoint(CardSet::distinct(dealer)?)?
            .union_disjoint(CardSet::distinct(deck)?)
            .map(|_| ())
    }

    fn qualifies(&self, result: &EvaluationResult, hand: &Hand) -> bool {
        self.rules.qualification.qualifies(result, hand)
    }

    /// Settle a round. `deck` is the draw source for the dealer's buy and
    /// must not hold any card from either hand.
    pub fn settle(
        &self,
        player: &Hand,
        dealer: Hand,
        deck: &mut Deck,
        elections: Elections,
    ) -> Result<RoundResult> {
        Self::ensure_complete(player)?;
        Self::ensure_complete(&dealer)?;
        Self::ensure_disjoint(player, &dealer, deck)?;

        let rules = self.rules;
        let player_result = HandEvaluator::evaluate_poker_hand(player)?;
        let player_multiplier = rules.payout_multiplier(player_result.category)?;
        let dealer_result = HandEvaluator::evaluate_poker_hand(&dealer)?;

        let insured = elections.contains(Elections::Insurance);
        let mut ledger = Ledger {
            stage: Stage::Init,
            dealer,
            dealer_result,
            dealer_opens: false,
            dealer_bought: false,
            insurance_payout: 0,
            cost: checked_sum([rules.ante, rules.bet])?,
        };
        if insured {
            ledger.cost = checked_sum([ledger.cost, rules.insurance_stake()?])?;
        }

        ledger.advance(Stage::QualifyCheck);
        ledger.dealer_opens = self.qualifies(&ledger.dealer_result, &ledger.dealer);
        if insured && !ledger.dealer_opens {
            ledger.insurance_payout = rules.insurance_stake()?;
        }

        if !ledger.dealer_opens && elections.contains(Elections::Buy) {
            ledger.advance(Stage::Buy);
            ledger.cost = checked_sum([ledger.cost, rules.ante])?;
            let replacement = deck.draw().ok_or(Error::InsufficientCards {
                needed: 1,
                available: 0,
            })?;
            if let Some(position) = ledger.dealer.lowest_position() {
                let discarded = ledger.dealer.replace(position, replacement);
                trace!(?discarded, %replacement, "dealer bought a card");
            }
            ledger.dealer_bought = true;

            ledger.advance(Stage::Requalify);
            ledger.dealer_result = HandEvaluator::evaluate_poker_hand(&ledger.dealer)?;
            ledger.dealer_opens = self.qualifies(&ledger.dealer_result, &ledger.dealer);
        }

        ledger.advance(Stage::Settle);
        let mut ak_bonus = false;
        let (winner, payout) = if ledger.dealer_opens {
            match rules.tie_break.compare(&player_result, &ledger.dealer_result) {
                Ordering::Greater => {
                    let mut payout = checked_product(rules.bet, player_multiplier)?;
                    if player_result.category == HandCategory::HighCard && player.has_ace_king() {
                        payout = checked_sum([payout, rules.ak_bonus])?;
                        ak_bonus = true;
                    }
                    (Winner::Player, payout)
                }
                Ordering::Equal => (Winner::Tie, 0),
                Ordering::Less => (Winner::Dealer, 0),
            }
        } else if ledger.dealer_bought {
            (Winner::NoShow, 0)
        } else {
            (Winner::NoShow, rules.ante)
        };

        ledger.advance(Stage::Done);
        let net_gain = checked_sum([payout, ledger.insurance_payout])?
            .checked_sub(ledger.cost)
            .ok_or_else(chip_overflow)?;
        let result = RoundResult {
            dealer_opens: ledger.dealer_opens,
            dealer_bought: ledger.dealer_bought,
            winner,
            player_combo: player_result.category,
            dealer_combo: ledger.dealer_result.category,
            ak_bonus,
            insurance_payout: ledger.insurance_payout,
            payout,
            cost: ledger.cost,
            net_gain,
            dealer_hand: ledger.dealer,
        };

        debug!(
            player = %player,
            dealer = %result.dealer_hand,
            winner = %result.winner,
            net_gain = result.net_gain,
            "settled round"
        );

        Ok(result)
    }
}
