use crate::table::cards::{Hand, HandCategory};
use crate::table::error::Result;
use crate::table::hand_evaluator::{EvaluationResult, HandEvaluator};
use crate::table::rules::{checked_product, RuleConfiguration};

/// Simplified payoff of a made hand, ignoring the dealer: what the bet would
/// return if the hand won.
pub struct Scorer<'a> {
    rules: &'a RuleConfiguration,
    result: EvaluationResult,
    hand: &'a Hand,
}

impl<'a> Scorer<'a> {
    fn new(rules: &'a RuleConfiguration, result: EvaluationResult, hand: &'a Hand) -> Self {
        Self {
            rules,
            result,
            hand,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn score(&self) -> Result<f64> {
        let chips = if self.result.category >= HandCategory::OnePair {
            checked_product(
                self.rules.bet,
                self.rules.payout_multiplier(self.result.category)?,
            )?
        } else if self.hand.has_ace_king() {
            self.rules.ak_bonus
        } else {
            0
        };

        Ok(chips as f64)
    }

    fn score_evaluated(
        rules: &'a RuleConfiguration,
        result: EvaluationResult,
        hand: &'a Hand,
    ) -> Result<f64> {
        Self::new(rules, result, hand).score()
    }

    pub fn score_hand(rules: &'a RuleConfiguration, hand: &'a Hand) -> Result<f64> {
        let result = HandEvaluator::evaluate_poker_hand(hand)?;
        Self::score_evaluated(rules, result, hand)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::hand;
    use crate::table::error::Error;
    use crate::table::rules::Chips;

    fn expect_score(hand: &Hand, expected_score: f64) {
        let rules = RuleConfiguration::default();
        let score = Scorer::score_hand(&rules, hand).unwrap();
        assert_relative_eq!(score, expected_score);
    }

    #[test]
    fn scoring_test() {
        expect_score(&hand!("2H 3H 4H 5H 6C"), 8.0);
        expect_score(&hand!("3D 3S 2C 2H 9C"), 4.0);
        expect_score(&hand!("AS KS QS JS TS"), 200.0);
        expect_score(&hand!("QS QD 7C 4H 2S"), 2.0);
    }

    #[test]
    fn high_card_scoring_test() {
        expect_score(&hand!("AS KH 9D 7C 2S"), 1.0);
        expect_score(&hand!("AS QH 9D 7C 2S"), 0.0);
    }

    #[test]
    fn oversized_bet_test() {
        let rules = RuleConfiguration {
            bet: Chips::MAX / 2,
            ..RuleConfiguration::default()
        };
        assert!(matches!(
            Scorer::score_hand(&rules, &hand!("AH TH 8H 6H 3H")),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn missing_payout_test() {
        let mut rules = RuleConfiguration::default();
        rules.payouts.clear();
        assert!(matches!(
            Scorer::score_hand(&rules, &hand!("QS QD 7C 4H 2S")),
            Err(Error::InvalidConfiguration(_))
        ));
    }
}
