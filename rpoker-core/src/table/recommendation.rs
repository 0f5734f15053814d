use std::fmt;

use bitflags::bitflags;
use itertools::Itertools;
use rand::{rngs::SmallRng, SeedableRng};
use serde::{Serialize, Serializer};
use tracing::{debug, trace};

use crate::table::cards::{CardView, Deck, Hand, HAND_SIZE};
use crate::table::cardset::CardSet;
use crate::table::error::{Error, Result};
use crate::table::rules::{RuleConfiguration, MIN_TRIAL_COUNT};
use crate::table::scorer::Scorer;

bitflags! {
    /// Hand positions to exchange.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct Positions: u8 {
        const First  = 0b0_0001;
        const Second = 0b0_0010;
        const Third  = 0b0_0100;
        const Fourth = 0b0_1000;
        const Fifth  = 0b1_0000;
    }
}

impl Positions {
    /// Zero-based hand indices, in ascending order.
    pub fn indices(self) -> impl Iterator<Item = usize> {
        (0..HAND_SIZE).filter(move |index| self.bits() & (1 << index) != 0)
    }

    /// Every non-empty subset, in ascending mask order.
    pub fn subsets() -> impl Iterator<Item = Self> {
        (1..=Self::all().bits()).map(Self::from_bits_truncate)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Stand,
    Draw(Positions),
    Buy,
}

impl Action {
    /// Preferred order when estimates are equal.
    fn priority(self) -> u8 {
        match self {
            Self::Stand => 0,
            Self::Draw(_) => 1,
            Self::Buy => 2,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stand => f.write_str("stand"),
            Self::Draw(positions) => {
                write!(
                    f,
                    "draw {}",
                    positions.indices().map(|index| index + 1).join(" ")
                )
            }
            Self::Buy => f.write_str("buy"),
        }
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Average payoff of one candidate action, net of its cost.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct BranchEstimate {
    pub action: Action,
    pub ev: f64,
    pub trials: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecommendationResult {
    pub action: Action,
    pub stand: BranchEstimate,
    /// The best of the 31 exchange subsets.
    pub draw: BranchEstimate,
    pub buy: BranchEstimate,
    pub explanation: String,
}

impl RecommendationResult {
    pub fn label(&self) -> String {
        self.action.to_string()
    }
}

const BUY_STREAM: u64 = 0x40;

/// Each branch gets its own random stream so branches can be computed in
/// any order, or in parallel, and still reproduce.
fn branch_seed(seed: u64, stream: u64) -> u64 {
    seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

#[allow(clippy::cast_precision_loss)]
fn average(total: f64, trials: usize) -> f64 {
    total / trials as f64
}

pub struct RecommendationEngine<'a> {
    rules: &'a RuleConfiguration,
}

impl<'a> RecommendationEngine<'a> {
    pub fn new(rules: &'a RuleConfiguration) -> Self {
        Self { rules }
    }

    pub fn estimate_stand(&self, player: &Hand) -> Result<BranchEstimate> {
        Ok(BranchEstimate {
            action: Action::Stand,
            ev: Scorer::score_hand(self.rules, player)?,
            trials: 0,
        })
    }

    /// Replace `positions` with cards sampled from `remaining`, `trials`
    /// times.
    #[allow(clippy::cast_precision_loss)]
    pub fn estimate_draw(
        &self,
        player: &Hand,
        remaining: &Deck,
        positions: Positions,
        trials: usize,
        seed: u64,
    ) -> Result<BranchEstimate> {
        let mut rng = SmallRng::seed_from_u64(branch_seed(seed, u64::from(positions.bits())));
        let count = positions.indices().count();

        let mut total = 0.0;
        for _ in 0..trials {
            let drawn = remaining.sample(count, &mut rng)?;
            let mut hand = player.clone();
            for (position, &card) in positions.indices().zip(drawn.view()) {
                hand.replace(position, card);
            }
            total += Scorer::score_hand(self.rules, &hand)?;
        }

        Ok(BranchEstimate {
            action: Action::Draw(positions),
            ev: average(total, trials) - self.rules.exchange_cost as f64,
            trials,
        })
    }

    /// Add one sampled card to the hand and score the six five-card
    /// sub-hands with the configured policy, `trials` times.
    #[allow(clippy::cast_precision_loss)]
    pub fn estimate_buy(
        &self,
        player: &Hand,
        remaining: &Deck,
        trials: usize,
        seed: u64,
    ) -> Result<BranchEstimate> {
        let mut rng = SmallRng::seed_from_u64(branch_seed(seed, BUY_STREAM));

        let mut total = 0.0;
        for _ in 0..trials {
            let extra = remaining.sample(1, &mut rng)?;
            let scores = player
                .view()
                .iter()
                .chain(extra.view())
                .copied()
                .combinations(HAND_SIZE)
                .map(|cards| Scorer::score_hand(self.rules, &Hand::from_slice(&cards)?))
                .collect::<Result<Vec<_>>>()?;
            total += self.rules.six_card_policy.aggregate(scores);
        }

        Ok(BranchEstimate {
            action: Action::Buy,
            ev: average(total, trials) - self.rules.buy_cost as f64,
            trials,
        })
    }

    fn validate(
        player: &Hand,
        remaining: &(impl CardView + ?Sized),
        trial_count: usize,
    ) -> Result<Deck> {
        if trial_count < MIN_TRIAL_COUNT {
            return Err(Error::InvalidConfiguration(format!(
                "need at least {MIN_TRIAL_COUNT} trials, got {trial_count}"
            )));
        }
        if player.len() != HAND_SIZE {
            return Err(Error::InvalidHandSize {
                expected: HAND_SIZE,
                found: player.len(),
            });
        }

        let deck = Deck::from_cards(remaining)?;
        CardSet::distinct(player)?.union_disjoint(CardSet::distinct(&deck)?)?;
        if deck.count() < HAND_SIZE {
            return Err(Error::InsufficientCards {
                needed: HAND_SIZE,
                available: deck.count(),
            });
        }
        Ok(deck)
    }

    /// Estimate standing, every exchange subset and buying a sixth card, and
    /// pick the best. Equal estimates prefer buy, then draw, then stand.
    pub fn recommend(
        &self,
        player: &Hand,
        remaining: &(impl CardView + ?Sized),
        trial_count: usize,
        seed: u64,
    ) -> Result<RecommendationResult> {
        let deck = Self::validate(player, remaining, trial_count)?;

        let stand = self.estimate_stand(player)?;

        let draw_trials = self.rules.draw_trials_for(trial_count);
        let mut draw: Option<BranchEstimate> = None;
        for positions in Positions::subsets() {
            let estimate = self.estimate_draw(player, &deck, positions, draw_trials, seed)?;
            trace!(action = %estimate.action, ev = estimate.ev, "draw estimate");
            if draw.is_none_or(|best| estimate.ev > best.ev) {
                draw = Some(estimate);
            }
        }
        let draw = draw.ok_or_else(|| {
            Error::InvalidConfiguration("no exchange subsets were evaluated".to_owned())
        })?;

        let buy = self.estimate_buy(player, &deck, trial_count, seed)?;

        let best = [stand, draw, buy]
            .into_iter()
            .max_by(|a, b| {
                a.ev.total_cmp(&b.ev)
                    .then(a.action.priority().cmp(&b.action.priority()))
            })
            .unwrap_or(stand);

        let explanation = format!(
            "{} has the highest estimated value ({:+.3}): stand {:+.3}, {} {:+.3} over {} trials, buy {:+.3} over {} trials",
            best.action, best.ev, stand.ev, draw.action, draw.ev, draw.trials, buy.ev, buy.trials,
        );

        debug!(player = %player, action = %best.action, ev = best.ev, "recommendation");

        Ok(RecommendationResult {
            action: best.action,
            stand,
            draw,
            buy,
            explanation,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use approx::assert_relative_eq;

    use super::*;
    use crate::table::cards::{CardCollection, HandCategory};
    use crate::table::rules::{Chips, SixCardPolicy};
    use crate::{cards, hand};

    fn unseen(player: &Hand) -> Deck {
        let mut deck = Deck::base_deck();
        deck.remove_all_known(player).unwrap();
        deck
    }

    fn rules_with_zero_payouts() -> BTreeMap<HandCategory, Chips> {
        RuleConfiguration::default()
            .payouts
            .into_keys()
            .map(|category| (category, 0))
            .collect()
    }

    #[test]
    fn subsets_test() {
        let subsets: Vec<_> = Positions::subsets().collect();
        assert_eq!(subsets.len(), 31);
        assert_eq!(subsets[0], Positions::First);
        assert_eq!(subsets[30], Positions::all());
        assert_eq!(
            (Positions::Second | Positions::Fifth).indices().collect::<Vec<_>>(),
            vec![1, 4]
        );
        assert_eq!(
            Action::Draw(Positions::First | Positions::Third).to_string(),
            "draw 1 3"
        );
    }

    #[test]
    fn stand_test() {
        let rules = RuleConfiguration::default();
        let engine = RecommendationEngine::new(&rules);
        let estimate = engine.estimate_stand(&hand!("QS QD 7C 4H 2S")).unwrap();
        assert_eq!(estimate.action, Action::Stand);
        assert_relative_eq!(estimate.ev, 2.0);
    }

    #[test]
    fn draw_test() {
        let rules = RuleConfiguration::default();
        let engine = RecommendationEngine::new(&rules);
        let remaining = Deck::from_cards(&cards!("2H 2D")).unwrap();
        let estimate = engine
            .estimate_draw(
                &hand!("2S 7D 9C JH 4S"),
                &remaining,
                Positions::Second | Positions::Third,
                50,
                1,
            )
            .unwrap();
        // Always trip deuces, less the exchange cost.
        assert_relative_eq!(estimate.ev, 5.0);
        assert_eq!(estimate.trials, 50);
    }

    #[test]
    fn draw_never_repeats_cards_test() {
        let rules = RuleConfiguration::default();
        let engine = RecommendationEngine::new(&rules);
        let player = hand!("AS AD 7C 4H 2S");
        // Any repeated card would make the redrawn hand fail evaluation.
        let remaining = Deck::from_cards(&cards!("3H 6D 8C 9S JH")).unwrap();
        let estimate = engine
            .estimate_draw(&player, &remaining, Positions::all(), 200, 9)
            .unwrap();
        assert_relative_eq!(estimate.ev, -1.0);

        assert_eq!(
            engine.estimate_draw(
                &player,
                &Deck::from_cards(&cards!("3H 6D")).unwrap(),
                Positions::all(),
                1,
                9
            ),
            Err(Error::InsufficientCards {
                needed: 5,
                available: 2
            })
        );
    }

    #[test]
    fn buy_policy_test() {
        let remaining = Deck::from_cards(&cards!("AH")).unwrap();
        let player = hand!("AS KD 9C 7H 4S");

        let rules = RuleConfiguration::default();
        let estimate = RecommendationEngine::new(&rules)
            .estimate_buy(&player, &remaining, 10, 3)
            .unwrap();
        // Pair of aces plus the Ace-King high card, less the buy cost.
        assert_relative_eq!(estimate.ev, 2.0);

        let rules = RuleConfiguration {
            six_card_policy: SixCardPolicy::BestOnly,
            ..RuleConfiguration::default()
        };
        let estimate = RecommendationEngine::new(&rules)
            .estimate_buy(&player, &remaining, 10, 3)
            .unwrap();
        assert_relative_eq!(estimate.ev, 1.0);
    }

    #[test]
    fn deterministic_test() {
        let rules = RuleConfiguration::default();
        let engine = RecommendationEngine::new(&rules);
        let player = hand!("JS JD 8C 5H 2S");
        let remaining = unseen(&player);

        let first = engine.recommend(&player, &remaining, 400, 1234).unwrap();
        let second = engine.recommend(&player, &remaining, 400, 1234).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.stand.ev.to_bits(), second.stand.ev.to_bits());
        assert_eq!(first.draw.ev.to_bits(), second.draw.ev.to_bits());
        assert_eq!(first.buy.ev.to_bits(), second.buy.ev.to_bits());
        assert_eq!(first.buy.trials, 400);
        assert_eq!(first.draw.trials, 100);
    }

    #[test]
    fn draw_trials_below_buy_trials_test() {
        let rules = RuleConfiguration {
            draw_trials: Some(5_000),
            ..RuleConfiguration::default()
        };
        let engine = RecommendationEngine::new(&rules);
        let player = hand!("JS JD 8C 5H 2S");
        let remaining = unseen(&player);

        let result = engine.recommend(&player, &remaining, 100, 1).unwrap();
        assert_eq!(result.buy.trials, 100);
        assert_eq!(result.draw.trials, 99);

        let result = engine.recommend(&player, &remaining, 2, 1).unwrap();
        assert_eq!(result.buy.trials, 2);
        assert_eq!(result.draw.trials, 1);
    }

    #[test]
    fn royal_flush_stands_test() {
        let rules = RuleConfiguration {
            six_card_policy: SixCardPolicy::BestOnly,
            ..RuleConfiguration::default()
        };
        let engine = RecommendationEngine::new(&rules);
        let player = hand!("AS KS QS JS TS");
        let result = engine.recommend(&player, &unseen(&player), 200, 5).unwrap();
        assert_eq!(result.action, Action::Stand);
        assert_eq!(result.label(), "stand");
        assert_relative_eq!(result.stand.ev, 200.0);
        assert_relative_eq!(result.buy.ev, 199.0);
    }

    #[test]
    fn weak_hand_draws_test() {
        let rules = RuleConfiguration::default();
        let engine = RecommendationEngine::new(&rules);
        let player = hand!("9S 7D 5C 3H 2S");
        let result = engine.recommend(&player, &unseen(&player), 400, 77).unwrap();
        assert_relative_eq!(result.stand.ev, 0.0);
        assert!(result.draw.ev > result.stand.ev);
        assert_ne!(result.action, Action::Stand);
    }

    #[test]
    fn ties_prefer_buy_test() {
        let rules = RuleConfiguration {
            payouts: rules_with_zero_payouts(),
            ak_bonus: 0,
            exchange_cost: 0,
            buy_cost: 0,
            ..RuleConfiguration::default()
        };
        let engine = RecommendationEngine::new(&rules);
        let player = hand!("9S 7D 5C 3H 2S");
        let result = engine.recommend(&player, &unseen(&player), 20, 1).unwrap();
        assert_eq!(result.action, Action::Buy);
        // The first subset wins ties among exchanges.
        assert_eq!(result.draw.action, Action::Draw(Positions::First));
    }

    #[test]
    fn invalid_input_test() {
        let rules = RuleConfiguration::default();
        let engine = RecommendationEngine::new(&rules);
        let player = hand!("9S 7D 5C 3H 2S");

        assert!(matches!(
            engine.recommend(&player, &unseen(&player), 0, 1),
            Err(Error::InvalidConfiguration(_))
        ));
        assert!(matches!(
            engine.recommend(&player, &unseen(&player), 1, 1),
            Err(Error::InvalidConfiguration(_))
        ));
        assert_eq!(
            engine.recommend(&player, &cards!("AH AD AC KS"), 10, 1),
            Err(Error::InsufficientCards {
                needed: 5,
                available: 4
            })
        );
        assert_eq!(
            engine.recommend(&player, &cards!("AH AD AC KS 9S"), 10, 1),
            Err(Error::DuplicateCard(crate::card!("9S")))
        );
        assert_eq!(
            engine.recommend(&player, &cards!("AH AD AC KS AH"), 10, 1),
            Err(Error::DuplicateCard(crate::card!("AH")))
        );
        assert!(matches!(
            engine.recommend(&hand!("9S 7D 5C"), &CardCollection::empty(), 10, 1),
            Err(Error::InvalidHandSize { .. })
        ));
    }
}
