use std::cmp::Ordering;

use itertools::Itertools;
use tracing::trace;

use crate::table::cards::{Card, CardView, HandCategory, Rank, HAND_SIZE};
use crate::table::cardset::CardSet;
use crate::table::error::{Error, Result};
#[cfg(test)]
use crate::{cards, hand};

/// Category and strength of a five-card hand.
///
/// `strength` only encodes the category, so two hands of the same category
/// are equally strong. `ranks` keeps the face values ordered by multiplicity
/// and then value (the wheel's Ace counted as 1) for callers that opt into
/// kicker comparison.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EvaluationResult {
    pub category: HandCategory,
    pub strength: u32,
    pub ranks: [u8; HAND_SIZE],
}

impl EvaluationResult {
    /// Strength first, then the ordered face values.
    pub fn cmp_with_kickers(&self, other: &Self) -> Ordering {
        self.strength
            .cmp(&other.strength)
            .then_with(|| self.ranks.cmp(&other.ranks))
    }
}

#[derive(Debug)]
pub struct HandEvaluator {
    /// Face values, highest first.
    values: [u8; HAND_SIZE],
    /// Rank multiplicities, largest first.
    multiplicities: Vec<usize>,
    /// Face values grouped by multiplicity, then by value.
    grouped: [u8; HAND_SIZE],
    cardset: CardSet,
    first_suit_count: usize,
}

impl HandEvaluator {
    fn new(cards: &[Card]) -> Result<Self> {
        if cards.len() != HAND_SIZE {
            return Err(Error::InvalidHandSize {
                expected: HAND_SIZE,
                found: cards.len(),
            });
        }

        let cardset = CardSet::distinct(cards)?;

        let mut values = [0; HAND_SIZE];
        for (slot, value) in values
            .iter_mut()
            .zip(cards.iter().map(|card| card.rank.value()).sorted_by(|a, b| b.cmp(a)))
        {
            *slot = value;
        }

        let counts = values.iter().copied().counts();
        let multiplicities = counts.values().copied().sorted_by(|a, b| b.cmp(a)).collect();

        let mut grouped = [0; HAND_SIZE];
        let order = counts
            .iter()
            .sorted_by(|(value_a, count_a), (value_b, count_b)| {
                count_b.cmp(count_a).then(value_b.cmp(value_a))
            })
            .flat_map(|(&value, &count)| std::iter::repeat(value).take(count));
        for (slot, value) in grouped.iter_mut().zip(order) {
            *slot = value;
        }

        Ok(Self {
            values,
            multiplicities,
            grouped,
            cardset,
            first_suit_count: cardset.count_in_suit(cards[0].suit),
        })
    }

    fn is_flush(&self) -> bool {
        self.first_suit_count == HAND_SIZE
    }

    fn is_wheel(&self) -> bool {
        self.values == [Rank::Ace.value(), 5, 4, 3, 2]
    }

    fn is_straight(&self) -> bool {
        self.is_wheel()
            || self
                .values
                .iter()
                .tuple_windows()
                .all(|(high, low)| *high == *low + 1)
    }

    /// Top card of the hand for straight purposes.
    fn top_value(&self) -> u8 {
        if self.is_wheel() {
            5
        } else {
            self.values[0]
        }
    }

    fn has_multiplicities(&self, expected: &[usize]) -> bool {
        self.multiplicities == expected
    }

    fn category(&self) -> HandCategory {
        let flush = self.is_flush();
        let straight = self.is_straight();

        if straight && flush && self.top_value() == Rank::Ace.value() {
            HandCategory::RoyalFlush
        } else if straight && flush {
            HandCategory::StraightFlush
        } else if self.multiplicities[0] == 4 {
            HandCategory::FourOfAKind
        } else if self.has_multiplicities(&[3, 2]) {
            HandCategory::FullHouse
        } else if flush {
            HandCategory::Flush
        } else if straight {
            HandCategory::Straight
        } else if self.has_multiplicities(&[3, 1, 1]) {
            HandCategory::ThreeOfAKind
        } else if self.has_multiplicities(&[2, 2, 1]) {
            HandCategory::TwoPair
        } else if self.has_multiplicities(&[2, 1, 1, 1]) {
            HandCategory::OnePair
        } else {
            HandCategory::HighCard
        }
    }

    fn evaluate(&self) -> EvaluationResult {
        let category = self.category();
        let ranks = if self.is_wheel() {
            [5, 4, 3, 2, 1]
        } else {
            self.grouped
        };

        trace!(?category, ?ranks, cards = self.cardset.count(), "evaluated hand");

        EvaluationResult {
            category,
            strength: category as u32,
            ranks,
        }
    }

    /// Classify exactly five distinct cards.
    pub fn evaluate_poker_hand(card_view: &(impl CardView + ?Sized)) -> Result<EvaluationResult> {
        let evaluator = Self::new(card_view.view())?;
        Ok(evaluator.evaluate())
    }
}
