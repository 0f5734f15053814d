use static_assertions::const_assert;
use strum::IntoEnumIterator;

use super::cards::{Card, CardView, Rank, Suit};
use super::error::{Error, Result};
#[cfg(test)]
use crate::{card, cards};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct CardSet(u64);

#[rustfmt::skip]
impl CardSet {
    const SPADES_MASK:   u64 = 0x0000_0000_0000_1fff;
    const HEARTS_MASK:   u64 = 0x0000_0000_1fff_0000;
    const DIAMONDS_MASK: u64 = 0x0000_1fff_0000_0000;
    const CLUBS_MASK:    u64 = 0x1fff_0000_0000_0000;

    const ALL_CARDS_MASK: u64 = Self::SPADES_MASK | Self::HEARTS_MASK | Self::DIAMONDS_MASK | Self::CLUBS_MASK;

    const MASK_TABLE: [u64; 4] = [
        Self::SPADES_MASK,
        Self::HEARTS_MASK,
        Self::DIAMONDS_MASK,
        Self::CLUBS_MASK,
    ];
}

const_assert!(CardSet::SPADES_MASK.count_ones() == 13);
const_assert!(CardSet::HEARTS_MASK.count_ones() == 13);
const_assert!(CardSet::DIAMONDS_MASK.count_ones() == 13);
const_assert!(CardSet::CLUBS_MASK.count_ones() == 13);
const_assert!(CardSet::ALL_CARDS_MASK.count_ones() == 52);

#[allow(clippy::multiple_inherent_impl)]
impl CardSet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn full() -> Self {
        Self(Self::ALL_CARDS_MASK)
    }

    /// Collect cards into a set, failing on the first card seen twice.
    pub fn distinct(cards: &(impl CardView + ?Sized)) -> Result<Self> {
        let mut cardset = Self::empty();
        for &card in cards.view() {
            if cardset.contains(card) {
                return Err(Error::DuplicateCard(card));
            }
            cardset.insert(card);
        }
        Ok(cardset)
    }

    pub fn count(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn count_in_suit(self, suit: Suit) -> usize {
        (self.0 & Self::MASK_TABLE[suit as usize]).count_ones() as usize
    }

    pub fn insert(&mut self, card: Card) {
        self.0 |= Self::get_mask(card);
    }

    pub fn remove(&mut self, card: Card) {
        self.0 &= Self::ALL_CARDS_MASK & !Self::get_mask(card);
    }

    pub fn contains(self, card: Card) -> bool {
        (self.0 & Self::get_mask(card)) > 0
    }

    /// Join two disjoint sets. A shared card is reported as a duplicate.
    pub fn union_disjoint(self, other: Self) -> Result<Self> {
        match Self(self.0 & other.0).first() {
            Some(card) => Err(Error::DuplicateCard(card)),
            None => Ok(Self(self.0 | other.0)),
        }
    }

    /// Lowest-indexed card in the set.
    pub fn first(self) -> Option<Card> {
        if self.0 == 0 {
            return None;
        }
        let index = self.0.trailing_zeros() as usize;
        let suit = Suit::iter().nth(index >> 4)?;
        let rank = Rank::iter().nth(index & 0xf)?;
        Some(Card { rank, suit })
    }

    #[inline]
    pub fn index_of(card: Card) -> usize {
        ((card.suit as u8 as usize) << 4) | (card.rank as u8 as usize)
    }

    #[inline]
    fn get_mask(card: Card) -> u64 {
        1_u64 << Self::index_of(card)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    fn counting_test() {
        let mut cardset = CardSet::full();

        assert_eq!(cardset.count(), 52);
        assert_eq!(cardset.count_in_suit(Suit::Spades), 13);
        assert_eq!(cardset.count_in_suit(Suit::Clubs), 13);
        assert_eq!(cardset.count_in_suit(Suit::Hearts), 13);
        assert_eq!(cardset.count_in_suit(Suit::Diamonds), 13);

        assert!(cardset.contains(card!("KH")));
        cardset.remove(card!("KH"));
        assert!(!cardset.contains(card!("KH")));
        assert_eq!(cardset.count(), 51);
        assert_eq!(cardset.count_in_suit(Suit::Hearts), 12);
    }

    #[test]
    fn distinct_test() {
        let cardset = CardSet::distinct(&cards!("KH TS 9D 8C")).unwrap();
        assert_eq!(cardset.count(), 4);
        assert_eq!(
            CardSet::distinct(&cards!("KH TS 9D 8C 8C TS")),
            Err(Error::DuplicateCard(card!("8C")))
        );
    }

    #[test]
    fn union_disjoint_test() {
        let left = CardSet::distinct(&cards!("AS KH")).unwrap();
        let right = CardSet::distinct(&cards!("2C 3C")).unwrap();
        assert_eq!(left.union_disjoint(right).unwrap().count(), 4);

        let overlapping = CardSet::distinct(&cards!("QD KH")).unwrap();
        assert_eq!(
            left.union_disjoint(overlapping),
            Err(Error::DuplicateCard(card!("KH")))
        );
    }

    #[test]
    fn first_test() {
        assert_eq!(CardSet::empty().first(), None);
        let cardset = CardSet::distinct(&cards!("AC 7D")).unwrap();
        assert_eq!(cardset.first(), Some(card!("7D")));
        assert_eq!(CardSet::full().first(), Some(card!("2S")));
    }
}
