use std::fmt;
use std::str::FromStr;

use itertools::Itertools;
use lazy_static::lazy_static;
use rand::prelude::{Rng, SliceRandom};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

use crate::table::{
    cardset::CardSet,
    error::{Error, Result},
};

/// Number of cards in a scored hand.
pub const HAND_SIZE: usize = 5;

#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, EnumIter)]
#[repr(u8)]
pub enum Suit {
    Spades = 0,
    Hearts = 1,
    Diamonds = 2,
    Clubs = 3,
}

impl Suit {
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'S' => Some(Self::Spades),
            'H' => Some(Self::Hearts),
            'D' => Some(Self::Diamonds),
            'C' => Some(Self::Clubs),
            _ => None,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Self::Spades => 'S',
            Self::Hearts => 'H',
            Self::Diamonds => 'D',
            Self::Clubs => 'C',
        }
    }
}

#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, EnumIter)]
#[repr(u8)]
pub enum Rank {
    Deuce = 0,
    Three = 1,
    Four = 2,
    Five = 3,
    Six = 4,
    Seven = 5,
    Eight = 6,
    Nine = 7,
    Ten = 8,
    Jack = 9,
    Queen = 10,
    King = 11,
    Ace = 12,
}

impl Rank {
    /// Face value with the Ace high, `2..=14`.
    pub fn value(self) -> u8 {
        self as u8 + 2
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            '2' => Some(Self::Deuce),
            '3' => Some(Self::Three),
            '4' => Some(Self::Four),
            '5' => Some(Self::Five),
            '6' => Some(Self::Six),
            '7' => Some(Self::Seven),
            '8' => Some(Self::Eight),
            '9' => Some(Self::Nine),
            'T' => Some(Self::Ten),
            'J' => Some(Self::Jack),
            'Q' => Some(Self::Queen),
            'K' => Some(Self::King),
            'A' => Some(Self::Ace),
            _ => None,
        }
    }

    pub fn to_char(self) -> char {
        b"23456789TJQKA"[self as usize] as char
    }
}

#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    /// Convert a shorthand identifier into a card. Panics if the identifier
    /// is incorrect. This exists only for test-writing; use `str::parse` for
    /// untrusted input.
    ///
    /// ```
    /// # use rpoker_core::prelude::{Card, Suit, Rank};
    /// let a = Card::from_ident("KH");
    /// let b = Card {
    ///     rank: Rank::King,
    ///     suit: Suit::Hearts,
    /// };
    /// assert_eq!(a, b);
    /// ```
    pub fn from_ident(ident: &str) -> Self {
        match ident.parse() {
            Ok(card) => card,
            Err(err) => panic!("{err}"),
        }
    }
}

impl FromStr for Card {
    type Err = Error;

    /// ```
    /// # use rpoker_core::prelude::{Card, Error};
    /// assert_eq!("td".parse::<Card>().unwrap().to_string(), "TD");
    /// assert_eq!("1S".parse::<Card>(), Err(Error::InvalidCard("1S".to_owned())));
    /// ```
    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(rank), Some(suit), None) => Rank::from_char(rank)
                .zip(Suit::from_char(suit))
                .map(|(rank, suit)| Self { rank, suit })
                .ok_or_else(|| Error::InvalidCard(s.to_owned())),
            _ => Err(Error::InvalidCard(s.to_owned())),
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank.to_char(), self.suit.to_char())
    }
}

impl Serialize for Card {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Card {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let ident = String::deserialize(deserializer)?;
        ident.parse().map_err(de::Error::custom)
    }
}

#[macro_export]
macro_rules! card {
    ($ident:literal) => {
        $crate::table::cards::Card::from_ident($ident)
    };
}

pub trait CardView {
    fn view(&self) -> &[Card];
}

impl CardView for [Card] {
    fn view(&self) -> &[Card] {
        self
    }
}

impl CardView for Vec<Card> {
    fn view(&self) -> &[Card] {
        self
    }
}

impl<V: CardView + ?Sized> CardView for &V {
    fn view(&self) -> &[Card] {
        (**self).view()
    }
}

/// Render cards as space separated codes, e.g. `AS KH 9D`.
pub fn format_cards(cards: &(impl CardView + ?Sized)) -> String {
    cards.view().iter().join(" ")
}

const NOT_IN_DECK: u8 = u8::MAX;

/// A draw source. Cards live in an index-addressable vector (the top of the
/// deck is the end of the vector); a bitset and a position table give O(1)
/// membership tests and removal of arbitrary known cards.
#[derive(Clone, Debug)]
pub struct Deck {
    cards: Vec<Card>,
    members: CardSet,
    positions: [u8; 64],
}

lazy_static! {
    static ref BASE_DECK_CARDS: Vec<Card> = {
        let mut cards = Vec::with_capacity(52);
        for suit in Suit::iter() {
            for rank in Rank::iter() {
                cards.push(Card { rank, suit });
            }
        }
        cards
    };
}

impl Deck {
    pub fn base_deck() -> Self {
        Self::indexed(BASE_DECK_CARDS.clone())
    }

    /// Build a deck from arbitrary cards, rejecting repeats.
    pub fn from_cards(cards: &(impl CardView + ?Sized)) -> Result<Self> {
        CardSet::distinct(cards)?;
        Ok(Self::indexed(cards.view().to_vec()))
    }

    fn indexed(cards: Vec<Card>) -> Self {
        let mut deck = Self {
            cards,
            members: CardSet::empty(),
            positions: [NOT_IN_DECK; 64],
        };
        deck.reindex();
        deck
    }

    #[allow(clippy::cast_possible_truncation)]
    fn reindex(&mut self) {
        self.members = CardSet::empty();
        self.positions = [NOT_IN_DECK; 64];
        for (position, &card) in self.cards.iter().enumerate() {
            self.members.insert(card);
            self.positions[CardSet::index_of(card)] = position as u8;
        }
    }

    pub fn shuffle(&mut self, rng: &mut impl Rng) {
        self.cards.shuffle(rng);
        self.reindex();
    }

    pub fn shuffled(rng: &mut impl Rng) -> Self {
        let mut deck = Self::base_deck();
        deck.shuffle(rng);
        deck
    }

    pub fn contains(&self, card: Card) -> bool {
        self.members.contains(card)
    }

    /// Take a specific card out of the deck. Returns `false` if it was not
    /// there.
    #[allow(clippy::cast_possible_truncation)]
    pub fn remove(&mut self, card: Card) -> bool {
        if !self.contains(card) {
            return false;
        }

        let position = self.positions[CardSet::index_of(card)] as usize;
        self.cards.swap_remove(position);
        if let Some(&moved) = self.cards.get(position) {
            self.positions[CardSet::index_of(moved)] = position as u8;
        }
        self.positions[CardSet::index_of(card)] = NOT_IN_DECK;
        self.members.remove(card);
        true
    }

    /// Remove a card that is known to be held elsewhere. A card missing from
    /// the deck means it was already dealt, so that is a duplicate.
    pub fn remove_known(&mut self, card: Card) -> Result<()> {
        if self.remove(card) {
            Ok(())
        } else {
            Err(Error::DuplicateCard(card))
        }
    }

    pub fn remove_all_known(&mut self, cards: &(impl CardView + ?Sized)) -> Result<()> {
        cards
            .view()
            .iter()
            .try_for_each(|&card| self.remove_known(card))
    }

    pub fn draw(&mut self) -> Option<Card> {
        let card = self.cards.pop()?;
        self.members.remove(card);
        self.positions[CardSet::index_of(card)] = NOT_IN_DECK;
        Some(card)
    }

    pub fn draw_n(&mut self, n: usize) -> Result<CardCollection> {
        self.ensure_available(n)?;
        Ok((0..n).filter_map(|_| self.draw()).collect())
    }

    /// Sample `n` distinct cards without taking them out of the deck. Every
    /// call is an independent draw from the same remainder.
    pub fn sample(&self, n: usize, rng: &mut impl Rng) -> Result<CardCollection> {
        self.ensure_available(n)?;
        Ok(self.cards.choose_multiple(rng, n).copied().collect())
    }

    fn ensure_available(&self, needed: usize) -> Result<()> {
        if needed > self.count() {
            Err(Error::InsufficientCards {
                needed,
                available: self.count(),
            })
        } else {
            Ok(())
        }
    }

    pub fn count(&self) -> usize {
        self.cards.len()
    }
}

impl CardView for Deck {
    fn view(&self) -> &[Card] {
        &self.cards
    }
}

#[derive(Clone, Debug)]
pub struct Hand {
    pub(crate) cards: heapless::Vec<Card, HAND_SIZE>,
}

impl Hand {
    pub fn empty() -> Self {
        Self {
            cards: heapless::Vec::new(),
        }
    }

    pub fn from_slice(cards: &[Card]) -> Result<Self> {
        Ok(Self {
            cards: heapless::Vec::from_slice(cards).map_err(|()| Error::InvalidHandSize {
                expected: HAND_SIZE,
                found: cards.len(),
            })?,
        })
    }

    /// Convert a series of shorthand identifiers into a `Hand`.
    /// Panics if the input is incorrect. This exists only for test-writing.
    pub fn from_idents(idents: &str) -> Self {
        match Self::from_slice(CardCollection::from_idents(idents).view()) {
            Ok(hand) => hand,
            Err(err) => panic!("{err}"),
        }
    }

    pub fn push(&mut self, card: Card) -> Result<()> {
        self.cards.push(card).map_err(|_| Error::InvalidHandSize {
            expected: HAND_SIZE,
            found: HAND_SIZE + 1,
        })
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Swap the card at `position` for `card`, returning the discarded one.
    pub fn replace(&mut self, position: usize, card: Card) -> Option<Card> {
        self.cards
            .get_mut(position)
            .map(|slot| std::mem::replace(slot, card))
    }

    pub fn has_ace_king(&self) -> bool {
        let has = |rank| self.cards.iter().any(|card| card.rank == rank);
        has(Rank::Ace) && has(Rank::King)
    }

    /// Position of the lowest-valued card; the first one wins ties.
    pub fn lowest_position(&self) -> Option<usize> {
        self.cards.iter().position_min_by_key(|card| card.rank)
    }
}

#[macro_export]
macro_rules! hand {
    ($ident:literal) => {
        $crate::table::cards::Hand::from_idents($ident)
    };
}

impl PartialEq for Hand {
    fn eq(&self, other: &Self) -> bool {
        self.cards == other.cards
    }
}

impl CardView for Hand {
    fn view(&self) -> &[Card] {
        &self.cards
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_cards(self))
    }
}

impl Serialize for Hand {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.cards.iter())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CardCollection {
    cards: Vec<Card>,
}

impl CardCollection {
    pub fn empty() -> Self {
        Self { cards: Vec::new() }
    }

    /// Convert a series of shorthand identifiers into a `CardCollection`.
    /// Panics if the input is incorrect. This exists only for test-writing.
    ///
    /// ```
    /// # use rpoker_core::prelude::{Suit, Rank, Card, CardCollection, CardView};
    /// let cards = CardCollection::from_idents("KH TD JS 2C");
    /// assert_eq!(cards.view()[2], Card {
    ///     rank: Rank::Jack,
    ///     suit: Suit::Spades,
    /// });
    /// ```
    pub fn from_idents(idents: &str) -> Self {
        idents
            .split_ascii_whitespace()
            .map(Card::from_ident)
            .collect()
    }

    /// Parse whitespace or comma separated card codes.
    pub fn parse(codes: &str) -> Result<Self> {
        codes
            .split(|c: char| c.is_ascii_whitespace() || c == ',')
            .filter(|code| !code.is_empty())
            .map(str::parse)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

#[macro_export]
macro_rules! cards {
    ($ident:literal) => {
        $crate::table::cards::CardCollection::from_idents($ident)
    };
}

impl std::iter::FromIterator<Card> for CardCollection {
    fn from_iter<T: IntoIterator<Item = Card>>(iter: T) -> Self {
        Self {
            cards: iter.into_iter().collect(),
        }
    }
}

impl CardView for CardCollection {
    fn view(&self) -> &[Card] {
        &self.cards
    }
}

#[derive(
    Copy,
    Clone,
    Debug,
    Hash,
    PartialOrd,
    Ord,
    PartialEq,
    Eq,
    EnumIter,
    Display,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum HandCategory {
    HighCard = 0,
    OnePair = 1,
    TwoPair = 2,
    ThreeOfAKind = 3,
    Straight = 4,
    Flush = 5,
    FullHouse = 6,
    FourOfAKind = 7,
    StraightFlush = 8,
    RoyalFlush = 9,
}
