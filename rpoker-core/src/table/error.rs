use thiserror::Error;

use crate::table::cards::Card;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("a hand must have exactly {expected} cards, found {found}")]
    InvalidHandSize { expected: usize, found: usize },
    #[error("card {0} appears more than once")]
    DuplicateCard(Card),
    #[error("needed {needed} cards but only {available} are left")]
    InsufficientCards { needed: usize, available: usize },
    #[error("invalid rule configuration: {0}")]
    InvalidConfiguration(String),
    #[error("`{0}` is not a card (expected a rank from 23456789TJQKA and a suit from SHDC)")]
    InvalidCard(String),
}

pub type Result<T> = std::result::Result<T, Error>;
