//! Rules engine and advisor for Russian poker, a five-card stud variant
//! played against the house.
//!
//! [`table::hand_evaluator`] classifies hands, [`table::settlement`] applies
//! the house rules to a player and dealer hand, and
//! [`table::recommendation`] estimates by sampling whether the player should
//! stand, exchange cards or buy a sixth card.

pub mod prelude;
pub mod table;
