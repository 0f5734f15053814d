pub mod cards;
pub(crate) mod cardset;
pub mod error;
pub mod hand_evaluator;
pub mod recommendation;
pub mod round;
pub mod rules;
pub mod scorer;
pub mod settlement;
