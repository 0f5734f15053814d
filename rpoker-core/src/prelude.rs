pub use crate::table::cards::{
    format_cards, Card, CardCollection, CardView, Deck, Hand, HandCategory, Rank, Suit, HAND_SIZE,
};
pub use crate::table::error::{Error, Result};
pub use crate::table::hand_evaluator::{EvaluationResult, HandEvaluator};
pub use crate::table::recommendation::{
    Action, BranchEstimate, Positions, RecommendationEngine, RecommendationResult,
};
pub use crate::table::round::{deal_round, random_round, unseen_cards};
pub use crate::table::rules::{
    Chips, Elections, InsuranceBasis, QualificationRule, RuleConfiguration, SixCardPolicy,
    TieBreak,
};
pub use crate::table::scorer::Scorer;
pub use crate::table::settlement::{RoundResult, SettlementEngine, Winner};
