//! Dealing a round around cards the player already knows.

use rand::Rng;
use tracing::debug;

use crate::table::cards::{Card, CardView, Deck, Hand, HAND_SIZE};
use crate::table::error::{Error, Result};
use crate::table::rules::{Elections, RuleConfiguration};
use crate::table::settlement::{RoundResult, SettlementEngine};

/// Cards the player cannot see: the full deck less their hand and the
/// dealer's up-card.
pub fn unseen_cards(player: &Hand, dealer_upcard: Option<Card>) -> Result<Deck> {
    let mut deck = Deck::base_deck();
    deck.remove_all_known(player)?;
    if let Some(upcard) = dealer_upcard {
        deck.remove_known(upcard)?;
    }
    Ok(deck)
}

/// Shuffle the unseen cards, complete the dealer's hand behind the up-card
/// and settle. The rest of the shuffled deck is the source for a dealer buy.
pub fn deal_round(
    player: &Hand,
    dealer_upcard: Card,
    elections: Elections,
    rules: &RuleConfiguration,
    rng: &mut impl Rng,
) -> Result<RoundResult> {
    if player.len() != HAND_SIZE {
        return Err(Error::InvalidHandSize {
            expected: HAND_SIZE,
            found: player.len(),
        });
    }

    let mut deck = unseen_cards(player, Some(dealer_upcard))?;
    deck.shuffle(rng);

    let mut dealer = Hand::empty();
    dealer.push(dealer_upcard)?;
    for card in deck.draw_n(HAND_SIZE - 1)?.view() {
        dealer.push(*card)?;
    }
    debug!(player = %player, dealer = %dealer, ?elections, "dealt round");

    SettlementEngine::new(rules).settle(player, dealer, &mut deck, elections)
}

/// Deal a completely random round: five player cards and a dealer up-card
/// from a fresh shuffled deck.
pub fn random_round(
    elections: Elections,
    rules: &RuleConfiguration,
    rng: &mut impl Rng,
) -> Result<RoundResult> {
    let mut deck = Deck::shuffled(rng);
    let player = Hand::from_slice(deck.draw_n(HAND_SIZE)?.view())?;
    let upcard = deck.draw().ok_or(Error::InsufficientCards {
        needed: 1,
        available: 0,
    })?;
    deal_round(&player, upcard, elections, rules, rng)
}

#[cfg(test)]
mod tests {
    use rand::{rngs::SmallRng, SeedableRng};

    use super::*;
    use crate::table::cardset::CardSet;
    use crate::{card, hand};

    #[test]
    fn unseen_cards_test() {
        let player = hand!("AS KH 9D 7C 2S");
        let deck = unseen_cards(&player, Some(card!("QC"))).unwrap();
        assert_eq!(deck.count(), 46);
        assert!(player.view().iter().all(|card| !deck.contains(*card)));
        assert!(!deck.contains(card!("QC")));

        assert_eq!(
            unseen_cards(&player, Some(card!("9D"))).unwrap_err(),
            Error::DuplicateCard(card!("9D"))
        );
    }

    #[test]
    fn dealer_keeps_upcard_test() {
        let rules = RuleConfiguration::default();
        let mut rng = SmallRng::seed_from_u64(17);
        let player = hand!("AS KH 9D 7C 2S");
        for _ in 0..200 {
            let elections = Elections::empty();
            let result = deal_round(&player, card!("QC"), elections, &rules, &mut rng).unwrap();
            assert!(result.dealer_hand.view().contains(&card!("QC")));
            let dealt = CardSet::distinct(&player)
                .unwrap()
                .union_disjoint(CardSet::distinct(&result.dealer_hand).unwrap());
            assert!(dealt.is_ok());
        }
    }

    #[test]
    fn deal_is_reproducible_test() {
        let rules = RuleConfiguration::default();
        let player = hand!("TS TD 8C 6H 3D");
        let play = |seed| {
            let mut rng = SmallRng::seed_from_u64(seed);
            deal_round(&player, card!("AH"), Elections::all(), &rules, &mut rng).unwrap()
        };
        assert_eq!(play(99), play(99));
    }

    #[test]
    fn accounting_balances_test() {
        let rules = RuleConfiguration::default();
        let mut rng = SmallRng::seed_from_u64(2024);
        let choices = [
            Elections::empty(),
            Elections::Buy,
            Elections::Insurance,
            Elections::all(),
        ];
        for round in 0..2_000 {
            let elections = choices[round % choices.len()];
            let result = random_round(elections, &rules, &mut rng).unwrap();
            assert_eq!(
                result.net_gain,
                result.payout + result.insurance_payout - result.cost
            );
            assert!(result.cost >= rules.ante + rules.bet);
            assert!(!result.dealer_bought || elections.contains(Elections::Buy));
            if result.insurance_payout > 0 {
                assert!(elections.contains(Elections::Insurance));
            }
        }
    }

    #[test]
    fn bad_player_hand_test() {
        let rules = RuleConfiguration::default();
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(matches!(
            deal_round(&hand!("AS KH"), card!("QC"), Elections::empty(), &rules, &mut rng),
            Err(Error::InvalidHandSize { .. })
        ));
        assert_eq!(
            deal_round(
                &hand!("AS KH 9D 7C 2S"),
                card!("AS"),
                Elections::empty(),
                &rules,
                &mut rng
            ),
            Err(Error::DuplicateCard(card!("AS")))
        );
    }
}
