use std::collections::VecDeque;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::types::{hand_total, Card, Outcome, CARDS_PER_DECK};

/// One completed hand with the cards each side received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealtHand {
    pub player_cards: Vec<Card>,
    pub banker_cards: Vec<Card>,
    pub player_total: u8,
    pub banker_total: u8,
    pub outcome: Outcome,
}

impl DealtHand {
    pub fn is_natural(&self) -> bool {
        let player_two = hand_total(&self.player_cards[..2.min(self.player_cards.len())]);
        let banker_two = hand_total(&self.banker_cards[..2.min(self.banker_cards.len())]);
        player_two >= 8 || banker_two >= 8
    }
}

/// Player draws a third card on 0-5.
pub fn player_draws(player_total: u8) -> bool {
    player_total <= 5
}

/// Banker third-card rule. `player_third` is the point value of the Player's
/// third card, or `None` when the Player stood.
pub fn banker_draws(banker_total: u8, player_third: Option<u8>) -> bool {
    match player_third {
        None => banker_total <= 5,
        Some(card) => match banker_total {
            0..=2 => true,
            3 => card != 8,
            4 => (2..=7).contains(&card),
            5 => (4..=7).contains(&card),
            6 => (6..=7).contains(&card),
            _ => false,
        },
    }
}

/// Multi-deck shoe with burn procedure and cut-card protocol.
pub struct Shoe {
    num_decks: usize,
    cut_card_depth: usize,
    rng: ChaCha8Rng,
    cards: VecDeque<Card>,
    burned: usize,
    cards_dealt: usize,
    initial_size_after_burn: usize,
    cut_index: usize,
    cut_card_reached: bool,
    play_one_more_hand: bool,
    shoes_started: u64,
}

impl Shoe {
    /// Builds and shuffles a shoe. A `seed` pins the shuffle order.
    pub fn new(num_decks: usize, cut_card_depth: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let mut shoe = Self {
            num_decks: num_decks.max(1),
            cut_card_depth,
            rng,
            cards: VecDeque::new(),
            burned: 0,
            cards_dealt: 0,
            initial_size_after_burn: 0,
            cut_index: 0,
            cut_card_reached: false,
            play_one_more_hand: false,
            shoes_started: 0,
        };
        shoe.shuffle_and_reset();
        shoe
    }

    /// A shoe holding exactly `cards` in dealing order, no shuffle and no burn.
    #[cfg(test)]
    pub(crate) fn stacked(cards: Vec<Card>, cut_card_depth: usize) -> Self {
        let len = cards.len();
        Self {
            num_decks: 1,
            cut_card_depth,
            rng: ChaCha8Rng::seed_from_u64(0),
            cards: cards.into(),
            burned: 0,
            cards_dealt: 0,
            initial_size_after_burn: len,
            cut_index: len.saturating_sub(cut_card_depth + 1),
            cut_card_reached: false,
            play_one_more_hand: false,
            shoes_started: 1,
        }
    }

    pub fn shuffle_and_reset(&mut self) {
        let mut cards: Vec<Card> = (0..self.num_decks).flat_map(|_| Card::deck()).collect();
        cards.shuffle(&mut self.rng);
        self.cards = cards.into();

        self.burned = self.burn();
        self.initial_size_after_burn = self.cards.len();
        self.cut_index = self
            .initial_size_after_burn
            .saturating_sub(self.cut_card_depth + 1);
        self.cards_dealt = 0;
        self.cut_card_reached = false;
        self.play_one_more_hand = false;
        self.shoes_started += 1;

        info!(
            shoe = self.shoes_started,
            burned = self.burned,
            remaining = self.initial_size_after_burn,
            cut_index = self.cut_index,
            "Shoe shuffled"
        );
    }

    /// Reveals the top card and burns as many more as its pip value.
    fn burn(&mut self) -> usize {
        let Some(first) = self.cards.pop_front() else {
            return 0;
        };
        let extra = first.rank.pip_value() as usize;
        let mut burned = 1;
        for _ in 0..extra {
            if self.cards.pop_front().is_none() {
                break;
            }
            burned += 1;
        }
        debug!("Burn card {} revealed, {} cards burned", first, burned);
        burned
    }

    fn deal_card(&mut self) -> Option<Card> {
        if self.cards.is_empty() {
            self.cut_card_reached = true;
            return None;
        }
        if !self.cut_card_reached && self.cards_dealt > self.cut_index {
            self.cut_card_reached = true;
            self.play_one_more_hand = true;
            debug!(dealt = self.cards_dealt, "Cut card reached");
        }
        let card = self.cards.pop_front()?;
        self.cards_dealt += 1;
        Some(card)
    }

    pub fn needs_shuffle(&self) -> bool {
        self.cut_card_reached && !self.play_one_more_hand
    }

    /// Deals one hand under the standard drawing rules.
    /// `None` means the shoe must be reshuffled before dealing again.
    pub fn deal_hand(&mut self) -> Option<DealtHand> {
        if self.needs_shuffle() {
            return None;
        }
        if self.play_one_more_hand {
            self.play_one_more_hand = false;
        }

        let mut player_cards = Vec::with_capacity(3);
        let mut banker_cards = Vec::with_capacity(3);
        for _ in 0..2 {
            player_cards.push(self.deal_card()?);
            banker_cards.push(self.deal_card()?);
        }

        let mut player_total = hand_total(&player_cards);
        let mut banker_total = hand_total(&banker_cards);

        if player_total < 8 && banker_total < 8 {
            let mut player_third = None;
            if player_draws(player_total) {
                let card = self.deal_card()?;
                player_cards.push(card);
                player_total = hand_total(&player_cards);
                player_third = Some(card.point_value());
            }
            if banker_draws(banker_total, player_third) {
                banker_cards.push(self.deal_card()?);
                banker_total = hand_total(&banker_cards);
            }
        }

        let outcome = if player_total > banker_total {
            Outcome::Player
        } else if banker_total > player_total {
            Outcome::Banker
        } else {
            Outcome::Tie
        };

        Some(DealtHand {
            player_cards,
            banker_cards,
            player_total,
            banker_total,
            outcome,
        })
    }

    pub fn total_cards(&self) -> usize {
        self.num_decks * CARDS_PER_DECK
    }

    pub fn remaining(&self) -> usize {
        self.cards.len()
    }

    pub fn cards_dealt(&self) -> usize {
        self.cards_dealt
    }

    pub fn burned(&self) -> usize {
        self.burned
    }

    pub fn initial_size_after_burn(&self) -> usize {
        self.initial_size_after_burn
    }

    pub fn cut_index(&self) -> usize {
        self.cut_index
    }

    pub fn cut_card_reached(&self) -> bool {
        self.cut_card_reached
    }

    pub fn shoes_started(&self) -> u64 {
        self.shoes_started
    }
}
