#![allow(dead_code)]
use serde::{Deserialize, Serialize};
use std::fmt;

pub const CARDS_PER_DECK: usize = 52;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Suit {
    Hearts,
    Diamonds,
    Clubs,
    Spades,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Hearts, Suit::Diamonds, Suit::Clubs, Suit::Spades];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rank {
    Ace,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Ace,
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
    ];

    /// Face value used by the burn procedure: ace=1, ten and court cards=10.
    pub fn pip_value(&self) -> u8 {
        match self {
            Rank::Ace => 1,
            Rank::Two => 2,
            Rank::Three => 3,
            Rank::Four => 4,
            Rank::Five => 5,
            Rank::Six => 6,
            Rank::Seven => 7,
            Rank::Eight => 8,
            Rank::Nine => 9,
            Rank::Ten | Rank::Jack | Rank::Queen | Rank::King => 10,
        }
    }

    /// Baccarat point value: ten and court cards count zero.
    pub fn point_value(&self) -> u8 {
        self.pip_value() % 10
    }

    pub fn code(&self) -> char {
        match self {
            Rank::Ace => 'A',
            Rank::Two => '2',
            Rank::Three => '3',
            Rank::Four => '4',
            Rank::Five => '5',
            Rank::Six => '6',
            Rank::Seven => '7',
            Rank::Eight => '8',
            Rank::Nine => '9',
            Rank::Ten => 'T',
            Rank::Jack => 'J',
            Rank::Queen => 'Q',
            Rank::King => 'K',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    pub fn point_value(&self) -> u8 {
        self.rank.point_value()
    }

    /// One standard 52-card deck in suit-major order.
    pub fn deck() -> Vec<Card> {
        Suit::ALL
            .iter()
            .flat_map(|&suit| Rank::ALL.iter().map(move |&rank| Card::new(rank, suit)))
            .collect()
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suit = match self.suit {
            Suit::Hearts => 'h',
            Suit::Diamonds => 'd',
            Suit::Clubs => 'c',
            Suit::Spades => 's',
        };
        write!(f, "{}{}", self.rank.code(), suit)
    }
}

/// Baccarat total of a hand (sum of point values mod 10).
pub fn hand_total(cards: &[Card]) -> u8 {
    cards.iter().map(|c| c.point_value()).sum::<u8>() % 10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_and_pip_values() {
        assert_eq!(Rank::Ace.point_value(), 1);
        assert_eq!(Rank::Nine.point_value(), 9);
        for rank in [Rank::Ten, Rank::Jack, Rank::Queen, Rank::King] {
            assert_eq!(rank.point_value(), 0);
            assert_eq!(rank.pip_value(), 10);
        }
        assert_eq!(Rank::Ace.pip_value(), 1);
    }

    #[test]
    fn test_deck_composition() {
        let deck = Card::deck();
        assert_eq!(deck.len(), CARDS_PER_DECK);
        let kings = deck.iter().filter(|c| c.rank == Rank::King).count();
        assert_eq!(kings, 4);
    }

    #[test]
    fn test_hand_total_wraps_mod_ten() {
        let cards = [
            Card::new(Rank::Seven, Suit::Hearts),
            Card::new(Rank::Eight, Suit::Spades),
        ];
        assert_eq!(hand_total(&cards), 5);

        let cards = [
            Card::new(Rank::King, Suit::Hearts),
            Card::new(Rank::Queen, Suit::Spades),
            Card::new(Rank::Nine, Suit::Clubs),
        ];
        assert_eq!(hand_total(&cards), 9);
    }
}
