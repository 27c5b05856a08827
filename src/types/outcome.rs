#![allow(dead_code)]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::OutcomeParseError;

/// The two sides a wager (or a prediction) can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Player,
    Banker,
}

impl Side {
    pub fn opposite(&self) -> Side {
        match self {
            Side::Player => Side::Banker,
            Side::Banker => Side::Player,
        }
    }

    pub fn code(&self) -> char {
        match self {
            Side::Player => 'P',
            Side::Banker => 'B',
        }
    }

    /// Theoretical win rate with Ties excluded.
    pub fn theoretical_pct(&self) -> f64 {
        match self {
            Side::Player => PLAYER_BASELINE_PCT,
            Side::Banker => BANKER_BASELINE_PCT,
        }
    }

    pub fn all() -> [Side; 2] {
        [Side::Player, Side::Banker]
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

pub const PLAYER_BASELINE_PCT: f64 = 49.32;
pub const BANKER_BASELINE_PCT: f64 = 50.68;

/// Result of one dealt hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Player,
    Banker,
    Tie,
}

impl Outcome {
    /// Decided hands map onto a side; a Tie does not.
    pub fn side(&self) -> Option<Side> {
        match self {
            Outcome::Player => Some(Side::Player),
            Outcome::Banker => Some(Side::Banker),
            Outcome::Tie => None,
        }
    }

    pub fn is_tie(&self) -> bool {
        matches!(self, Outcome::Tie)
    }

    pub fn code(&self) -> char {
        match self {
            Outcome::Player => 'P',
            Outcome::Banker => 'B',
            Outcome::Tie => 'T',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        match code.to_ascii_uppercase() {
            'P' => Some(Outcome::Player),
            'B' => Some(Outcome::Banker),
            'T' => Some(Outcome::Tie),
            _ => None,
        }
    }
}

impl From<Side> for Outcome {
    fn from(side: Side) -> Self {
        match side {
            Side::Player => Outcome::Player,
            Side::Banker => Outcome::Banker,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Outcome {
    type Err = OutcomeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Outcome::from_code(c).ok_or_else(|| OutcomeParseError(s.to_string())),
            _ => match trimmed.to_ascii_lowercase().as_str() {
                "player" => Ok(Outcome::Player),
                "banker" => Ok(Outcome::Banker),
                "tie" => Ok(Outcome::Tie),
                _ => Err(OutcomeParseError(s.to_string())),
            },
        }
    }
}

/// Renders an optional prediction the way tables and logs show it.
pub fn prediction_label(prediction: Option<Side>) -> String {
    match prediction {
        Some(side) => side.code().to_string(),
        None => "N/A".to_string(),
    }
}
