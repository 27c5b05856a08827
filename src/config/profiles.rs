use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Bet ladder presets for the Martingale staking engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LadderProfile {
    /// Nine rungs, roughly doubling plus recovery margin.
    Classic,

    /// First five rungs of Classic. Reaches the table limit sooner.
    Short,

    /// Constant stake, no progression.
    Flat,

    /// Ladder taken from `staking.custom_ladder`
    Custom,
}

impl LadderProfile {
    pub fn name(&self) -> &str {
        match self {
            Self::Classic => "Classic Martingale",
            Self::Short => "Short Martingale",
            Self::Flat => "Flat Bet",
            Self::Custom => "Custom",
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Self::Classic => "4 -> 2660 over nine rungs. Survives eight straight losses.",
            Self::Short => "4 -> 144 over five rungs. Caps exposure at 260 per series.",
            Self::Flat => "Always 10. Bankroll moves with the win rate only.",
            Self::Custom => "User-defined ladder.",
        }
    }

    /// The preset bets, or `None` for `Custom`.
    pub fn ladder(&self) -> Option<Vec<Decimal>> {
        let bets: &[i64] = match self {
            Self::Classic => &[4, 12, 32, 68, 144, 300, 620, 1300, 2660],
            Self::Short => &[4, 12, 32, 68, 144],
            Self::Flat => &[10],
            Self::Custom => return None,
        };
        Some(bets.iter().map(|b| Decimal::from(*b)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_profile_ladders() {
        let classic = LadderProfile::Classic.ladder().unwrap();
        assert_eq!(classic.len(), 9);
        assert_eq!(classic[0], dec!(4));
        assert_eq!(classic[8], dec!(2660));

        let short = LadderProfile::Short.ladder().unwrap();
        assert_eq!(short.iter().sum::<Decimal>(), dec!(260));

        assert_eq!(LadderProfile::Flat.ladder(), Some(vec![dec!(10)]));
        assert_eq!(LadderProfile::Custom.ladder(), None);
    }

    #[test]
    fn test_profile_metadata() {
        assert_eq!(LadderProfile::Classic.name(), "Classic Martingale");
        assert_eq!(LadderProfile::Custom.description(), "User-defined ladder.");
    }
}
