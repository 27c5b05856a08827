use std::path::PathBuf;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::LadderProfile;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub table: TableSettings,
    pub staking: StakingSettings,
    pub tracker: TrackerSettings,
    pub strategies: StrategySettings,
    pub consensus: ConsensusSettings,
    pub guardian: GuardianSettings,
    pub session: SessionSettings,
}

impl SimulatorConfig {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        // Table validation
        if self.table.num_decks == 0 {
            errors.push("table: num_decks must be >= 1".to_string());
        }

        // Staking validation
        let ladder = self.staking.ladder();
        if ladder.is_empty() {
            errors.push("staking: ladder must not be empty".to_string());
        }
        if ladder.iter().any(|bet| *bet <= Decimal::ZERO) {
            errors.push("staking: ladder bets must be > 0".to_string());
        }
        if ladder.windows(2).any(|w| w[0] >= w[1]) {
            errors.push("staking: ladder must be strictly increasing".to_string());
        }
        if self.staking.initial_bankroll <= Decimal::ZERO {
            errors.push("staking: initial_bankroll must be > 0".to_string());
        }
        if self.staking.banker_commission < Decimal::ZERO || self.staking.banker_commission >= Decimal::ONE {
            errors.push("staking: banker_commission must be in [0, 1)".to_string());
        }

        if self.tracker.window == 0 {
            errors.push("tracker: window must be >= 1".to_string());
        }

        // Guardian validation
        let guardian = &self.guardian;
        if !(guardian.medium_risk < guardian.high_risk && guardian.high_risk <= 100.0) {
            errors.push("guardian: risk thresholds must satisfy medium < high <= 100".to_string());
        }
        if guardian.overall_weight < 0.0 || guardian.recent_weight < 0.0 {
            errors.push("guardian: blend weights must be >= 0".to_string());
        }
        let weights = &guardian.weights;
        if [weights.deviation, weights.disagreement, weights.underperformance, weights.regime]
            .iter()
            .any(|w| *w < 0.0)
        {
            errors.push("guardian: risk weights must be >= 0".to_string());
        }
        if !(0.0..1.0).contains(&guardian.conflict_ratio) {
            errors.push("guardian: conflict_ratio must be in [0, 1)".to_string());
        }

        if self.session.interval_ms == 0 {
            errors.push("session: interval_ms must be > 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSettings {
    pub num_decks: usize,
    pub cut_card_depth: usize,
    /// Pins the shuffle order and every seeded randomness source.
    pub seed: Option<u64>,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            num_decks: 8,
            cut_card_depth: 14,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StakingSettings {
    pub profile: LadderProfile,
    /// Used only by `LadderProfile::Custom`.
    pub custom_ladder: Vec<Decimal>,
    pub initial_bankroll: Decimal,
    pub banker_commission: Decimal,
}

impl StakingSettings {
    /// The bet ladder in effect for the selected profile.
    pub fn ladder(&self) -> Vec<Decimal> {
        self.profile
            .ladder()
            .unwrap_or_else(|| self.custom_ladder.clone())
    }
}

impl Default for StakingSettings {
    fn default() -> Self {
        Self {
            profile: LadderProfile::Classic,
            custom_ladder: Vec::new(),
            initial_bankroll: dec!(5000),
            banker_commission: dec!(0.05),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerSettings {
    pub window: usize,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self { window: 10 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategySettings {
    pub streak_length: usize,
    pub dragon_min_length: usize,
    pub pattern_length: usize,
    pub deviation_window: usize,
    pub deviation_threshold: f64,
    pub deviation_min_hands: usize,
    pub lazy_trigger: usize,
    pub lazy_follow: bool,
    pub fibonacci_limit: usize,
    pub multiverse_window: usize,
    pub multiverse_influence: f64,
    pub multiverse_leap_chance: f64,
    pub anti_trend_primary: String,
    pub maverick_threshold: f64,
    pub shoe_window: usize,
    pub shoe_chop_ratio: f64,
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            streak_length: 3,
            dragon_min_length: 6,
            pattern_length: 3,
            deviation_window: 30,
            deviation_threshold: 4.0,
            deviation_min_hands: 15,
            lazy_trigger: 5,
            lazy_follow: true,
            fibonacci_limit: 100,
            multiverse_window: 20,
            multiverse_influence: 0.15,
            multiverse_leap_chance: 0.05,
            anti_trend_primary: "Zigzag".to_string(),
            maverick_threshold: 70.0,
            shoe_window: 15,
            shoe_chop_ratio: 0.45,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusSettings {
    pub min_consistent: usize,
    pub min_sample_size: u32,
    pub fallback_top: usize,
}

impl Default for ConsensusSettings {
    fn default() -> Self {
        Self {
            min_consistent: 2,
            min_sample_size: 5,
            fallback_top: 3,
        }
    }
}

/// Maximum contribution of each risk signal to the Guardian's score.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskWeights {
    pub deviation: f64,
    pub disagreement: f64,
    pub underperformance: f64,
    pub regime: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            deviation: 50.0,
            disagreement: 35.0,
            underperformance: 10.0,
            regime: 5.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardianSettings {
    pub min_sample_size: u32,
    pub recent_window: usize,
    pub overall_weight: f64,
    pub recent_weight: f64,
    pub streak_bonus_step: f64,
    pub streak_bonus_cap: f64,
    pub deviation_factor: f64,
    pub conflict_ratio: f64,
    pub min_models_for_consensus: usize,
    pub underperformance_accuracy: f64,
    pub high_risk: f64,
    pub medium_risk: f64,
    pub high_risk_min_accuracy: f64,
    pub high_risk_min_votes: usize,
    pub high_risk_min_agreement: f64,
    pub top_n: usize,
    pub vote_min_total: f64,
    pub vote_min_margin: f64,
    pub weights: RiskWeights,
}

impl Default for GuardianSettings {
    fn default() -> Self {
        Self {
            min_sample_size: 6,
            recent_window: 10,
            overall_weight: 0.5,
            recent_weight: 0.5,
            streak_bonus_step: 0.1,
            streak_bonus_cap: 10.0,
            deviation_factor: 1.8,
            conflict_ratio: 0.65,
            min_models_for_consensus: 4,
            underperformance_accuracy: 45.0,
            high_risk: 85.0,
            medium_risk: 45.0,
            high_risk_min_accuracy: 60.0,
            high_risk_min_votes: 8,
            high_risk_min_agreement: 0.75,
            top_n: 5,
            vote_min_total: 100.0,
            vote_min_margin: 10.0,
            weights: RiskWeights::default(),
        }
    }
}

/// Which arbiter's pick is surfaced and staked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Arbiter {
    Guardian,
    Consensus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub arbiter: Arbiter,
    pub interval_ms: u64,
    pub journal_path: Option<PathBuf>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            arbiter: Arbiter::Guardian,
            interval_ms: 150,
            journal_path: None,
        }
    }
}
