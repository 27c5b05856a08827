use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::StrategyError;
use crate::types::{Side, BANKER_BASELINE_PCT, PLAYER_BASELINE_PCT};
use super::{share_pct, tail, Family, RoundContext, Strategy};

/// Player/Banker split of a trailing window.
#[derive(Debug, Clone, Copy)]
pub struct WindowSplit {
    pub len: usize,
    pub player_pct: f64,
    pub banker_pct: f64,
}

impl WindowSplit {
    pub fn of(decided: &[Side], window: usize) -> Self {
        let slice = tail(decided, window);
        Self {
            len: slice.len(),
            player_pct: share_pct(slice, Side::Player),
            banker_pct: share_pct(slice, Side::Banker),
        }
    }

    pub fn pct(&self, side: Side) -> f64 {
        match side {
            Side::Player => self.player_pct,
            Side::Banker => self.banker_pct,
        }
    }

    /// How far a side runs above its theoretical rate.
    pub fn excess(&self, side: Side) -> f64 {
        self.pct(side) - side.theoretical_pct()
    }

    /// The side whose excess reaches `threshold`, Player checked first.
    pub fn over_performer(&self, threshold: f64) -> Option<Side> {
        if self.excess(Side::Player) >= threshold {
            Some(Side::Player)
        } else if self.excess(Side::Banker) >= threshold {
            Some(Side::Banker)
        } else {
            None
        }
    }
}

/// Window/threshold parameters shared by the deviation family.
#[derive(Debug, Clone, Copy)]
pub struct DeviationParams {
    pub window: usize,
    pub threshold: f64,
    pub min_hands: usize,
}

impl DeviationParams {
    pub fn new(window: usize, threshold: f64, min_hands: usize) -> Self {
        Self {
            window: window.max(10),
            threshold: threshold.max(1.0),
            min_hands: min_hands.max(5),
        }
    }

    fn split(&self, decided: &[Side]) -> Option<WindowSplit> {
        let split = WindowSplit::of(decided, self.window);
        (split.len >= self.min_hands).then_some(split)
    }

    fn confidence_for(&self, excess: f64) -> f64 {
        (40.0 + (excess - self.threshold).max(0.0) * 5.0).clamp(30.0, 90.0)
    }
}

/// Statistical Deviation
/// Regression to the mean: bets the side running below its theoretical rate.
pub struct StatisticalDeviation {
    name: String,
    params: DeviationParams,
}

impl StatisticalDeviation {
    pub fn new(window: usize, threshold: f64, min_hands: usize) -> Self {
        let params = DeviationParams::new(window, threshold, min_hands);
        Self {
            name: format!("Deviation (W{}, T{}%)", params.window, params.threshold),
            params,
        }
    }

    pub fn params(&self) -> DeviationParams {
        self.params
    }
}

impl Strategy for StatisticalDeviation {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&mut self, ctx: &RoundContext<'_>) -> Result<Option<Side>, StrategyError> {
        Ok(self
            .params
            .split(ctx.decided)
            .and_then(|split| split.over_performer(self.params.threshold))
            .map(|hot| hot.opposite()))
    }

    fn confidence(&self, ctx: &RoundContext<'_>, side: Side) -> Result<f64, StrategyError> {
        let Some(split) = self.params.split(ctx.decided) else {
            return Ok(0.0);
        };
        Ok(self.params.confidence_for(split.excess(side.opposite())))
    }

    fn probability(&self, _ctx: &RoundContext<'_>, side: Side) -> Result<f64, StrategyError> {
        Ok(side.theoretical_pct())
    }
}

/// Anti-Stats
/// "Hot hand": bets the over-performing side keeps running.
pub struct AntiStats {
    name: String,
    params: DeviationParams,
}

impl AntiStats {
    pub fn new(window: usize, threshold: f64, min_hands: usize) -> Self {
        let params = DeviationParams::new(window, threshold, min_hands);
        Self {
            name: format!("Anti-Stats (W{}, T{}%)", params.window, params.threshold),
            params,
        }
    }
}

impl Strategy for AntiStats {
    fn name(&self) -> &str {
        &self.name
    }

    fn family(&self) -> Option<Family> {
        Some(Family::Orderly)
    }

    fn predict(&mut self, ctx: &RoundContext<'_>) -> Result<Option<Side>, StrategyError> {
        Ok(self
            .params
            .split(ctx.decided)
            .and_then(|split| split.over_performer(self.params.threshold)))
    }

    fn confidence(&self, ctx: &RoundContext<'_>, side: Side) -> Result<f64, StrategyError> {
        let Some(split) = self.params.split(ctx.decided) else {
            return Ok(0.0);
        };
        Ok(self.params.confidence_for(split.excess(side)))
    }

    fn probability(&self, ctx: &RoundContext<'_>, side: Side) -> Result<f64, StrategyError> {
        let Some(split) = self.params.split(ctx.decided) else {
            return Ok(50.0);
        };
        Ok(split.pct(side).clamp(40.0, 75.0))
    }
}

/// Multiverse
/// Nudges the theoretical split against the observed deviation and usually
/// takes the favoured side; with a small chance it "leaps" to the other one.
pub struct Multiverse {
    window: usize,
    influence: f64,
    leap_chance: f64,
    rng: Box<dyn RngCore + Send>,
}

impl Multiverse {
    pub const NAME: &'static str = "Multiverse";

    pub fn new(window: usize, influence: f64, leap_chance: f64, rng: Box<dyn RngCore + Send>) -> Self {
        Self {
            window: window.max(5),
            influence: influence.clamp(0.0, 0.5),
            leap_chance: leap_chance.clamp(0.0, 0.2),
            rng,
        }
    }

    pub fn seeded(window: usize, influence: f64, leap_chance: f64, seed: u64) -> Self {
        Self::new(
            window,
            influence,
            leap_chance,
            Box::new(ChaCha8Rng::seed_from_u64(seed)),
        )
    }

    /// Adjusted (player, banker) percentages.
    fn adjusted(&self, decided: &[Side]) -> (f64, f64) {
        let split = WindowSplit::of(decided, self.window);
        let player_pct = if split.len == 0 {
            PLAYER_BASELINE_PCT
        } else {
            split.player_pct
        };
        let shift = (player_pct - PLAYER_BASELINE_PCT) * self.influence;
        (
            (PLAYER_BASELINE_PCT - shift).clamp(0.1, 99.9),
            (BANKER_BASELINE_PCT + shift).clamp(0.1, 99.9),
        )
    }
}

impl Strategy for Multiverse {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn predict(&mut self, ctx: &RoundContext<'_>) -> Result<Option<Side>, StrategyError> {
        let (player, banker) = self.adjusted(ctx.decided);
        let favoured = if player >= banker {
            Side::Player
        } else {
            Side::Banker
        };
        if self.rng.gen::<f64>() < self.leap_chance {
            return Ok(Some(favoured.opposite()));
        }
        Ok(Some(favoured))
    }

    fn confidence(&self, ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
        let (player, banker) = self.adjusted(ctx.decided);
        Ok((20.0 + (player - banker).abs() * 0.7).clamp(20.0, 90.0))
    }

    fn probability(&self, ctx: &RoundContext<'_>, side: Side) -> Result<f64, StrategyError> {
        let (player, banker) = self.adjusted(ctx.decided);
        Ok(match side {
            Side::Player => player,
            Side::Banker => banker,
        })
    }
}
