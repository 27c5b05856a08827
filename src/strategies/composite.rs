use crate::error::StrategyError;
use crate::types::Side;
use super::{count_chops, tail, InputShape, RoundContext, Strategy, Verdict};

/// Anti-Trend
/// Bets against whatever its primary strategy said this round.
pub struct AntiTrend {
    primary: String,
}

impl AntiTrend {
    pub fn new(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
        }
    }

    fn primary_call<'a>(&self, ctx: &RoundContext<'a>) -> Result<Option<&'a Verdict>, StrategyError> {
        let verdict = ctx.dependency(&self.primary)?;
        Ok(verdict.is_call().then_some(verdict))
    }
}

impl Strategy for AntiTrend {
    fn name(&self) -> &str {
        "Anti-Trend"
    }

    fn shape(&self) -> InputShape {
        InputShape::Composite(vec![self.primary.clone()])
    }

    fn predict(&mut self, ctx: &RoundContext<'_>) -> Result<Option<Side>, StrategyError> {
        Ok(self
            .primary_call(ctx)?
            .and_then(|v| v.prediction)
            .map(|side| side.opposite()))
    }

    fn confidence(&self, ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
        Ok(self
            .primary_call(ctx)?
            .map_or(0.0, |v| (100.0 - v.confidence).clamp(10.0, 90.0)))
    }

    fn probability(&self, ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
        Ok(self
            .primary_call(ctx)?
            .map_or(0.0, |v| (100.0 - v.probability).clamp(10.0, 90.0)))
    }
}

/// Consensus Maverick
/// When the base strategies pile onto one side, takes the other one.
pub struct ConsensusMaverick {
    name: String,
    threshold: f64,
}

impl ConsensusMaverick {
    pub fn new(threshold: f64) -> Self {
        let threshold = threshold.clamp(50.1, 100.0);
        Self {
            name: format!("Consensus Maverick ({}%)", threshold),
            threshold,
        }
    }

    /// (crowded side, its share of valid base votes in %).
    fn crowd(ctx: &RoundContext<'_>) -> Option<(Side, f64)> {
        let (mut player, mut banker) = (0usize, 0usize);
        for (_, verdict) in ctx.base_calls() {
            match verdict.prediction {
                Some(Side::Player) => player += 1,
                Some(Side::Banker) => banker += 1,
                None => {}
            }
        }
        let total = player + banker;
        if total == 0 {
            return None;
        }
        let player_share = player as f64 / total as f64 * 100.0;
        let banker_share = banker as f64 / total as f64 * 100.0;
        if player_share >= banker_share {
            Some((Side::Player, player_share))
        } else {
            Some((Side::Banker, banker_share))
        }
    }
}

impl Strategy for ConsensusMaverick {
    fn name(&self) -> &str {
        &self.name
    }

    // Reads every base verdict, which is always evaluated first.
    fn shape(&self) -> InputShape {
        InputShape::Composite(Vec::new())
    }

    fn predict(&mut self, ctx: &RoundContext<'_>) -> Result<Option<Side>, StrategyError> {
        Ok(Self::crowd(ctx)
            .filter(|(_, share)| *share >= self.threshold)
            .map(|(side, _)| side.opposite()))
    }

    fn confidence(&self, ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
        let Some((_, share)) = Self::crowd(ctx) else {
            return Ok(0.0);
        };
        Ok((40.0 + (share - self.threshold) * 1.5).clamp(25.0, 85.0))
    }

    fn probability(&self, _ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
        Ok(45.0)
    }
}

/// Where the Shoe Reader sent the round.
#[derive(Debug, Clone, Copy)]
struct Reading {
    orderly: bool,
    clarity: f64,
}

/// Shoe Reader
/// Counts chops in a trailing window and hands the round to an orderly or a
/// choppy strategy, scaling confidence by how clear the reading is.
pub struct ShoeReader {
    name: String,
    window: usize,
    chop_ratio: f64,
    orderly_target: String,
    choppy_target: String,
}

impl ShoeReader {
    const MIN_HANDS: usize = 5;

    pub fn new(
        window: usize,
        chop_ratio: f64,
        orderly_target: impl Into<String>,
        choppy_target: impl Into<String>,
    ) -> Self {
        let window = window.max(Self::MIN_HANDS);
        Self {
            name: format!("Shoe Reader (W{})", window),
            window,
            chop_ratio: chop_ratio.clamp(0.1, 0.9),
            orderly_target: orderly_target.into(),
            choppy_target: choppy_target.into(),
        }
    }

    fn read(&self, decided: &[Side]) -> Option<Reading> {
        let window = tail(decided, self.window);
        if window.len() < Self::MIN_HANDS {
            return None;
        }
        let pairs = (window.len() - 1) as f64;
        let chops = count_chops(window) as f64;
        let threshold = (pairs * self.chop_ratio).floor().max(1.0);

        let mid = threshold / pairs;
        let clarity = if mid > 0.0 && mid < 1.0 {
            (chops / pairs - mid).abs() / mid.max(1.0 - mid)
        } else {
            0.5
        };

        Some(Reading {
            orderly: chops < threshold,
            clarity: (clarity * 1.5).min(1.0),
        })
    }

    fn target_verdict<'a>(&self, ctx: &RoundContext<'a>) -> Result<Option<(Reading, &'a Verdict)>, StrategyError> {
        let Some(reading) = self.read(ctx.decided) else {
            return Ok(None);
        };
        let target = if reading.orderly {
            &self.orderly_target
        } else {
            &self.choppy_target
        };
        let verdict = ctx.dependency(target)?;
        Ok(verdict.is_call().then_some((reading, verdict)))
    }
}

impl Strategy for ShoeReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn shape(&self) -> InputShape {
        InputShape::Composite(vec![self.orderly_target.clone(), self.choppy_target.clone()])
    }

    fn predict(&mut self, ctx: &RoundContext<'_>) -> Result<Option<Side>, StrategyError> {
        Ok(self.target_verdict(ctx)?.and_then(|(_, v)| v.prediction))
    }

    fn confidence(&self, ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
        Ok(self.target_verdict(ctx)?.map_or(0.0, |(reading, v)| {
            (v.confidence * (0.8 + reading.clarity * 0.4)).clamp(20.0, 95.0)
        }))
    }

    fn probability(&self, ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
        Ok(self
            .target_verdict(ctx)?
            .map_or(0.0, |(_, v)| v.probability.clamp(10.0, 90.0)))
    }
}
