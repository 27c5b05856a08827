use crate::error::StrategyError;
use crate::types::Side;
use super::{last_n_identical, last_two, trailing_run, Family, RoundContext, Strategy};

/// Streak Follower
/// Rides a run of `streak_length` identical results.
pub struct StreakFollower {
    name: String,
    streak_length: usize,
}

impl StreakFollower {
    pub fn new(streak_length: usize) -> Self {
        let streak_length = streak_length.max(2);
        Self {
            name: format!("Streak Follower ({})", streak_length),
            streak_length,
        }
    }

    fn extra(&self, ctx: &RoundContext<'_>) -> f64 {
        trailing_run(ctx.decided).saturating_sub(self.streak_length) as f64
    }
}

impl Strategy for StreakFollower {
    fn name(&self) -> &str {
        &self.name
    }

    fn family(&self) -> Option<Family> {
        Some(Family::Orderly)
    }

    fn predict(&mut self, ctx: &RoundContext<'_>) -> Result<Option<Side>, StrategyError> {
        Ok(last_n_identical(ctx.decided, self.streak_length))
    }

    fn confidence(&self, ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
        Ok((50.0 + self.extra(ctx) * 8.0).clamp(30.0, 90.0))
    }

    fn probability(&self, ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
        Ok((50.0 + self.extra(ctx) * 3.0).clamp(40.0, 75.0))
    }
}

/// Streak Breaker
/// Bets against a run of `streak_length` identical results.
pub struct StreakBreaker {
    name: String,
    streak_length: usize,
}

impl StreakBreaker {
    pub fn new(streak_length: usize) -> Self {
        let streak_length = streak_length.max(2);
        Self {
            name: format!("Streak Breaker ({})", streak_length),
            streak_length,
        }
    }

    fn extra(&self, ctx: &RoundContext<'_>) -> f64 {
        trailing_run(ctx.decided).saturating_sub(self.streak_length) as f64
    }
}

impl Strategy for StreakBreaker {
    fn name(&self) -> &str {
        &self.name
    }

    fn family(&self) -> Option<Family> {
        Some(Family::Choppy)
    }

    fn predict(&mut self, ctx: &RoundContext<'_>) -> Result<Option<Side>, StrategyError> {
        Ok(last_n_identical(ctx.decided, self.streak_length).map(|s| s.opposite()))
    }

    fn confidence(&self, ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
        Ok((40.0 + self.extra(ctx) * 10.0).clamp(30.0, 90.0))
    }

    fn probability(&self, ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
        Ok((45.0 + self.extra(ctx) * 5.0).clamp(35.0, 70.0))
    }
}

/// Dragon Tail
/// Follows only long dragons (runs of at least `min_length`).
pub struct DragonTail {
    name: String,
    min_length: usize,
}

impl DragonTail {
    pub fn new(min_length: usize) -> Self {
        let min_length = min_length.max(3);
        Self {
            name: format!("Dragon Tail ({}+)", min_length),
            min_length,
        }
    }

    fn extra(&self, ctx: &RoundContext<'_>) -> f64 {
        trailing_run(ctx.decided).saturating_sub(self.min_length) as f64
    }
}

impl Strategy for DragonTail {
    fn name(&self) -> &str {
        &self.name
    }

    fn family(&self) -> Option<Family> {
        Some(Family::Orderly)
    }

    fn predict(&mut self, ctx: &RoundContext<'_>) -> Result<Option<Side>, StrategyError> {
        if trailing_run(ctx.decided) >= self.min_length {
            Ok(ctx.decided.last().copied())
        } else {
            Ok(None)
        }
    }

    fn confidence(&self, ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
        Ok((65.0 + self.extra(ctx) * 5.0).min(95.0))
    }

    fn probability(&self, ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
        Ok((50.0 + self.extra(ctx) * 1.5).clamp(45.0, 65.0))
    }
}

/// Double Hunter: after a double (PP/BB) expects a third.
pub struct DoubleHunter;

impl Strategy for DoubleHunter {
    fn name(&self) -> &str {
        "Double Hunter"
    }

    fn family(&self) -> Option<Family> {
        Some(Family::Orderly)
    }

    fn predict(&mut self, ctx: &RoundContext<'_>) -> Result<Option<Side>, StrategyError> {
        Ok(last_two(ctx.decided).and_then(|(a, b)| (a == b).then_some(b)))
    }

    fn confidence(&self, _ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
        Ok(58.0)
    }

    fn probability(&self, _ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
        Ok(51.5)
    }
}

/// Lazy
/// Sits out until a run of `trigger` fires, then follows (or breaks) it.
pub struct Lazy {
    name: String,
    trigger: usize,
    follow: bool,
}

impl Lazy {
    pub fn new(trigger: usize, follow: bool) -> Self {
        let trigger = trigger.max(3);
        Self {
            name: format!("Lazy (streak>{})", trigger - 1),
            trigger,
            follow,
        }
    }

    fn extra(&self, ctx: &RoundContext<'_>) -> f64 {
        trailing_run(ctx.decided).saturating_sub(self.trigger) as f64
    }
}

impl Strategy for Lazy {
    fn name(&self) -> &str {
        &self.name
    }

    fn family(&self) -> Option<Family> {
        if self.follow {
            Some(Family::Orderly)
        } else {
            Some(Family::Choppy)
        }
    }

    fn predict(&mut self, ctx: &RoundContext<'_>) -> Result<Option<Side>, StrategyError> {
        let streak = last_n_identical(ctx.decided, self.trigger);
        Ok(if self.follow {
            streak
        } else {
            streak.map(|s| s.opposite())
        })
    }

    fn confidence(&self, ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
        Ok((60.0 + self.extra(ctx) * 5.0).min(85.0))
    }

    fn probability(&self, ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
        Ok((55.0 + self.extra(ctx) * 2.0).min(70.0))
    }
}
