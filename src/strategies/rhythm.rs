use crate::error::StrategyError;
use crate::types::Side;
use super::{last_two, share_pct, tail, Family, RoundContext, Strategy};

/// Zigzag
/// After a double expects a switch, after a switch expects a repeat.
pub struct Zigzag;

impl Zigzag {
    pub const NAME: &'static str = "Zigzag";
    const LOOKBACK: usize = 6;

    fn rule(second_last: Side, last: Side) -> Side {
        if second_last == last {
            last.opposite()
        } else {
            last
        }
    }
}

impl Strategy for Zigzag {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn family(&self) -> Option<Family> {
        Some(Family::Choppy)
    }

    fn predict(&mut self, ctx: &RoundContext<'_>) -> Result<Option<Side>, StrategyError> {
        Ok(last_two(ctx.decided).map(|(a, b)| Self::rule(a, b)))
    }

    fn confidence(&self, ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
        let window = tail(ctx.decided, Self::LOOKBACK);
        if window.len() < 3 {
            return Ok(40.0);
        }

        // How often the same rule would have been right inside the window.
        let checks = window.len() - 2;
        let correct = window
            .windows(3)
            .filter(|w| Self::rule(w[0], w[1]) == w[2])
            .count();
        let mut confidence = 40.0 + correct as f64 / checks as f64 * 100.0 * 0.5;

        match last_two(window) {
            Some((a, b)) if a != b => confidence += 5.0,
            _ => confidence -= 5.0,
        }
        Ok(confidence.clamp(20.0, 95.0))
    }

    fn probability(&self, ctx: &RoundContext<'_>, side: Side) -> Result<f64, StrategyError> {
        if ctx.decided.is_empty() {
            return Ok(50.0);
        }
        let pct = share_pct(ctx.decided, side);
        Ok((50.0 + (pct - 50.0) * 0.8).clamp(10.0, 90.0))
    }
}

/// Chop Follower ("ping pong")
/// Once the last two differ, expects the alternation to continue.
pub struct ChopFollower;

impl ChopFollower {
    pub const NAME: &'static str = "Chop Follower";

    /// Trailing alternation length, counting the latest switch twice.
    fn chop_length(decided: &[Side]) -> usize {
        let run = decided
            .windows(2)
            .rev()
            .take_while(|w| w[0] != w[1])
            .count();
        match last_two(decided) {
            Some((a, b)) if a != b => run + 1,
            _ => run,
        }
    }

    fn extra(ctx: &RoundContext<'_>) -> f64 {
        Self::chop_length(ctx.decided).saturating_sub(2) as f64
    }
}

impl Strategy for ChopFollower {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn family(&self) -> Option<Family> {
        Some(Family::Choppy)
    }

    fn predict(&mut self, ctx: &RoundContext<'_>) -> Result<Option<Side>, StrategyError> {
        Ok(last_two(ctx.decided).and_then(|(a, b)| (a != b).then_some(b.opposite())))
    }

    fn confidence(&self, ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
        Ok((50.0 + Self::extra(ctx) * 6.0).min(85.0))
    }

    fn probability(&self, ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
        Ok((50.0 + Self::extra(ctx) * 2.0).clamp(45.0, 60.0))
    }
}

/// Stubborn Simple: a double flips, a switch is "corrected" back.
pub struct StubbornSimple;

impl Strategy for StubbornSimple {
    fn name(&self) -> &str {
        "Stubborn Simple"
    }

    fn family(&self) -> Option<Family> {
        Some(Family::Choppy)
    }

    fn predict(&mut self, ctx: &RoundContext<'_>) -> Result<Option<Side>, StrategyError> {
        Ok(last_two(ctx.decided).map(|(second_last, last)| {
            if second_last == last {
                last.opposite()
            } else {
                second_last
            }
        }))
    }

    fn confidence(&self, ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
        Ok(match last_two(ctx.decided) {
            Some((a, b)) if a == b => 55.0,
            Some(_) => 50.0,
            None => 45.0,
        })
    }

    fn probability(&self, _ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
        Ok(50.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Beat {
    Four,
    Three,
}

/// Rhythm Disruptor
/// Reacts to short ABAB / ABA rhythms.
pub struct RhythmDisruptor;

impl RhythmDisruptor {
    fn detect(decided: &[Side]) -> Option<(Beat, Side)> {
        if let [a, b, c, d] = tail(decided, 4) {
            if a != b && b == d && a == c {
                return Some((Beat::Four, *c));
            }
        }
        if let [a, b, c] = tail(decided, 3) {
            if a != b && a == c {
                return Some((Beat::Three, *c));
            }
        }
        None
    }
}

impl Strategy for RhythmDisruptor {
    fn name(&self) -> &str {
        "Rhythm Disruptor"
    }

    fn predict(&mut self, ctx: &RoundContext<'_>) -> Result<Option<Side>, StrategyError> {
        Ok(Self::detect(ctx.decided).map(|(_, side)| side))
    }

    fn confidence(&self, ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
        Ok(match Self::detect(ctx.decided) {
            Some((Beat::Four, _)) => 70.0,
            Some((Beat::Three, _)) => 60.0,
            None => 50.0,
        })
    }

    fn probability(&self, ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
        Ok(match Self::detect(ctx.decided) {
            Some((Beat::Four, _)) => 48.0,
            Some((Beat::Three, _)) => 45.0,
            None => 40.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::testing::{approx, Fixture};

    #[test]
    fn test_zigzag_needs_two_hands() {
        assert!(!Fixture::new("P").run(&mut Zigzag).is_call());
        assert!(!Fixture::new("TTT").run(&mut Zigzag).is_call());
    }

    #[test]
    fn test_zigzag_short_history() {
        let v = Fixture::new("PP").run(&mut Zigzag);
        assert_eq!(v.prediction, Some(Side::Banker));
        assert!(approx(v.confidence, 40.0));
        assert!(approx(v.probability, 10.0));
    }

    #[test]
    fn test_zigzag_backtest_confidence() {
        // Both in-window checks miss, the last two differ.
        let v = Fixture::new("PBPB").run(&mut Zigzag);
        assert_eq!(v.prediction, Some(Side::Banker));
        assert!(approx(v.confidence, 45.0));
        assert!(approx(v.probability, 50.0));

        // PPB: rule says B after PP, hit. Last two differ.
        let v = Fixture::new("PPB").run(&mut Zigzag);
        assert_eq!(v.prediction, Some(Side::Banker));
        assert!(approx(v.confidence, 95.0));
    }

    #[test]
    fn test_chop_follower_length() {
        let v = Fixture::new("PPBPB").run(&mut ChopFollower);
        assert_eq!(v.prediction, Some(Side::Player));
        assert!(approx(v.confidence, 62.0));
        assert!(approx(v.probability, 54.0));
        assert!(!Fixture::new("PBB").run(&mut ChopFollower).is_call());

        let v = Fixture::new("PB").run(&mut ChopFollower);
        assert!(approx(v.confidence, 50.0));
        assert!(approx(v.probability, 50.0));
    }

    #[test]
    fn test_stubborn_simple() {
        let v = Fixture::new("BB").run(&mut StubbornSimple);
        assert_eq!(v.prediction, Some(Side::Player));
        assert!(approx(v.confidence, 55.0));

        let v = Fixture::new("PB").run(&mut StubbornSimple);
        assert_eq!(v.prediction, Some(Side::Player));
        assert!(approx(v.confidence, 50.0));
        assert!(approx(v.probability, 50.0));
    }

    #[test]
    fn test_rhythm_disruptor_beats() {
        let v = Fixture::new("PBPB").run(&mut RhythmDisruptor);
        assert_eq!(v.prediction, Some(Side::Player));
        assert!(approx(v.confidence, 70.0));
        assert!(approx(v.probability, 48.0));

        let v = Fixture::new("PPBP").run(&mut RhythmDisruptor);
        assert_eq!(v.prediction, Some(Side::Player));
        assert!(approx(v.confidence, 60.0));
        assert!(approx(v.probability, 45.0));

        assert!(!Fixture::new("PPBB").run(&mut RhythmDisruptor).is_call());
    }
}
