use crate::error::StrategyError;
use crate::types::Side;
use super::{RoundContext, Strategy};

/// Tally of what followed earlier occurrences of the latest n-gram.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Followers {
    player: usize,
    banker: usize,
}

impl Followers {
    fn total(&self) -> usize {
        self.player + self.banker
    }

    fn count(&self, side: Side) -> usize {
        match side {
            Side::Player => self.player,
            Side::Banker => self.banker,
        }
    }
}

/// N-gram Pattern Matcher
/// Finds earlier occurrences of the latest `n` results and predicts whatever
/// followed them most often.
pub struct PatternMatcher {
    name: String,
    n: usize,
}

impl PatternMatcher {
    pub fn new(n: usize) -> Self {
        let n = n.max(2);
        Self {
            name: format!("Pattern ({}-gram)", n),
            n,
        }
    }

    fn followers(&self, decided: &[Side]) -> Option<Followers> {
        if decided.len() < self.n + 1 {
            return None;
        }
        let latest = &decided[decided.len() - self.n..];
        let mut tally = Followers::default();
        for start in 0..decided.len() - self.n {
            if &decided[start..start + self.n] == latest {
                match decided[start + self.n] {
                    Side::Player => tally.player += 1,
                    Side::Banker => tally.banker += 1,
                }
            }
        }
        (tally.total() > 0).then_some(tally)
    }
}

impl Strategy for PatternMatcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&mut self, ctx: &RoundContext<'_>) -> Result<Option<Side>, StrategyError> {
        let Some(tally) = self.followers(ctx.decided) else {
            return Ok(None);
        };
        Ok(match tally.player.cmp(&tally.banker) {
            std::cmp::Ordering::Greater => Some(Side::Player),
            std::cmp::Ordering::Less => Some(Side::Banker),
            std::cmp::Ordering::Equal => None,
        })
    }

    fn confidence(&self, ctx: &RoundContext<'_>, side: Side) -> Result<f64, StrategyError> {
        let Some(tally) = self.followers(ctx.decided) else {
            return Ok(0.0);
        };
        let total = tally.total() as f64;
        let predicted = tally.count(side) as f64;
        let other = tally.count(side.opposite()) as f64;

        let dominance = (predicted - other).abs() / total;
        let count_factor = (total + 1.0).log10().min(1.0);
        Ok(((50.0 + dominance * 40.0) * count_factor).clamp(25.0, 95.0))
    }

    fn probability(&self, ctx: &RoundContext<'_>, side: Side) -> Result<f64, StrategyError> {
        let Some(tally) = self.followers(ctx.decided) else {
            return Ok(50.0);
        };
        let pct = tally.count(side) as f64 / tally.total() as f64 * 100.0;
        Ok((50.0 + (pct - 50.0) * 0.85).clamp(15.0, 85.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::testing::{approx, Fixture};

    #[test]
    fn test_needs_n_plus_one_hands() {
        let mut matcher = PatternMatcher::new(3);
        assert!(!Fixture::new("PBP").run(&mut matcher).is_call());
    }

    #[test]
    fn test_single_prior_occurrence() {
        // Latest PBB appeared once before, followed by P.
        let mut matcher = PatternMatcher::new(3);
        let v = Fixture::new("PBBPPBB").run(&mut matcher);
        assert_eq!(v.prediction, Some(Side::Player));
        // dominance 1, count factor log10(2).
        let expected = (90.0 * 2f64.log10()).max(25.0);
        assert!(approx(v.confidence, expected));
        assert!(approx(v.probability, 85.0));
    }

    #[test]
    fn test_no_match_abstains() {
        let mut matcher = PatternMatcher::new(3);
        assert!(!Fixture::new("PPPB").run(&mut matcher).is_call());
        assert_eq!(PatternMatcher::new(1).name(), "Pattern (2-gram)");
    }

    #[test]
    fn test_balanced_tally_abstains() {
        // "PB" is followed by P once and by B once before the final "PB".
        let mut matcher = PatternMatcher::new(2);
        let v = Fixture::new("PBPBBPB").run(&mut matcher);
        assert!(!v.is_call());
    }
}
