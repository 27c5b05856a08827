#![allow(dead_code)]
pub mod chaos;
pub mod composite;
pub mod deviation;
pub mod grid;
pub mod pattern;
pub mod positional;
pub mod registry;
pub mod rhythm;
pub mod streak;

pub use chaos::*;
pub use composite::*;
pub use deviation::*;
pub use grid::*;
pub use pattern::*;
pub use positional::*;
pub use registry::*;
pub use rhythm::*;
pub use streak::*;

use serde::Serialize;

use crate::ensemble::PerformanceTracker;
use crate::error::StrategyError;
use crate::types::{OutcomeHistory, Side};

/// Input shape a strategy declares when it is registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputShape {
    /// Reads only the outcome history.
    Base,
    /// Also reads the same-round verdicts of the named strategies
    /// (and may read every base verdict, which is always available).
    Composite(Vec<String>),
    /// Reads everything, including the tracker and the roster. Runs last.
    Meta,
}

/// Capability flag used for filtering, without the dependency list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Capability {
    Base,
    Composite,
    Meta,
}

impl From<&InputShape> for Capability {
    fn from(shape: &InputShape) -> Self {
        match shape {
            InputShape::Base => Capability::Base,
            InputShape::Composite(_) => Capability::Composite,
            InputShape::Meta => Capability::Meta,
        }
    }
}

/// Shoe character a strategy is built to exploit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Family {
    /// Streaks and repeats.
    Orderly,
    /// Alternation.
    Choppy,
}

/// Registration-time facts about a strategy, visible to every strategy.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyProfile {
    pub name: String,
    pub capability: Capability,
    pub family: Option<Family>,
}

/// One strategy's answer for the round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub prediction: Option<Side>,
    pub confidence: f64,
    pub probability: f64,
    /// Strategy whose opinion was adopted, when it is not the reporter itself.
    pub source: Option<String>,
    pub reason: String,
}

impl Verdict {
    pub fn new(side: Side, confidence: f64, probability: f64) -> Self {
        Self {
            prediction: Some(side),
            confidence,
            probability,
            source: None,
            reason: String::new(),
        }
    }

    pub fn abstain() -> Self {
        Self {
            prediction: None,
            confidence: 0.0,
            probability: 0.0,
            source: None,
            reason: String::new(),
        }
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn is_call(&self) -> bool {
        self.prediction.is_some()
    }

    /// Clamps scores into [0, 100]; NaN scores or a missing side collapse to N/A.
    pub fn sanitized(self) -> Self {
        match self.prediction {
            Some(_) if self.confidence.is_finite() && self.probability.is_finite() => Self {
                confidence: self.confidence.clamp(0.0, 100.0),
                probability: self.probability.clamp(0.0, 100.0),
                ..self
            },
            _ => Self::abstain().with_reason(self.reason),
        }
    }
}

/// Same-round verdicts in evaluation order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RoundResults {
    entries: Vec<(String, Verdict)>,
}

impl RoundResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, verdict: Verdict) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = verdict,
            None => self.entries.push((name.to_string(), verdict)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Verdict> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn prediction(&self, name: &str) -> Option<Side> {
        self.get(name).and_then(|v| v.prediction)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Verdict)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Everything a strategy may look at during one round. Read-only.
pub struct RoundContext<'a> {
    pub history: &'a OutcomeHistory,
    /// History with Ties removed.
    pub decided: &'a [Side],
    pub results: &'a RoundResults,
    pub tracker: &'a PerformanceTracker,
    pub roster: &'a [StrategyProfile],
}

impl<'a> RoundContext<'a> {
    pub fn profile(&self, name: &str) -> Option<&StrategyProfile> {
        self.roster.iter().find(|p| p.name == name)
    }

    /// Current verdicts of base strategies that called a side.
    pub fn base_calls(&self) -> impl Iterator<Item = (&'a str, &'a Verdict)> + '_ {
        self.results.iter().filter(move |(name, verdict)| {
            verdict.is_call()
                && self
                    .profile(name)
                    .is_some_and(|p| p.capability == Capability::Base)
        })
    }

    /// Same-round verdict of a dependency, which must already be evaluated.
    pub fn dependency(&self, name: &str) -> Result<&'a Verdict, StrategyError> {
        self.results
            .get(name)
            .ok_or_else(|| StrategyError::MissingDependency(name.to_string()))
    }
}

/// Common contract for every predictor.
pub trait Strategy: Send {
    fn name(&self) -> &str;

    fn shape(&self) -> InputShape {
        InputShape::Base
    }

    fn family(&self) -> Option<Family> {
        None
    }

    fn predict(&mut self, ctx: &RoundContext<'_>) -> Result<Option<Side>, StrategyError>;

    /// Confidence in [0, 100] for a side this strategy just predicted.
    fn confidence(&self, ctx: &RoundContext<'_>, side: Side) -> Result<f64, StrategyError>;

    /// Probability estimate in [0, 100] for a side this strategy just predicted.
    fn probability(&self, ctx: &RoundContext<'_>, side: Side) -> Result<f64, StrategyError>;

    fn evaluate(&mut self, ctx: &RoundContext<'_>) -> Result<Verdict, StrategyError> {
        match self.predict(ctx)? {
            Some(side) => Ok(Verdict::new(
                side,
                self.confidence(ctx, side)?,
                self.probability(ctx, side)?,
            )),
            None => Ok(Verdict::abstain()),
        }
    }

    fn reset(&mut self) {}
}

/// Length of the run of identical sides ending at the latest hand.
pub(crate) fn trailing_run(decided: &[Side]) -> usize {
    match decided.last() {
        Some(last) => decided.iter().rev().take_while(|s| *s == last).count(),
        None => 0,
    }
}

/// True when the last `n` sides exist and are identical.
pub(crate) fn last_n_identical(decided: &[Side], n: usize) -> Option<Side> {
    if n == 0 || decided.len() < n {
        return None;
    }
    let tail = &decided[decided.len() - n..];
    let first = tail[0];
    tail.iter().all(|s| *s == first).then_some(first)
}

/// Adjacent pairs that differ ("chops") in a window.
pub(crate) fn count_chops(window: &[Side]) -> usize {
    window.windows(2).filter(|w| w[0] != w[1]).count()
}

pub(crate) fn last_two(decided: &[Side]) -> Option<(Side, Side)> {
    match decided {
        [.., second_last, last] => Some((*second_last, *last)),
        _ => None,
    }
}

pub(crate) fn share_pct(window: &[Side], side: Side) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    window.iter().filter(|s| **s == side).count() as f64 / window.len() as f64 * 100.0
}

pub(crate) fn tail(decided: &[Side], n: usize) -> &[Side] {
    &decided[decided.len().saturating_sub(n)..]
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::types::Outcome;

    /// Owns what a `RoundContext` borrows, for strategy unit tests.
    pub struct Fixture {
        pub history: OutcomeHistory,
        pub decided: Vec<Side>,
        pub results: RoundResults,
        pub tracker: PerformanceTracker,
        pub roster: Vec<StrategyProfile>,
    }

    impl Fixture {
        pub fn new(codes: &str) -> Self {
            let outcomes: Vec<Outcome> = codes.chars().filter_map(Outcome::from_code).collect();
            let history = OutcomeHistory::from_outcomes(&outcomes);
            let decided = history.decided();
            Self {
                history,
                decided,
                results: RoundResults::new(),
                tracker: PerformanceTracker::new(10),
                roster: Vec::new(),
            }
        }

        pub fn with_base(mut self, name: &str, verdict: Verdict) -> Self {
            self.roster.push(StrategyProfile {
                name: name.to_string(),
                capability: Capability::Base,
                family: None,
            });
            self.results.insert(name, verdict);
            self
        }

        pub fn ctx(&self) -> RoundContext<'_> {
            RoundContext {
                history: &self.history,
                decided: &self.decided,
                results: &self.results,
                tracker: &self.tracker,
                roster: &self.roster,
            }
        }

        pub fn run(&self, strategy: &mut dyn Strategy) -> Verdict {
            strategy.evaluate(&self.ctx()).expect("strategy evaluation failed")
        }
    }

    pub fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }
}
