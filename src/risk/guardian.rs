use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::config::{GuardianSettings, SimulatorConfig};
use crate::error::StrategyError;
use crate::strategies::{count_chops, tail, Family, InputShape, RoundContext, Strategy, Verdict};
use crate::types::{Side, PLAYER_BASELINE_PCT};
use super::ranking::{rank_strategies, RankedStrategy, RankingRules};

const MIN_REGIME_HANDS: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RiskAssessment {
    pub score: f64,
    pub level: RiskLevel,
    pub reasons: Vec<String>,
}

/// Everything the Guardian needs besides the round itself.
#[derive(Debug, Clone)]
pub struct GuardianParams {
    pub settings: GuardianSettings,
    pub deviation_window: usize,
    pub deviation_threshold: f64,
    pub shoe_window: usize,
    pub shoe_chop_ratio: f64,
}

impl GuardianParams {
    pub fn from_config(config: &SimulatorConfig) -> Self {
        Self {
            settings: config.guardian.clone(),
            deviation_window: config.strategies.deviation_window.max(10),
            deviation_threshold: config.strategies.deviation_threshold.max(1.0),
            shoe_window: config.strategies.shoe_window.max(MIN_REGIME_HANDS),
            shoe_chop_ratio: config.strategies.shoe_chop_ratio.clamp(0.1, 0.9),
        }
    }

    pub fn ranking_rules(&self) -> RankingRules {
        RankingRules::from(&self.settings)
    }
}

/// Share of adjacent differing pairs in the trailing shoe window.
fn alternation_ratio(decided: &[Side], window: usize) -> Option<f64> {
    let window = tail(decided, window);
    if window.len() < MIN_REGIME_HANDS {
        return None;
    }
    Some(count_chops(window) as f64 / (window.len() - 1) as f64)
}

/// Majority side among valid base calls, its share, and the number of calls.
fn base_majority(ctx: &RoundContext<'_>) -> Option<(Side, f64, usize)> {
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
    let (side, count) = if player >= banker {
        (Side::Player, player)
    } else {
        (Side::Banker, banker)
    };
    Some((side, count as f64 / total as f64, total))
}

/// Scores how dangerous it is to trust any strategy this round.
pub fn assess_risk(
    ctx: &RoundContext<'_>,
    ranking: &[RankedStrategy],
    params: &GuardianParams,
) -> RiskAssessment {
    let settings = &params.settings;
    let weights = &settings.weights;
    let mut score = 0.0;
    let mut reasons = Vec::new();

    if ctx.decided.len() >= params.deviation_window {
        let window = tail(ctx.decided, params.deviation_window);
        let player_pct =
            window.iter().filter(|s| **s == Side::Player).count() as f64 / window.len() as f64 * 100.0;
        let deviation = (player_pct - PLAYER_BASELINE_PCT).abs();
        let limit = params.deviation_threshold * settings.deviation_factor;
        if limit > 0.0 {
            score += weights.deviation * (deviation / limit).min(1.0);
            if deviation >= limit {
                reasons.push(format!("deviation {:.1}% over the last {} hands", deviation, window.len()));
            }
        }
    }

    if let Some((_, share, calls)) = base_majority(ctx) {
        if calls >= settings.min_models_for_consensus {
            let conflict = 1.0 - share;
            let limit = 1.0 - settings.conflict_ratio;
            if limit > 0.0 {
                score += weights.disagreement * (conflict / limit).min(1.0);
                if conflict >= limit {
                    reasons.push(format!("strategies split {:.0}/{:.0}", share * 100.0, conflict * 100.0));
                }
            }
        }
    }

    if let Some(top) = ranking.first() {
        let floor = settings.underperformance_accuracy;
        if top.overall < floor {
            score += weights.underperformance * ((floor - top.overall) / 15.0).min(1.0);
            reasons.push(format!("best strategy only {:.1}% accurate", top.overall));
        }
    }

    if let Some(ratio) = alternation_ratio(ctx.decided, params.shoe_window) {
        if (0.4..=0.6).contains(&ratio) {
            score += weights.regime * (1.0 - (ratio - 0.5).abs() / 0.1).max(0.0);
            reasons.push(format!("ambiguous shoe (alternation {:.2})", ratio));
        }
    }

    let score = score.clamp(0.0, 100.0);
    let level = if score >= settings.high_risk {
        RiskLevel::High
    } else if score >= settings.medium_risk {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    RiskAssessment { score, level, reasons }
}

/// Guardian
/// Meta strategy: ranks the base strategies, scores the round's risk and
/// only speaks when the level allows it.
pub struct Guardian {
    params: GuardianParams,
}

impl Guardian {
    pub const NAME: &'static str = "Guardian";

    pub fn new(params: GuardianParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &GuardianParams {
        &self.params
    }

    fn shoe_character(&self, decided: &[Side]) -> Option<Family> {
        alternation_ratio(decided, self.params.shoe_window).map(|ratio| {
            if ratio < self.params.shoe_chop_ratio {
                Family::Orderly
            } else {
                Family::Choppy
            }
        })
    }

    fn adopt(top: &RankedStrategy) -> Verdict {
        Verdict {
            source: Some(top.name.clone()),
            ..top.verdict.clone()
        }
    }

    fn decide_high(&self, ctx: &RoundContext<'_>, ranking: &[RankedStrategy]) -> Verdict {
        let settings = &self.params.settings;
        if let Some(top) = ranking.first().filter(|t| t.blended > settings.high_risk_min_accuracy) {
            return Self::adopt(top);
        }

        if let Some((side, share, calls)) = base_majority(ctx) {
            if calls >= settings.high_risk_min_votes && share > settings.high_risk_min_agreement {
                let agreeing: Vec<&Verdict> = ctx
                    .base_calls()
                    .map(|(_, v)| v)
                    .filter(|v| v.prediction == Some(side))
                    .collect();
                let n = agreeing.len() as f64;
                let confidence = agreeing.iter().map(|v| v.confidence).sum::<f64>() / n;
                let probability = agreeing.iter().map(|v| v.probability).sum::<f64>() / n;
                return Verdict::new(side, confidence, probability).with_source("agreement");
            }
        }

        Verdict::abstain()
    }

    fn decide_medium(ranking: &[RankedStrategy]) -> Verdict {
        match ranking.first() {
            Some(top) => {
                let adopted = Self::adopt(top);
                Verdict {
                    confidence: adopted.confidence * 0.8,
                    probability: 50.0 + (adopted.probability - 50.0) * 0.7,
                    ..adopted
                }
            }
            None => Verdict::abstain(),
        }
    }

    fn decide_low(&self, ctx: &RoundContext<'_>, ranking: &[RankedStrategy]) -> Verdict {
        let settings = &self.params.settings;
        let top = &ranking[..ranking.len().min(settings.top_n.max(1))];

        if let Some(character) = self.shoe_character(ctx.decided) {
            if let Some(fit) = top.iter().find(|r| r.family == Some(character)) {
                return Self::adopt(fit);
            }
        }

        let (mut player, mut banker) = (0.0, 0.0);
        for ranked in top {
            match ranked.verdict.prediction {
                Some(Side::Player) => player += ranked.blended,
                Some(Side::Banker) => banker += ranked.blended,
                None => {}
            }
        }
        let total = player + banker;
        if total < settings.vote_min_total || (player - banker).abs() < settings.vote_min_margin {
            return Verdict::abstain();
        }

        let (side, winning) = if player > banker {
            (Side::Player, player)
        } else {
            (Side::Banker, banker)
        };
        let winners: Vec<f64> = top
            .iter()
            .filter(|r| r.verdict.prediction == Some(side))
            .map(|r| r.verdict.probability)
            .collect();
        let probability = winners.iter().sum::<f64>() / winners.len() as f64;
        let confidence = (winning / total * 100.0).clamp(10.0, 95.0);
        Verdict::new(side, confidence, probability).with_source("weighted vote")
    }

    fn decide(&self, ctx: &RoundContext<'_>) -> (RiskAssessment, Verdict) {
        let ranking = rank_strategies(ctx, &self.params.ranking_rules());
        let risk = assess_risk(ctx, &ranking, &self.params);
        let verdict = match risk.level {
            RiskLevel::High => self.decide_high(ctx, &ranking),
            RiskLevel::Medium => Self::decide_medium(&ranking),
            RiskLevel::Low => self.decide_low(ctx, &ranking),
        };

        let mut reason = format!("{} risk ({:.0})", risk.level, risk.score);
        if !risk.reasons.is_empty() {
            reason.push_str(": ");
            reason.push_str(&risk.reasons.join("; "));
        }
        (risk, verdict.with_reason(reason))
    }
}

impl Strategy for Guardian {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn shape(&self) -> InputShape {
        InputShape::Meta
    }

    fn predict(&mut self, ctx: &RoundContext<'_>) -> Result<Option<Side>, StrategyError> {
        Ok(self.decide(ctx).1.prediction)
    }

    fn confidence(&self, ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
        Ok(self.decide(ctx).1.confidence)
    }

    fn probability(&self, ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
        Ok(self.decide(ctx).1.probability)
    }

    fn evaluate(&mut self, ctx: &RoundContext<'_>) -> Result<Verdict, StrategyError> {
        let (risk, verdict) = self.decide(ctx);
        debug!(
            level = %risk.level,
            score = risk.score,
            prediction = ?verdict.prediction,
            source = verdict.source.as_deref().unwrap_or("-"),
            "Guardian decision"
        );
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::testing::{approx, Fixture};
    use crate::strategies::{Capability, StrategyProfile};
    use crate::types::Outcome;

    fn params() -> GuardianParams {
        GuardianParams::from_config(&SimulatorConfig::default())
    }

    fn with_family(mut fixture: Fixture, name: &str, family: Family, verdict: Verdict) -> Fixture {
        fixture.roster.push(StrategyProfile {
            name: name.to_string(),
            capability: Capability::Base,
            family: Some(family),
        });
        fixture.results.insert(name, verdict);
        fixture
    }

    fn train(fixture: &mut Fixture, name: &str, pattern: &str) {
        for c in pattern.chars() {
            let prediction = if c == '1' { Side::Player } else { Side::Banker };
            fixture.tracker.record(name, Some(prediction), Outcome::Player);
        }
    }

    fn split_calls(fixture: Fixture, player: usize, banker: usize) -> Fixture {
        let mut fixture = fixture;
        for i in 0..player {
            fixture = fixture.with_base(&format!("p{}", i), Verdict::new(Side::Player, 60.0, 55.0));
        }
        for i in 0..banker {
            fixture = fixture.with_base(&format!("b{}", i), Verdict::new(Side::Banker, 40.0, 45.0));
        }
        fixture
    }

    #[test]
    fn test_quiet_table_is_low_risk() {
        let fixture = Fixture::new("PPB");
        let risk = assess_risk(&fixture.ctx(), &[], &params());
        assert_eq!(risk.level, RiskLevel::Low);
        assert!(approx(risk.score, 0.0));
        assert!(risk.reasons.is_empty());
    }

    #[test]
    fn test_deviation_and_split_reach_high() {
        let fixture = split_calls(Fixture::new(&"P".repeat(30)), 2, 2);
        let risk = assess_risk(&fixture.ctx(), &[], &params());
        assert!(approx(risk.score, 85.0));
        assert_eq!(risk.level, RiskLevel::High);
        assert_eq!(risk.reasons.len(), 2);
    }

    #[test]
    fn test_regime_ambiguity_peaks_at_half() {
        // 11 hands, 5 chops of 10 pairs.
        let fixture = Fixture::new("PPBBPPBBPPB");
        let risk = assess_risk(&fixture.ctx(), &[], &params());
        assert!(approx(risk.score, 5.0));
    }

    #[test]
    fn test_high_risk_without_strong_signal_abstains() {
        let fixture = split_calls(Fixture::new(&"P".repeat(30)), 2, 2);
        let mut guardian = Guardian::new(params());
        let v = fixture.run(&mut guardian);
        assert!(!v.is_call());
        assert!(v.reason.starts_with("HIGH risk"));
    }

    #[test]
    fn test_high_risk_trusts_a_strong_strategy() {
        let mut fixture = split_calls(Fixture::new(&"P".repeat(30)), 2, 2);
        train(&mut fixture, "b0", "111111");
        let v = fixture.run(&mut Guardian::new(params()));
        assert_eq!(v.prediction, Some(Side::Banker));
        assert_eq!(v.source.as_deref(), Some("b0"));
        assert!(approx(v.confidence, 40.0));
    }

    #[test]
    fn test_high_risk_broad_agreement() {
        let mut p = params();
        p.settings.high_risk = 60.0;
        p.settings.medium_risk = 30.0;
        // 7 vs 1: deviation 50 plus split 12.5.
        let fixture = split_calls(Fixture::new(&"P".repeat(30)), 7, 1);
        let v = fixture.run(&mut Guardian::new(p));
        assert_eq!(v.prediction, Some(Side::Player));
        assert_eq!(v.source.as_deref(), Some("agreement"));
        assert!(approx(v.confidence, 60.0));
        assert!(approx(v.probability, 55.0));
    }

    #[test]
    fn test_medium_risk_scales_top_strategy() {
        let mut fixture = Fixture::new(&"P".repeat(30))
            .with_base("A", Verdict::new(Side::Banker, 50.0, 60.0));
        train(&mut fixture, "A", "110110");
        let v = fixture.run(&mut Guardian::new(params()));
        assert_eq!(v.prediction, Some(Side::Banker));
        assert!(approx(v.confidence, 40.0));
        assert!(approx(v.probability, 57.0));
        assert!(v.reason.starts_with("MEDIUM risk"));
    }

    #[test]
    fn test_low_risk_routes_to_matching_family() {
        // PPPPPB: one chop in five pairs, an orderly shoe.
        let mut fixture = with_family(
            Fixture::new("PPPPPB"),
            "chop",
            Family::Choppy,
            Verdict::new(Side::Player, 70.0, 50.0),
        );
        fixture = with_family(fixture, "streak", Family::Orderly, Verdict::new(Side::Banker, 55.0, 52.0));
        train(&mut fixture, "chop", "111111");
        train(&mut fixture, "streak", "110110");

        let v = fixture.run(&mut Guardian::new(params()));
        assert_eq!(v.prediction, Some(Side::Banker));
        assert_eq!(v.source.as_deref(), Some("streak"));
        assert!(approx(v.confidence, 55.0));
    }

    #[test]
    fn test_low_risk_weighted_vote() {
        let mut fixture = Fixture::new("PB")
            .with_base("A", Verdict::new(Side::Player, 50.0, 54.0))
            .with_base("B", Verdict::new(Side::Player, 50.0, 58.0))
            .with_base("C", Verdict::new(Side::Banker, 50.0, 50.0));
        train(&mut fixture, "A", "111111");
        train(&mut fixture, "B", "111111");
        train(&mut fixture, "C", "111111");

        let v = fixture.run(&mut Guardian::new(params()));
        assert_eq!(v.prediction, Some(Side::Player));
        assert_eq!(v.source.as_deref(), Some("weighted vote"));
        assert!((v.confidence - 200.0 / 3.0).abs() < 1e-6);
        assert!(approx(v.probability, 56.0));
    }

    #[test]
    fn test_low_risk_close_vote_abstains() {
        let mut fixture = Fixture::new("PB")
            .with_base("A", Verdict::new(Side::Player, 50.0, 54.0))
            .with_base("C", Verdict::new(Side::Banker, 50.0, 50.0));
        train(&mut fixture, "A", "111111");
        train(&mut fixture, "C", "111111");
        assert!(!fixture.run(&mut Guardian::new(params())).is_call());
    }
}
