use serde::Serialize;

use crate::config::GuardianSettings;
use crate::strategies::{Capability, Family, RoundContext, Verdict};

/// A base strategy's standing for the current round.
#[derive(Debug, Clone, Serialize)]
pub struct RankedStrategy {
    pub name: String,
    pub family: Option<Family>,
    /// Lifetime accuracy, 0-100.
    pub overall: f64,
    /// Accuracy over the recent window, 0-100.
    pub recent: f64,
    pub streak_bonus: f64,
    pub blended: f64,
    pub verdict: Verdict,
}

/// Blend weights and eligibility rules for ranking.
#[derive(Debug, Clone)]
pub struct RankingRules {
    pub min_sample_size: u64,
    pub recent_window: usize,
    pub overall_weight: f64,
    pub recent_weight: f64,
    pub streak_bonus_step: f64,
    pub streak_bonus_cap: f64,
}

impl From<&GuardianSettings> for RankingRules {
    fn from(settings: &GuardianSettings) -> Self {
        Self {
            min_sample_size: u64::from(settings.min_sample_size),
            recent_window: settings.recent_window.max(1),
            overall_weight: settings.overall_weight,
            recent_weight: settings.recent_weight,
            streak_bonus_step: settings.streak_bonus_step,
            streak_bonus_cap: settings.streak_bonus_cap,
        }
    }
}

/// Base strategies with a call this round and enough history, best first.
/// Equal scores keep roster order.
pub fn rank_strategies(ctx: &RoundContext<'_>, rules: &RankingRules) -> Vec<RankedStrategy> {
    let mut ranked: Vec<RankedStrategy> = ctx
        .roster
        .iter()
        .filter(|profile| profile.capability == Capability::Base)
        .filter_map(|profile| {
            let verdict = ctx.results.get(&profile.name).filter(|v| v.is_call())?;
            let stat = ctx
                .tracker
                .stat(&profile.name)
                .filter(|s| s.total >= rules.min_sample_size)?;

            let overall = stat.win_rate() * 100.0;
            let recent = ctx.tracker.recent_accuracy(&profile.name, rules.recent_window) * 100.0;
            let streak_bonus = (stat.consecutive_correct() as f64 * rules.streak_bonus_step)
                .min(rules.streak_bonus_cap);
            Some(RankedStrategy {
                name: profile.name.clone(),
                family: profile.family,
                overall,
                recent,
                streak_bonus,
                blended: overall * rules.overall_weight + recent * rules.recent_weight + streak_bonus,
                verdict: verdict.clone(),
            })
        })
        .collect();

    ranked.sort_by(|a, b| b.blended.total_cmp(&a.blended));
    ranked
}
