use serde::Serialize;

use crate::config::Arbiter;
use crate::ensemble::PerformanceTracker;
use crate::risk::{RiskAssessment, Settlement, StakingSnapshot};
use crate::strategies::{Capability, StrategyProfile, Verdict};
use crate::types::{prediction_label, Outcome, OutcomeCounts};

/// One row of the strategy statistics table.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyStatRow {
    pub name: String,
    pub capability: Capability,
    pub last_prediction: String,
    pub correct: u64,
    pub total: u64,
    pub accuracy_pct: f64,
    pub recent_accuracy_pct: f64,
}

/// Streaks over the settled bets of a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BetStreaks {
    /// Positive for wins, negative for losses.
    pub current_streak: i32,
    pub max_win_streak: u32,
    pub max_loss_streak: u32,
    /// Staked hands in the longest run without a win. Pushes inside a
    /// losing run extend it.
    pub longest_loss_series: u32,
}

/// Everything the table display shows after a round.
#[derive(Debug, Clone, Serialize)]
pub struct TableSnapshot {
    pub hands: usize,
    pub counts: OutcomeCounts,
    pub player_pct: f64,
    pub banker_pct: f64,
    pub tie_pct: f64,
    pub recent: String,
    pub staking: StakingSnapshot,
    pub arbiter: Arbiter,
    pub pick: Verdict,
    pub risk: RiskAssessment,
}

impl TableSnapshot {
    pub fn print(&self) {
        println!("\n{}", "=".repeat(60));
        println!("                    TABLE");
        println!("{}", "=".repeat(60));
        println!(
            "Hands: {}  Player: {} ({:.1}%)  Banker: {} ({:.1}%)  Tie: {} ({:.1}%)",
            self.hands,
            self.counts.player,
            self.player_pct,
            self.counts.banker,
            self.banker_pct,
            self.counts.tie,
            self.tie_pct
        );
        println!("Recent:             {}", self.recent);
        println!("{}", "-".repeat(60));
        println!("Bankroll:           {:.2}", self.staking.bankroll);
        println!("Next Bet:           {:.2} (rung {})", self.staking.bet, self.staking.rung + 1);
        println!(
            "Streaks:            W{} / L{} (max W{} / L{})",
            self.staking.win_streak,
            self.staking.loss_streak,
            self.staking.max_win_streak,
            self.staking.max_loss_streak
        );
        println!("{}", "-".repeat(60));
        println!(
            "Prediction ({:?}):  {}  conf {:.1}%  prob {:.1}%  via {}",
            self.arbiter,
            prediction_label(self.pick.prediction),
            self.pick.confidence,
            self.pick.probability,
            self.pick.source.as_deref().unwrap_or("-")
        );
        println!("Risk:               {} ({:.0})", self.risk.level, self.risk.score);
        println!("{}", "=".repeat(60));
    }
}

pub struct AnalyticsCalculator;

impl AnalyticsCalculator {
    /// Tracked strategies, best accuracy first.
    pub fn strategy_rows(roster: &[StrategyProfile], tracker: &PerformanceTracker) -> Vec<StrategyStatRow> {
        let mut rows: Vec<StrategyStatRow> = roster
            .iter()
            .map(|profile| {
                let stat = tracker.stat(&profile.name);
                StrategyStatRow {
                    name: profile.name.clone(),
                    capability: profile.capability,
                    last_prediction: prediction_label(stat.and_then(|s| s.last_prediction)),
                    correct: stat.map_or(0, |s| s.correct),
                    total: stat.map_or(0, |s| s.total),
                    accuracy_pct: stat.map_or(0.0, |s| s.win_rate() * 100.0),
                    recent_accuracy_pct: tracker.recent_accuracy(&profile.name, tracker.window()) * 100.0,
                }
            })
            .collect();
        rows.sort_by(|a, b| b.accuracy_pct.total_cmp(&a.accuracy_pct));
        rows
    }

    pub fn bet_streaks(settled: &[Settlement]) -> BetStreaks {
        let mut streaks = BetStreaks::default();
        let mut wins = 0u32;
        let mut losses = 0u32;
        let mut series = 0u32;
        for settlement in settled {
            match settlement {
                Settlement::Won { .. } => {
                    wins += 1;
                    losses = 0;
                    series = 0;
                    streaks.max_win_streak = streaks.max_win_streak.max(wins);
                    streaks.current_streak = wins as i32;
                }
                Settlement::Lost { .. } => {
                    losses += 1;
                    wins = 0;
                    series += 1;
                    streaks.max_loss_streak = streaks.max_loss_streak.max(losses);
                    streaks.current_streak = -(losses as i32);
                }
                Settlement::Push { .. } if series > 0 => series += 1,
                Settlement::NoBet | Settlement::Push { .. } => {}
            }
            streaks.longest_loss_series = streaks.longest_loss_series.max(series);
        }
        streaks
    }

    /// Win rate in % over the last `n` settled bets, once `n` exist.
    pub fn recent_bet_win_rate(settled: &[Settlement], n: usize) -> Option<f64> {
        let bets: Vec<&Settlement> = settled.iter().filter(|s| s.is_settled()).collect();
        if n == 0 || bets.len() < n {
            return None;
        }
        let won = bets[bets.len() - n..]
            .iter()
            .filter(|s| matches!(s, Settlement::Won { .. }))
            .count();
        Some(won as f64 / n as f64 * 100.0)
    }

    /// Last `n` outcomes as a code string, oldest first.
    pub fn recent_codes(outcomes: &[Outcome], n: usize) -> String {
        outcomes[outcomes.len().saturating_sub(n)..]
            .iter()
            .map(|o| o.code())
            .collect()
    }
}
