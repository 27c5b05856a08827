use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use uuid::Uuid;

use crate::analytics::{BetStreaks, StrategyStatRow};
use crate::config::Arbiter;
use crate::types::OutcomeCounts;

/// End-of-session summary with all metrics
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub arbiter: Arbiter,

    // Table
    pub total_hands: usize,
    pub counts: OutcomeCounts,

    // Bets
    pub bets_placed: u64,
    pub bets_won: u64,
    pub bets_lost: u64,
    pub pushes: u64,
    pub win_rate_pct: f64,
    pub recent_win_rate_pct: Option<f64>,
    pub streaks: BetStreaks,

    // Bankroll
    pub initial_bankroll: Decimal,
    pub final_bankroll: Decimal,
    pub profit: Decimal,
    pub profit_pct: Decimal,

    // Strategies
    pub strategies: Vec<StrategyStatRow>,
}

impl SessionReport {
    pub fn profit_pct_of(initial: Decimal, final_bankroll: Decimal) -> Decimal {
        if initial.is_zero() {
            Decimal::ZERO
        } else {
            (final_bankroll - initial) / initial * dec!(100)
        }
    }

    /// Advice lines derived from streaks, strategy accuracy and recent bets.
    pub fn recommendations(&self) -> Vec<String> {
        let mut advice = Vec::new();

        if self.streaks.max_loss_streak > 10 {
            advice.push(format!(
                "! Consider a longer bet ladder: a {}-hand losing streak occurred.",
                self.streaks.max_loss_streak
            ));
        }

        let best = self
            .strategies
            .iter()
            .filter(|row| row.total > 20)
            .max_by(|a, b| a.accuracy_pct.total_cmp(&b.accuracy_pct));
        if let Some(best) = best.filter(|row| row.accuracy_pct > 55.0) {
            advice.push(format!(
                "+ Best strategy: {} ({:.1}%). Consider giving it more weight.",
                best.name, best.accuracy_pct
            ));
        }

        if let Some(rate) = self.recent_win_rate_pct.filter(|rate| *rate < 40.0) {
            advice.push(format!(
                "! Win rate over the last 20 bets is low ({:.1}%). Review the strategy selection criteria.",
                rate
            ));
        }

        advice
    }

    /// Pretty print results to console
    pub fn print_summary(&self) {
        println!("\n{}", "=".repeat(60));
        println!("                    SESSION RESULTS");
        println!("{}", "=".repeat(60));
        println!("Session:            {}", self.session_id);
        println!("Arbiter:            {:?}", self.arbiter);
        println!("Hands:              {}", self.total_hands);
        println!(
            "Outcomes:           P {} / B {} / T {}",
            self.counts.player, self.counts.banker, self.counts.tie
        );
        println!("{}", "-".repeat(60));
        println!("BANKROLL");
        println!("  Initial:            {:.2}", self.initial_bankroll);
        println!("  Final:              {:.2}", self.final_bankroll);
        println!("  Profit:             {:.2} ({:.1}%)", self.profit, self.profit_pct);
        println!("{}", "-".repeat(60));
        println!("BETS");
        println!("  Placed:             {}", self.bets_placed);
        println!("  Won:                {} ({:.1}%)", self.bets_won, self.win_rate_pct);
        println!("  Lost:               {}", self.bets_lost);
        println!("  Pushes:             {}", self.pushes);
        println!("  Max Win Streak:     {}", self.streaks.max_win_streak);
        println!("  Max Loss Streak:    {}", self.streaks.max_loss_streak);
        println!("  Longest Loss Run:   {} hands", self.streaks.longest_loss_series);
        println!("{}", "-".repeat(60));
        println!("STRATEGIES");
        for row in self.strategies.iter().filter(|r| r.total > 0) {
            println!(
                "  {:<28} {:>4}/{:<4} ({:.1}%)",
                row.name, row.correct, row.total, row.accuracy_pct
            );
        }
        let advice = self.recommendations();
        if !advice.is_empty() {
            println!("{}", "-".repeat(60));
            println!("RECOMMENDATIONS");
            for line in advice {
                println!("  {}", line);
            }
        }
        println!("{}", "=".repeat(60));
    }
}
