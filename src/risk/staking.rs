use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::StakingSettings;
use crate::types::{Outcome, Side};

/// Result of one round for the staking engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Settlement {
    /// No side was surfaced.
    NoBet,
    /// Tie: stake returned.
    Push { stake: Decimal },
    Won { stake: Decimal, payout: Decimal },
    Lost { stake: Decimal },
}

impl Settlement {
    pub fn is_settled(&self) -> bool {
        matches!(self, Settlement::Won { .. } | Settlement::Lost { .. })
    }

    /// Bankroll change caused by this settlement.
    pub fn net(&self) -> Decimal {
        match self {
            Settlement::Won { payout, .. } => *payout,
            Settlement::Lost { stake } => -*stake,
            Settlement::NoBet | Settlement::Push { .. } => Decimal::ZERO,
        }
    }
}

/// Point-in-time view of the staking state, for display and logs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StakingSnapshot {
    pub bankroll: Decimal,
    pub bet: Decimal,
    pub rung: usize,
    pub win_streak: u32,
    pub loss_streak: u32,
    pub max_win_streak: u32,
    pub max_loss_streak: u32,
}

/// Martingale ladder: a loss climbs one rung, a win drops back to the first.
#[derive(Debug, Clone)]
pub struct StakingEngine {
    ladder: Vec<Decimal>,
    initial_bankroll: Decimal,
    banker_commission: Decimal,
    bankroll: Decimal,
    rung: usize,
    win_streak: u32,
    loss_streak: u32,
    max_win_streak: u32,
    max_loss_streak: u32,
    /// Won/lost bets in order, pushes excluded.
    settled: Vec<Settlement>,
}

impl StakingEngine {
    pub fn new(ladder: Vec<Decimal>, initial_bankroll: Decimal, banker_commission: Decimal) -> Self {
        Self {
            ladder,
            initial_bankroll,
            banker_commission,
            bankroll: initial_bankroll,
            rung: 0,
            win_streak: 0,
            loss_streak: 0,
            max_win_streak: 0,
            max_loss_streak: 0,
            settled: Vec::new(),
        }
    }

    pub fn from_settings(settings: &StakingSettings) -> Self {
        Self::new(
            settings.ladder(),
            settings.initial_bankroll,
            settings.banker_commission,
        )
    }

    pub fn current_bet(&self) -> Decimal {
        self.ladder.get(self.rung).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn bankroll(&self) -> Decimal {
        self.bankroll
    }

    pub fn initial_bankroll(&self) -> Decimal {
        self.initial_bankroll
    }

    pub fn rung(&self) -> usize {
        self.rung
    }

    /// Every staked round in order, pushes included.
    pub fn settled(&self) -> &[Settlement] {
        &self.settled
    }

    fn last_rung(&self) -> usize {
        self.ladder.len().saturating_sub(1)
    }

    /// Settles the surfaced prediction against the revealed outcome.
    pub fn settle(&mut self, prediction: Option<Side>, outcome: Outcome) -> Settlement {
        let Some(side) = prediction else {
            return Settlement::NoBet;
        };
        let stake = self.current_bet();
        let Some(actual) = outcome.side() else {
            let push = Settlement::Push { stake };
            self.settled.push(push);
            return push;
        };

        let settlement = if side == actual {
            let payout = match side {
                Side::Player => stake,
                Side::Banker => stake * (Decimal::ONE - self.banker_commission),
            };
            self.bankroll += payout;
            self.rung = 0;
            self.loss_streak = 0;
            self.win_streak += 1;
            self.max_win_streak = self.max_win_streak.max(self.win_streak);
            Settlement::Won { stake, payout }
        } else {
            self.bankroll -= stake;
            self.rung = (self.rung + 1).min(self.last_rung());
            self.win_streak = 0;
            self.loss_streak += 1;
            self.max_loss_streak = self.max_loss_streak.max(self.loss_streak);
            Settlement::Lost { stake }
        };

        debug!(
            settlement = ?settlement,
            bankroll = %self.bankroll,
            next_bet = %self.current_bet(),
            "Bet settled"
        );
        self.settled.push(settlement);
        settlement
    }

    pub fn snapshot(&self) -> StakingSnapshot {
        StakingSnapshot {
            bankroll: self.bankroll,
            bet: self.current_bet(),
            rung: self.rung,
            win_streak: self.win_streak,
            loss_streak: self.loss_streak,
            max_win_streak: self.max_win_streak,
            max_loss_streak: self.max_loss_streak,
        }
    }

    pub fn reset(&mut self) {
        self.bankroll = self.initial_bankroll;
        self.rung = 0;
        self.win_streak = 0;
        self.loss_streak = 0;
        self.max_win_streak = 0;
        self.max_loss_streak = 0;
        self.settled.clear();
    }
}
