use std::sync::atomic::{AtomicU32, Ordering};

use chrono::Utc;

use crate::error::StrategyError;
use crate::types::Side;
use super::{RoundContext, Strategy};

/// Source of sub-second time for timing-based predictors.
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send {
    /// Microseconds past the current second.
    fn subsec_micros(&self) -> u32;
}

/// Wall clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn subsec_micros(&self) -> u32 {
        Utc::now().timestamp_subsec_micros()
    }
}

/// Deterministic clock for seeded runs: every read advances by `step`.
pub struct StepClock {
    next: AtomicU32,
    step: u32,
}

impl StepClock {
    pub fn new(start: u32, step: u32) -> Self {
        Self {
            next: AtomicU32::new(start),
            step,
        }
    }
}

impl Clock for StepClock {
    fn subsec_micros(&self) -> u32 {
        self.next.fetch_add(self.step, Ordering::Relaxed) % 1_000_000
    }
}

/// Chaos Walker
/// Odd microsecond reading means Player, even means Banker.
pub struct ChaosWalker {
    clock: Box<dyn Clock>,
}

impl ChaosWalker {
    pub fn new(clock: Box<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn system() -> Self {
        Self::new(Box::new(SystemClock))
    }
}

impl Strategy for ChaosWalker {
    fn name(&self) -> &str {
        "Chaos Walker"
    }

    fn predict(&mut self, _ctx: &RoundContext<'_>) -> Result<Option<Side>, StrategyError> {
        Ok(Some(if self.clock.subsec_micros() % 2 == 1 {
            Side::Player
        } else {
            Side::Banker
        }))
    }

    fn confidence(&self, _ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
        Ok(35.0)
    }

    fn probability(&self, _ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
        Ok(50.0)
    }
}
