#![allow(dead_code)]
use serde::{Deserialize, Serialize};

use super::outcome::{Outcome, Side};

/// Aggregate Player/Banker/Tie counts for the display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub player: usize,
    pub banker: usize,
    pub tie: usize,
}

impl OutcomeCounts {
    pub fn total(&self) -> usize {
        self.player + self.banker + self.tie
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        match outcome {
            Outcome::Player => self.player,
            Outcome::Banker => self.banker,
            Outcome::Tie => self.tie,
        }
    }

    /// Share of all hands, in percent. Zero when nothing has been recorded.
    pub fn pct(&self, outcome: Outcome) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.count(outcome) as f64 / total as f64 * 100.0
        }
    }

    fn add(&mut self, outcome: Outcome, delta: isize) {
        let slot = match outcome {
            Outcome::Player => &mut self.player,
            Outcome::Banker => &mut self.banker,
            Outcome::Tie => &mut self.tie,
        };
        *slot = slot.saturating_add_signed(delta);
    }
}

/// Ordered record of revealed outcomes.
///
/// Only `push` and the single-step `pop_last` mutate the sequence. Shoe marks
/// record the history length at which each fresh shoe started dealing.
#[derive(Debug, Clone, Default)]
pub struct OutcomeHistory {
    outcomes: Vec<Outcome>,
    shoe_marks: Vec<usize>,
    counts: OutcomeCounts,
}

impl OutcomeHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_outcomes(outcomes: &[Outcome]) -> Self {
        let mut history = Self::new();
        for &outcome in outcomes {
            history.push(outcome);
        }
        history
    }

    pub fn push(&mut self, outcome: Outcome) {
        self.outcomes.push(outcome);
        self.counts.add(outcome, 1);
    }

    /// Removes the most recent outcome and any shoe mark that pointed past it.
    pub fn pop_last(&mut self) -> Option<Outcome> {
        let outcome = self.outcomes.pop()?;
        self.counts.add(outcome, -1);
        let len = self.outcomes.len();
        while self.shoe_marks.last().is_some_and(|&mark| mark > len) {
            self.shoe_marks.pop();
        }
        Some(outcome)
    }

    pub fn clear(&mut self) {
        self.outcomes.clear();
        self.shoe_marks.clear();
        self.counts = OutcomeCounts::default();
    }

    /// Records that the next outcome comes from a freshly shuffled shoe.
    pub fn mark_new_shoe(&mut self) {
        let len = self.outcomes.len();
        if self.shoe_marks.last() != Some(&len) {
            self.shoe_marks.push(len);
        }
    }

    pub fn shoe_marks(&self) -> &[usize] {
        &self.shoe_marks
    }

    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn last(&self) -> Option<Outcome> {
        self.outcomes.last().copied()
    }

    pub fn counts(&self) -> OutcomeCounts {
        self.counts
    }

    /// Player/Banker results in order, Ties filtered out.
    pub fn decided(&self) -> Vec<Side> {
        decided_sides(&self.outcomes)
    }
}

pub fn decided_sides(outcomes: &[Outcome]) -> Vec<Side> {
    outcomes.iter().filter_map(|o| o.side()).collect()
}
