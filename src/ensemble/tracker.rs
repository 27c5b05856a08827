use std::collections::{HashMap, VecDeque};

use serde::Serialize;
use tracing::debug;

use crate::types::{Outcome, Side};

/// One judged prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Judgement {
    pub prediction: Side,
    pub outcome: Side,
    pub correct: bool,
}

/// Lifetime counters plus a bounded FIFO of the latest judgements.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PerformanceStat {
    pub correct: u64,
    pub total: u64,
    pub last_prediction: Option<Side>,
    recent: VecDeque<Judgement>,
}

impl PerformanceStat {
    /// Lifetime hit rate in [0, 1].
    pub fn win_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }

    /// Oldest first.
    pub fn recent(&self) -> impl Iterator<Item = &Judgement> {
        self.recent.iter()
    }

    pub fn recent_len(&self) -> usize {
        self.recent.len()
    }

    /// Length of the unbroken run of correct judgements ending now.
    pub fn consecutive_correct(&self) -> usize {
        self.recent.iter().rev().take_while(|j| j.correct).count()
    }
}

/// Per-strategy accuracy accounting.
///
/// Only Player/Banker predictions judged against Player/Banker outcomes count;
/// abstentions and pushes never touch the counters.
pub struct PerformanceTracker {
    window: usize,
    stats: HashMap<String, PerformanceStat>,
}

impl PerformanceTracker {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            stats: HashMap::new(),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Records one strategy's prediction against the revealed outcome.
    /// Returns whether it was correct, or `None` when nothing was recorded.
    pub fn record(&mut self, name: &str, prediction: Option<Side>, outcome: Outcome) -> Option<bool> {
        let prediction = prediction?;
        let actual = outcome.side()?;
        let correct = prediction == actual;

        let stat = self.stats.entry(name.to_string()).or_default();
        stat.total += 1;
        if correct {
            stat.correct += 1;
        }
        stat.last_prediction = Some(prediction);
        stat.recent.push_back(Judgement {
            prediction,
            outcome: actual,
            correct,
        });
        while stat.recent.len() > self.window {
            stat.recent.pop_front();
        }

        debug!(strategy = name, correct, total = stat.total, "Prediction judged");
        Some(correct)
    }

    /// Records a whole round of predictions.
    pub fn record_round<'a, I>(&mut self, predictions: I, outcome: Outcome)
    where
        I: IntoIterator<Item = (&'a str, Option<Side>)>,
    {
        if outcome.is_tie() {
            return;
        }
        for (name, prediction) in predictions {
            self.record(name, prediction, outcome);
        }
    }

    pub fn stat(&self, name: &str) -> Option<&PerformanceStat> {
        self.stats.get(name)
    }

    /// Fraction correct over the last `min(n, available)` judgements.
    pub fn recent_accuracy(&self, name: &str, n: usize) -> f64 {
        let Some(stat) = self.stats.get(name) else {
            return 0.0;
        };
        let take = n.min(stat.recent.len());
        if take == 0 {
            return 0.0;
        }
        let correct = stat.recent.iter().rev().take(take).filter(|j| j.correct).count();
        correct as f64 / take as f64
    }

    /// True iff at least `n` judgements exist and the last `n` were all correct.
    pub fn all_correct_in_last_n(&self, name: &str, n: usize) -> bool {
        match self.stats.get(name) {
            Some(stat) if stat.recent.len() >= n => {
                stat.recent.iter().rev().take(n).all(|j| j.correct)
            }
            _ => false,
        }
    }

    pub fn consecutive_correct(&self, name: &str) -> usize {
        self.stats
            .get(name)
            .map(|s| s.consecutive_correct())
            .unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PerformanceStat)> {
        self.stats.iter()
    }

    pub fn reset(&mut self) {
        self.stats.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ties_and_abstentions_are_invisible() {
        let mut tracker = PerformanceTracker::new(10);
        assert_eq!(tracker.record("Zigzag", Some(Side::Player), Outcome::Tie), None);
        assert_eq!(tracker.record("Zigzag", None, Outcome::Player), None);
        assert!(tracker.stat("Zigzag").is_none());
    }

    #[test]
    fn test_lifetime_counters() {
        let mut tracker = PerformanceTracker::new(10);
        tracker.record("Zigzag", Some(Side::Player), Outcome::Player);
        tracker.record("Zigzag", Some(Side::Player), Outcome::Banker);
        tracker.record("Zigzag", Some(Side::Banker), Outcome::Banker);

        let stat = tracker.stat("Zigzag").unwrap();
        assert_eq!(stat.total, 3);
        assert_eq!(stat.correct, 2);
        assert_eq!(stat.last_prediction, Some(Side::Banker));
        assert!((stat.win_rate() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_window_is_bounded_fifo() {
        let mut tracker = PerformanceTracker::new(3);
        tracker.record("Lazy", Some(Side::Player), Outcome::Banker);
        for _ in 0..3 {
            tracker.record("Lazy", Some(Side::Player), Outcome::Player);
        }
        let stat = tracker.stat("Lazy").unwrap();
        assert_eq!(stat.recent_len(), 3);
        assert_eq!(stat.total, 4);
        assert!((tracker.recent_accuracy("Lazy", 10) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_recent_accuracy_uses_available_records() {
        let mut tracker = PerformanceTracker::new(10);
        tracker.record("Mirror", Some(Side::Player), Outcome::Banker);
        tracker.record("Mirror", Some(Side::Player), Outcome::Player);
        assert!((tracker.recent_accuracy("Mirror", 5) - 0.5).abs() < 1e-9);
        assert!((tracker.recent_accuracy("Mirror", 1) - 1.0).abs() < 1e-9);
        assert_eq!(tracker.recent_accuracy("Unknown", 5), 0.0);
    }

    #[test]
    fn test_all_correct_in_last_n_needs_enough_records() {
        let mut tracker = PerformanceTracker::new(10);
        tracker.record("Oracle Grid", Some(Side::Banker), Outcome::Banker);
        assert!(!tracker.all_correct_in_last_n("Oracle Grid", 2));
        tracker.record("Oracle Grid", Some(Side::Player), Outcome::Player);
        assert!(tracker.all_correct_in_last_n("Oracle Grid", 2));
        assert_eq!(tracker.consecutive_correct("Oracle Grid"), 2);
        tracker.record("Oracle Grid", Some(Side::Player), Outcome::Banker);
        assert!(!tracker.all_correct_in_last_n("Oracle Grid", 2));
        assert_eq!(tracker.consecutive_correct("Oracle Grid"), 0);
    }

    #[test]
    fn test_record_round_skips_ties() {
        let mut tracker = PerformanceTracker::new(10);
        let round = vec![("A", Some(Side::Player)), ("B", Some(Side::Banker)), ("C", None)];
        tracker.record_round(round.clone(), Outcome::Tie);
        assert_eq!(tracker.iter().count(), 0);
        tracker.record_round(round, Outcome::Banker);
        assert_eq!(tracker.stat("A").unwrap().correct, 0);
        assert_eq!(tracker.stat("B").unwrap().correct, 1);
        assert!(tracker.stat("C").is_none());
    }
}
