use tracing::debug;

use crate::config::ConsensusSettings;
use crate::strategies::{Capability, RoundResults, StrategyProfile, Verdict};
use super::PerformanceTracker;

/// Picks the surfaced prediction from strategies on an unbroken correct run,
/// falling back to the best lifetime rates. Any disagreement voids the pick.
#[derive(Debug, Clone)]
pub struct ConsensusSelector {
    min_consistent: usize,
    min_sample_size: u64,
    fallback_top: usize,
}

impl ConsensusSelector {
    pub fn new(settings: &ConsensusSettings) -> Self {
        Self {
            min_consistent: settings.min_consistent.max(1),
            min_sample_size: u64::from(settings.min_sample_size),
            fallback_top: settings.fallback_top.max(1),
        }
    }

    pub fn select(
        &self,
        results: &RoundResults,
        tracker: &PerformanceTracker,
        roster: &[StrategyProfile],
    ) -> Verdict {
        let calls: Vec<(&str, &Verdict)> = results
            .iter()
            .filter(|(name, verdict)| {
                verdict.is_call()
                    && roster
                        .iter()
                        .any(|p| p.name == *name && p.capability == Capability::Base)
            })
            .collect();

        let mut reason = "consistent";
        let mut candidates: Vec<(&str, &Verdict)> = calls
            .iter()
            .filter(|(name, _)| tracker.all_correct_in_last_n(name, self.min_consistent))
            .copied()
            .collect();

        if candidates.is_empty() {
            reason = "best lifetime rate";
            let mut ranked: Vec<(&str, &Verdict, f64)> = calls
                .iter()
                .filter_map(|(name, verdict)| {
                    tracker
                        .stat(name)
                        .filter(|stat| stat.total >= self.min_sample_size)
                        .map(|stat| (*name, *verdict, stat.win_rate()))
                })
                .collect();
            ranked.sort_by(|a, b| b.2.total_cmp(&a.2));
            candidates = ranked
                .into_iter()
                .take(self.fallback_top)
                .map(|(name, verdict, _)| (name, verdict))
                .collect();
        }

        let Some((_, first)) = candidates.first() else {
            debug!("Consensus: no candidates");
            return Verdict::abstain().with_reason("no candidates");
        };
        if candidates.iter().any(|(_, v)| v.prediction != first.prediction) {
            debug!(candidates = candidates.len(), "Consensus: candidates disagree");
            return Verdict::abstain().with_reason("candidates disagree");
        }

        let mut best = candidates[0];
        for candidate in &candidates[1..] {
            if candidate.1.confidence > best.1.confidence {
                best = *candidate;
            }
        }
        debug!(source = best.0, candidates = candidates.len(), "Consensus pick");

        Verdict {
            source: Some(best.0.to_string()),
            reason: format!("{} ({} agreeing)", reason, candidates.len()),
            ..best.1.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Outcome, Side};

    fn base(name: &str) -> StrategyProfile {
        StrategyProfile {
            name: name.to_string(),
            capability: Capability::Base,
            family: None,
        }
    }

    fn selector() -> ConsensusSelector {
        ConsensusSelector::new(&ConsensusSettings::default())
    }

    /// Feeds `pattern` ('1' correct, '0' wrong) into the tracker for `name`.
    fn train(tracker: &mut PerformanceTracker, name: &str, pattern: &str) {
        for c in pattern.chars() {
            let prediction = if c == '1' { Side::Player } else { Side::Banker };
            tracker.record(name, Some(prediction), Outcome::Player);
        }
    }

    #[test]
    fn test_unanimous_candidates_pick_highest_confidence() {
        let mut tracker = PerformanceTracker::new(10);
        train(&mut tracker, "A", "11");
        train(&mut tracker, "B", "011");
        train(&mut tracker, "C", "10");

        let mut results = RoundResults::new();
        results.insert("A", Verdict::new(Side::Banker, 55.0, 51.0));
        results.insert("B", Verdict::new(Side::Banker, 70.0, 52.0));
        // C is not on a run, so its disagreement does not matter.
        results.insert("C", Verdict::new(Side::Player, 90.0, 60.0));
        let roster = vec![base("A"), base("B"), base("C")];

        let v = selector().select(&results, &tracker, &roster);
        assert_eq!(v.prediction, Some(Side::Banker));
        assert_eq!(v.confidence, 70.0);
        assert_eq!(v.probability, 52.0);
        assert_eq!(v.source.as_deref(), Some("B"));
    }

    #[test]
    fn test_disagreement_voids_the_pick() {
        let mut tracker = PerformanceTracker::new(10);
        train(&mut tracker, "A", "11");
        train(&mut tracker, "B", "11");

        let mut results = RoundResults::new();
        results.insert("A", Verdict::new(Side::Banker, 55.0, 51.0));
        results.insert("B", Verdict::new(Side::Player, 70.0, 52.0));

        let v = selector().select(&results, &tracker, &[base("A"), base("B")]);
        assert!(!v.is_call());
        assert_eq!(v.confidence, 0.0);
        assert_eq!(v.probability, 0.0);
    }

    #[test]
    fn test_fallback_uses_best_lifetime_rates() {
        let mut tracker = PerformanceTracker::new(10);
        train(&mut tracker, "A", "11110");
        train(&mut tracker, "B", "10100");
        train(&mut tracker, "C", "11100");
        train(&mut tracker, "D", "11010");
        train(&mut tracker, "E", "1110"); // below the sample size

        let mut results = RoundResults::new();
        results.insert("A", Verdict::new(Side::Player, 40.0, 50.0));
        results.insert("B", Verdict::new(Side::Banker, 40.0, 50.0));
        results.insert("C", Verdict::new(Side::Player, 65.0, 55.0));
        results.insert("D", Verdict::new(Side::Player, 60.0, 50.0));
        results.insert("E", Verdict::new(Side::Banker, 99.0, 50.0));
        let roster: Vec<_> = ["A", "B", "C", "D", "E"].iter().map(|n| base(n)).collect();

        // Top three by rate are A (0.8), C (0.6) and D (0.6); B is left out.
        let v = selector().select(&results, &tracker, &roster);
        assert_eq!(v.prediction, Some(Side::Player));
        assert_eq!(v.source.as_deref(), Some("C"));
    }

    #[test]
    fn test_non_base_strategies_are_not_candidates() {
        let mut tracker = PerformanceTracker::new(10);
        train(&mut tracker, "Guardian", "11111");

        let mut results = RoundResults::new();
        results.insert("Guardian", Verdict::new(Side::Player, 80.0, 60.0));
        let roster = vec![StrategyProfile {
            name: "Guardian".to_string(),
            capability: Capability::Meta,
            family: None,
        }];

        assert!(!selector().select(&results, &tracker, &roster).is_call());
    }
}
