use std::collections::BTreeSet;

use crate::error::StrategyError;
use crate::types::{decided_sides, OutcomeHistory, Side};
use super::{RoundContext, Strategy};

/// The decided hand at the same position of the previous shoe.
fn previous_shoe_counterpart(history: &OutcomeHistory) -> Option<Side> {
    let marks = history.shoe_marks();
    let [.., previous_start, current_start] = marks else {
        return None;
    };
    let outcomes = history.outcomes();
    let previous = decided_sides(outcomes.get(*previous_start..*current_start)?);
    let position = decided_sides(outcomes.get(*current_start..)?).len();
    previous.get(position).copied()
}

/// Mirror
/// Expects hand `i` of this shoe to repeat hand `i` of the previous shoe.
pub struct Mirror;

impl Strategy for Mirror {
    fn name(&self) -> &str {
        "Mirror"
    }

    fn predict(&mut self, ctx: &RoundContext<'_>) -> Result<Option<Side>, StrategyError> {
        Ok(previous_shoe_counterpart(ctx.history))
    }

    fn confidence(&self, _ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
        Ok(30.0)
    }

    fn probability(&self, _ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
        Ok(50.0)
    }
}

/// Anti-Mirror: the inverse of [`Mirror`].
pub struct AntiMirror;

impl Strategy for AntiMirror {
    fn name(&self) -> &str {
        "Anti-Mirror"
    }

    fn predict(&mut self, ctx: &RoundContext<'_>) -> Result<Option<Side>, StrategyError> {
        Ok(previous_shoe_counterpart(ctx.history).map(|s| s.opposite()))
    }

    fn confidence(&self, _ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
        Ok(30.0)
    }

    fn probability(&self, _ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
        Ok(50.0)
    }
}

/// Fibonacci Dancer
/// Switches on Fibonacci-numbered hands, repeats otherwise.
pub struct FibonacciDancer {
    name: String,
    numbers: BTreeSet<usize>,
}

impl FibonacciDancer {
    pub fn new(limit: usize) -> Self {
        let mut numbers = BTreeSet::new();
        let (mut a, mut b) = (1usize, 2usize);
        numbers.insert(a);
        while b <= limit {
            numbers.insert(b);
            let next = a + b;
            a = b;
            b = next;
        }
        Self {
            name: format!("Fibonacci Dancer (<{})", limit),
            numbers,
        }
    }

    fn next_is_fibonacci(&self, decided: &[Side]) -> bool {
        self.numbers.contains(&(decided.len() + 1))
    }
}

impl Strategy for FibonacciDancer {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&mut self, ctx: &RoundContext<'_>) -> Result<Option<Side>, StrategyError> {
        let Some(last) = ctx.decided.last() else {
            return Ok(None);
        };
        if self.next_is_fibonacci(ctx.decided) {
            Ok(Some(last.opposite()))
        } else {
            Ok(Some(*last))
        }
    }

    fn confidence(&self, ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
        Ok(if self.next_is_fibonacci(ctx.decided) { 60.0 } else { 45.0 })
    }

    fn probability(&self, ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
        Ok(if self.next_is_fibonacci(ctx.decided) { 52.0 } else { 48.0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::testing::{approx, Fixture};
    use crate::types::Outcome;

    fn two_shoes(previous: &str, current: &str) -> Fixture {
        let mut fixture = Fixture::new("");
        fixture.history.mark_new_shoe();
        for c in previous.chars().filter_map(Outcome::from_code) {
            fixture.history.push(c);
        }
        fixture.history.mark_new_shoe();
        for c in current.chars().filter_map(Outcome::from_code) {
            fixture.history.push(c);
        }
        fixture.decided = fixture.history.decided();
        fixture
    }

    #[test]
    fn test_mirror_without_previous_shoe_abstains() {
        assert!(!Fixture::new("PBPBPB").run(&mut Mirror).is_call());
        assert!(!Fixture::new("PBPBPB").run(&mut AntiMirror).is_call());
    }

    #[test]
    fn test_mirror_reads_same_position_of_previous_shoe() {
        // Third decided hand of the previous shoe (ties skipped) is B.
        let fixture = two_shoes("PTPBP", "BB");
        let v = fixture.run(&mut Mirror);
        assert_eq!(v.prediction, Some(Side::Banker));
        assert!(approx(v.confidence, 30.0));
        assert!(approx(v.probability, 50.0));
        assert_eq!(fixture.run(&mut AntiMirror).prediction, Some(Side::Player));
    }

    #[test]
    fn test_mirror_runs_out_past_previous_length() {
        let fixture = two_shoes("PB", "PBP");
        assert!(!fixture.run(&mut Mirror).is_call());
    }

    #[test]
    fn test_fibonacci_set() {
        let dancer = FibonacciDancer::new(100);
        let expected: Vec<usize> = vec![1, 2, 3, 5, 8, 13, 21, 34, 55, 89];
        assert_eq!(dancer.numbers.iter().copied().collect::<Vec<_>>(), expected);
        assert_eq!(dancer.name(), "Fibonacci Dancer (<100)");
    }

    #[test]
    fn test_fibonacci_dancer_switches_on_fibonacci_hands() {
        let mut dancer = FibonacciDancer::new(100);
        assert!(!Fixture::new("").run(&mut dancer).is_call());

        // Next hand is #5: switch.
        let v = Fixture::new("PPBP").run(&mut dancer);
        assert_eq!(v.prediction, Some(Side::Banker));
        assert!(approx(v.confidence, 60.0));
        assert!(approx(v.probability, 52.0));

        // Next hand is #6: repeat.
        let v = Fixture::new("PPBPB").run(&mut dancer);
        assert_eq!(v.prediction, Some(Side::Banker));
        assert!(approx(v.confidence, 45.0));
        assert!(approx(v.probability, 48.0));
    }
}
