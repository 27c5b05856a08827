use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{error, info, warn};

use crate::config::SimulatorConfig;
use crate::ensemble::PerformanceTracker;
use crate::error::RegistryError;
use crate::risk::{Guardian, GuardianParams};
use crate::types::OutcomeHistory;
use super::*;

/// Collects strategies in registration order and resolves their evaluation
/// order once, at build time.
#[derive(Default)]
pub struct RegistryBuilder {
    pending: Vec<Box<dyn Strategy>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<S: Strategy + 'static>(self, strategy: S) -> Self {
        self.register_boxed(Box::new(strategy))
    }

    pub fn register_boxed(mut self, strategy: Box<dyn Strategy>) -> Self {
        self.pending.push(strategy);
        self
    }

    /// Base strategies keep registration order, composites follow once their
    /// dependencies are placed, Meta strategies run last.
    pub fn build(self) -> Result<StrategyRegistry, RegistryError> {
        let names: Vec<String> = self.pending.iter().map(|s| s.name().to_string()).collect();
        let shapes: Vec<InputShape> = self.pending.iter().map(|s| s.shape()).collect();

        let mut seen = HashSet::new();
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(RegistryError::DuplicateName(name.clone()));
            }
        }

        for (i, shape) in shapes.iter().enumerate() {
            let InputShape::Composite(dependencies) = shape else {
                continue;
            };
            for dependency in dependencies {
                let resolvable = names
                    .iter()
                    .position(|n| n == dependency)
                    .is_some_and(|j| shapes[j] != InputShape::Meta);
                if !resolvable {
                    return Err(RegistryError::UnknownDependency {
                        strategy: names[i].clone(),
                        dependency: dependency.clone(),
                    });
                }
            }
        }

        let mut order: Vec<usize> = (0..names.len())
            .filter(|&i| shapes[i] == InputShape::Base)
            .collect();
        let mut placed: HashSet<&str> = order.iter().map(|&i| names[i].as_str()).collect();
        let mut waiting: Vec<usize> = (0..names.len())
            .filter(|&i| matches!(shapes[i], InputShape::Composite(_)))
            .collect();

        while !waiting.is_empty() {
            let ready = waiting.iter().position(|&i| match &shapes[i] {
                InputShape::Composite(deps) => deps.iter().all(|d| placed.contains(d.as_str())),
                _ => true,
            });
            let Some(position) = ready else {
                let stuck: Vec<&str> = waiting.iter().map(|&i| names[i].as_str()).collect();
                return Err(RegistryError::Cycle(stuck.join(", ")));
            };
            let i = waiting.remove(position);
            placed.insert(names[i].as_str());
            order.push(i);
        }

        order.extend((0..names.len()).filter(|&i| shapes[i] == InputShape::Meta));

        let mut slots: Vec<Option<Box<dyn Strategy>>> = self.pending.into_iter().map(Some).collect();
        let strategies: Vec<Box<dyn Strategy>> = order.iter().filter_map(|&i| slots[i].take()).collect();
        let roster = strategies
            .iter()
            .map(|s| StrategyProfile {
                name: s.name().to_string(),
                capability: Capability::from(&s.shape()),
                family: s.family(),
            })
            .collect();

        info!(strategies = strategies.len(), "Strategy registry built");
        Ok(StrategyRegistry { strategies, roster })
    }
}

/// Every registered strategy, in evaluation order.
pub struct StrategyRegistry {
    strategies: Vec<Box<dyn Strategy>>,
    roster: Vec<StrategyProfile>,
}

impl StrategyRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn roster(&self) -> &[StrategyProfile] {
        &self.roster
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Runs one round. A strategy that errors or panics is reported as N/A
    /// and the round carries on.
    pub fn evaluate(&mut self, history: &OutcomeHistory, tracker: &PerformanceTracker) -> RoundResults {
        let decided = history.decided();
        let mut results = RoundResults::new();

        for strategy in self.strategies.iter_mut() {
            let name = strategy.name().to_string();
            let ctx = RoundContext {
                history,
                decided: &decided,
                results: &results,
                tracker,
                roster: &self.roster,
            };
            let verdict = match panic::catch_unwind(AssertUnwindSafe(|| strategy.evaluate(&ctx))) {
                Ok(Ok(verdict)) => verdict.sanitized(),
                Ok(Err(e)) => {
                    warn!(strategy = %name, error = %e, "Strategy failed, treating as N/A");
                    Verdict::abstain()
                }
                Err(_) => {
                    error!(strategy = %name, "Strategy panicked, treating as N/A");
                    Verdict::abstain()
                }
            };
            results.insert(&name, verdict);
        }

        results
    }

    pub fn reset(&mut self) {
        for strategy in self.strategies.iter_mut() {
            strategy.reset();
        }
    }
}

/// The full predictor set, configured from `config.strategies`.
pub fn default_registry(config: &SimulatorConfig) -> Result<StrategyRegistry, RegistryError> {
    let s = &config.strategies;
    let seed = config.table.seed;

    let multiverse_rng = match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed.wrapping_add(1)),
        None => ChaCha8Rng::from_entropy(),
    };
    let chaos = match seed {
        Some(seed) => ChaosWalker::new(Box::new(StepClock::new(seed as u32, 7))),
        None => ChaosWalker::system(),
    };

    let streak_follower = StreakFollower::new(s.streak_length);
    let orderly_target = streak_follower.name().to_string();

    RegistryBuilder::new()
        .register(Zigzag)
        .register(streak_follower)
        .register(StreakBreaker::new(s.streak_length))
        .register(DragonTail::new(s.dragon_min_length))
        .register(ChopFollower)
        .register(DoubleHunter)
        .register(PatternMatcher::new(s.pattern_length))
        .register(StatisticalDeviation::new(s.deviation_window, s.deviation_threshold, s.deviation_min_hands))
        .register(AntiStats::new(s.deviation_window, s.deviation_threshold, s.deviation_min_hands))
        .register(chaos)
        .register(Mirror)
        .register(AntiMirror)
        .register(Lazy::new(s.lazy_trigger, s.lazy_follow))
        .register(FibonacciDancer::new(s.fibonacci_limit))
        .register(OracleGrid)
        .register(StubbornSimple)
        .register(RhythmDisruptor)
        .register(VisualDensity)
        .register(Multiverse::new(
            s.multiverse_window,
            s.multiverse_influence,
            s.multiverse_leap_chance,
            Box::new(multiverse_rng),
        ))
        .register(ShoeReader::new(s.shoe_window, s.shoe_chop_ratio, orderly_target, ChopFollower::NAME))
        .register(ConsensusMaverick::new(s.maverick_threshold))
        .register(AntiTrend::new(s.anti_trend_primary.clone()))
        .register(Guardian::new(GuardianParams::from_config(config)))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StrategyError;
    use crate::types::Outcome;

    struct Fixed {
        name: &'static str,
        verdict: Verdict,
    }

    impl Strategy for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        fn predict(&mut self, _ctx: &RoundContext<'_>) -> Result<Option<Side>, StrategyError> {
            Ok(self.verdict.prediction)
        }

        fn confidence(&self, _ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
            Ok(self.verdict.confidence)
        }

        fn probability(&self, _ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
            Ok(self.verdict.probability)
        }
    }

    /// Composite that copies the first dependency it names.
    struct Echo {
        name: &'static str,
        deps: Vec<String>,
    }

    impl Strategy for Echo {
        fn name(&self) -> &str {
            self.name
        }

        fn shape(&self) -> InputShape {
            InputShape::Composite(self.deps.clone())
        }

        fn predict(&mut self, ctx: &RoundContext<'_>) -> Result<Option<Side>, StrategyError> {
            Ok(ctx.dependency(&self.deps[0])?.prediction)
        }

        fn confidence(&self, ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
            Ok(ctx.dependency(&self.deps[0])?.confidence)
        }

        fn probability(&self, ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
            Ok(ctx.dependency(&self.deps[0])?.probability)
        }
    }

    struct Failing;

    impl Strategy for Failing {
        fn name(&self) -> &str {
            "Failing"
        }

        fn predict(&mut self, _ctx: &RoundContext<'_>) -> Result<Option<Side>, StrategyError> {
            Err(StrategyError::Fault("window underflow".to_string()))
        }

        fn confidence(&self, _ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
            Ok(0.0)
        }

        fn probability(&self, _ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
            Ok(0.0)
        }
    }

    struct Panicking;

    impl Strategy for Panicking {
        fn name(&self) -> &str {
            "Panicking"
        }

        fn predict(&mut self, ctx: &RoundContext<'_>) -> Result<Option<Side>, StrategyError> {
            let empty: Vec<Side> = Vec::new();
            Ok(Some(empty[ctx.decided.len()]))
        }

        fn confidence(&self, _ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
            Ok(0.0)
        }

        fn probability(&self, _ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
            Ok(0.0)
        }
    }

    fn fixed(name: &'static str, side: Side, confidence: f64) -> Fixed {
        Fixed {
            name,
            verdict: Verdict::new(side, confidence, 50.0),
        }
    }

    fn echo(name: &'static str, deps: &[&str]) -> Echo {
        Echo {
            name,
            deps: deps.iter().map(|d| d.to_string()).collect(),
        }
    }

    fn names(registry: &StrategyRegistry) -> Vec<&str> {
        registry.roster().iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_composites_run_after_their_dependencies() {
        let mut registry = RegistryBuilder::new()
            .register(echo("outer", &["inner"]))
            .register(Guardian::new(GuardianParams::from_config(&SimulatorConfig::default())))
            .register(echo("inner", &["A"]))
            .register(fixed("A", Side::Banker, 61.0))
            .build()
            .unwrap();

        assert_eq!(names(&registry), vec!["A", "inner", "outer", "Guardian"]);
        assert_eq!(registry.roster()[1].capability, Capability::Composite);
        assert_eq!(registry.roster()[3].capability, Capability::Meta);

        let results = registry.evaluate(&OutcomeHistory::new(), &PerformanceTracker::new(10));
        assert_eq!(results.prediction("outer"), Some(Side::Banker));
        assert_eq!(results.get("outer").map(|v| v.confidence), Some(61.0));
    }

    #[test]
    fn test_build_rejects_bad_graphs() {
        let unknown = RegistryBuilder::new().register(echo("x", &["missing"])).build();
        assert!(matches!(
            unknown,
            Err(RegistryError::UnknownDependency { dependency, .. }) if dependency == "missing"
        ));

        let cycle = RegistryBuilder::new()
            .register(echo("x", &["y"]))
            .register(echo("y", &["x"]))
            .build();
        assert!(matches!(cycle, Err(RegistryError::Cycle(names)) if names == "x, y"));

        let duplicate = RegistryBuilder::new()
            .register(fixed("A", Side::Player, 50.0))
            .register(fixed("A", Side::Banker, 50.0))
            .build();
        assert!(matches!(duplicate, Err(RegistryError::DuplicateName(name)) if name == "A"));
    }

    #[test]
    fn test_faults_are_isolated() {
        let mut registry = RegistryBuilder::new()
            .register(Failing)
            .register(Panicking)
            .register(fixed("A", Side::Player, 55.0))
            .register(echo("echo", &["Failing"]))
            .build()
            .unwrap();

        let history = OutcomeHistory::from_outcomes(&[Outcome::Player]);
        let results = registry.evaluate(&history, &PerformanceTracker::new(10));

        assert_eq!(results.len(), 4);
        for name in ["Failing", "Panicking", "echo"] {
            let verdict = results.get(name).unwrap();
            assert!(!verdict.is_call(), "{} should abstain", name);
            assert_eq!(verdict.confidence, 0.0);
            assert_eq!(verdict.probability, 0.0);
        }
        assert_eq!(results.prediction("A"), Some(Side::Player));
    }

    #[test]
    fn test_out_of_range_scores_are_clamped() {
        let mut registry = RegistryBuilder::new()
            .register(fixed("loud", Side::Player, 250.0))
            .build()
            .unwrap();
        let results = registry.evaluate(&OutcomeHistory::new(), &PerformanceTracker::new(10));
        assert_eq!(results.get("loud").map(|v| v.confidence), Some(100.0));
    }

    #[test]
    fn test_default_registry_roster() {
        let mut config = SimulatorConfig::default();
        config.table.seed = Some(7);
        let mut registry = default_registry(&config).unwrap();
        assert_eq!(registry.len(), 23);

        let roster = names(&registry);
        assert_eq!(roster[0], "Zigzag");
        assert_eq!(
            &roster[19..],
            &["Shoe Reader (W15)", "Consensus Maverick (70%)", "Anti-Trend", "Guardian"]
        );
        let base = registry
            .roster()
            .iter()
            .filter(|p| p.capability == Capability::Base)
            .count();
        assert_eq!(base, 19);

        let history = OutcomeHistory::from_outcomes(&[
            Outcome::Player,
            Outcome::Player,
            Outcome::Banker,
            Outcome::Tie,
            Outcome::Banker,
        ]);
        let results = registry.evaluate(&history, &PerformanceTracker::new(10));
        assert_eq!(results.len(), 23);
        // Zigzag sees B B and expects a switch; Anti-Trend inverts it.
        assert_eq!(results.prediction("Zigzag"), Some(Side::Player));
        assert_eq!(results.prediction("Anti-Trend"), Some(Side::Banker));
    }
}
