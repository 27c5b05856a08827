use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::analytics::{AnalyticsCalculator, TableSnapshot};
use crate::config::{Arbiter, SimulatorConfig};
use crate::ensemble::{ConsensusSelector, PerformanceTracker};
use crate::error::SessionError;
use crate::journal::{FileJournal, HandEntry, HandJournal};
use crate::risk::{
    assess_risk, rank_strategies, Guardian, GuardianParams, RiskAssessment, Settlement, StakingEngine,
};
use crate::strategies::{default_registry, RoundContext, RoundResults, StrategyProfile, StrategyRegistry, Verdict};
use crate::types::{Outcome, OutcomeHistory};
use super::{SessionReport, Shoe};

const RECENT_DISPLAY_HANDS: usize = 20;
const RECENT_BET_WINDOW: usize = 20;

/// What happened in one settled round.
#[derive(Debug, Clone, Serialize)]
pub struct RoundSummary {
    pub hand: u64,
    pub outcome: Outcome,
    pub pick: Verdict,
    pub settlement: Settlement,
    pub bankroll: Decimal,
}

/// Owns every piece of per-session state and runs one round at a time.
pub struct Session {
    config: SimulatorConfig,
    session_id: Uuid,
    started_at: DateTime<Utc>,
    shoe: Shoe,
    history: OutcomeHistory,
    registry: StrategyRegistry,
    tracker: PerformanceTracker,
    consensus: ConsensusSelector,
    guardian: GuardianParams,
    staking: StakingEngine,
    journal: Option<Box<dyn HandJournal>>,
    results: RoundResults,
    consensus_pick: Verdict,
    guardian_pick: Verdict,
    risk: RiskAssessment,
    hands: u64,
}

impl Session {
    pub fn new(config: SimulatorConfig) -> Result<Self, SessionError> {
        let registry = default_registry(&config)?;
        let shoe = Shoe::new(config.table.num_decks, config.table.cut_card_depth, config.table.seed);
        let mut history = OutcomeHistory::new();
        history.mark_new_shoe();

        let journal = config
            .session
            .journal_path
            .as_ref()
            .map(|path| Box::new(FileJournal::new(path)) as Box<dyn HandJournal>);

        let guardian = GuardianParams::from_config(&config);
        let mut session = Self {
            session_id: Uuid::new_v4(),
            started_at: Utc::now(),
            shoe,
            history,
            registry,
            tracker: PerformanceTracker::new(config.tracker.window),
            consensus: ConsensusSelector::new(&config.consensus),
            staking: StakingEngine::from_settings(&config.staking),
            guardian,
            journal,
            results: RoundResults::new(),
            consensus_pick: Verdict::abstain(),
            guardian_pick: Verdict::abstain(),
            risk: RiskAssessment::default(),
            hands: 0,
            config,
        };
        session.evaluate();

        info!(
            session = %session.session_id,
            strategies = session.registry.len(),
            arbiter = ?session.config.session.arbiter,
            ladder = session.config.staking.profile.name(),
            "Session started"
        );
        Ok(session)
    }

    /// Replaces whatever journal the configuration selected.
    pub fn with_journal(mut self, journal: Box<dyn HandJournal>) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Deals the next hand from the shoe, reshuffling first when the cut card
    /// has been played out.
    pub fn play_hand(&mut self) -> Result<RoundSummary, SessionError> {
        let dealt = match self.shoe.deal_hand() {
            Some(hand) => hand,
            None => {
                self.reshuffle();
                self.shoe.deal_hand().ok_or(SessionError::ShoeExhausted)?
            }
        };
        debug!(
            player = dealt.player_total,
            banker = dealt.banker_total,
            natural = dealt.is_natural(),
            "Hand dealt"
        );
        Ok(self.record_outcome(dealt.outcome))
    }

    /// Manual entry. Unrecognised codes change nothing.
    pub fn record_code(&mut self, code: char) -> Option<RoundSummary> {
        match code.to_string().parse::<Outcome>() {
            Ok(outcome) => Some(self.record_outcome(outcome)),
            Err(e) => {
                debug!(error = %e, "Ignoring input");
                None
            }
        }
    }

    /// Judges the standing verdicts against `outcome`, settles the surfaced
    /// pick, then predicts the next hand.
    pub fn record_outcome(&mut self, outcome: Outcome) -> RoundSummary {
        self.tracker.record_round(
            self.results.iter().map(|(name, verdict)| (name, verdict.prediction)),
            outcome,
        );

        let pick = self.surfaced().clone();
        let bet = self.staking.current_bet();
        let settlement = self.staking.settle(pick.prediction, outcome);
        self.history.push(outcome);
        self.hands += 1;

        debug!(
            hand = self.hands,
            outcome = %outcome,
            prediction = ?pick.prediction,
            source = pick.source.as_deref().unwrap_or("-"),
            "Hand recorded"
        );

        if let Some(journal) = self.journal.as_mut() {
            let entry = HandEntry {
                timestamp: Utc::now(),
                session_id: self.session_id,
                hand: self.hands,
                actual: outcome,
                prediction: pick.prediction,
                source: pick.source.clone(),
                confidence: pick.confidence,
                probability: pick.probability,
                verdicts: HandEntry::verdicts_of(&self.results),
                settlement,
                bankroll: self.staking.bankroll(),
                bet,
            };
            if let Err(e) = journal.record_hand(&entry) {
                error!(hand = self.hands, error = %e, "Failed to journal hand");
            }
        }

        self.evaluate();

        RoundSummary {
            hand: self.hands,
            outcome,
            pick,
            settlement,
            bankroll: self.staking.bankroll(),
        }
    }

    /// Drops the most recent outcome and predicts again. Bankroll, ladder and
    /// tracker state are not rolled back.
    pub fn undo(&mut self) -> Result<Outcome, SessionError> {
        let outcome = self.history.pop_last().ok_or(SessionError::EmptyHistory)?;
        info!(outcome = %outcome, remaining = self.history.len(), "Undid last outcome");
        self.evaluate();
        Ok(outcome)
    }

    /// Starts over with a fresh shoe and a new session id.
    pub fn clear(&mut self) {
        self.history.clear();
        self.tracker.reset();
        self.staking.reset();
        self.registry.reset();
        self.shoe.shuffle_and_reset();
        self.history.mark_new_shoe();
        self.session_id = Uuid::new_v4();
        self.started_at = Utc::now();
        self.hands = 0;
        self.evaluate();
        info!(session = %self.session_id, "Session cleared");
    }

    fn reshuffle(&mut self) {
        self.shoe.shuffle_and_reset();
        self.history.mark_new_shoe();
        info!(shoe = self.shoe.shoes_started(), hands = self.history.len(), "New shoe");
    }

    fn evaluate(&mut self) {
        self.results = self.registry.evaluate(&self.history, &self.tracker);
        self.consensus_pick = self
            .consensus
            .select(&self.results, &self.tracker, self.registry.roster());
        self.guardian_pick = self
            .results
            .get(Guardian::NAME)
            .cloned()
            .unwrap_or_else(Verdict::abstain);

        let decided = self.history.decided();
        let ctx = RoundContext {
            history: &self.history,
            decided: &decided,
            results: &self.results,
            tracker: &self.tracker,
            roster: self.registry.roster(),
        };
        let ranking = rank_strategies(&ctx, &self.guardian.ranking_rules());
        self.risk = assess_risk(&ctx, &ranking, &self.guardian);
    }

    /// The pick that is shown and staked.
    pub fn surfaced(&self) -> &Verdict {
        match self.config.session.arbiter {
            Arbiter::Guardian => &self.guardian_pick,
            Arbiter::Consensus => &self.consensus_pick,
        }
    }

    pub fn snapshot(&self) -> TableSnapshot {
        let counts = self.history.counts();
        TableSnapshot {
            hands: self.history.len(),
            counts,
            player_pct: counts.pct(Outcome::Player),
            banker_pct: counts.pct(Outcome::Banker),
            tie_pct: counts.pct(Outcome::Tie),
            recent: AnalyticsCalculator::recent_codes(self.history.outcomes(), RECENT_DISPLAY_HANDS),
            staking: self.staking.snapshot(),
            arbiter: self.config.session.arbiter,
            pick: self.surfaced().clone(),
            risk: self.risk.clone(),
        }
    }

    pub fn report(&self) -> SessionReport {
        let settled = self.staking.settled();
        let count = |f: fn(&Settlement) -> bool| settled.iter().filter(|s| f(s)).count() as u64;
        let bets_won = count(|s| matches!(s, Settlement::Won { .. }));
        let bets_lost = count(|s| matches!(s, Settlement::Lost { .. }));
        let pushes = count(|s| matches!(s, Settlement::Push { .. }));
        let decided_bets = bets_won + bets_lost;

        let initial_bankroll = self.staking.initial_bankroll();
        let final_bankroll = self.staking.bankroll();

        SessionReport {
            session_id: self.session_id,
            started_at: self.started_at,
            finished_at: Utc::now(),
            arbiter: self.config.session.arbiter,
            total_hands: self.history.len(),
            counts: self.history.counts(),
            bets_placed: decided_bets + pushes,
            bets_won,
            bets_lost,
            pushes,
            win_rate_pct: if decided_bets > 0 {
                bets_won as f64 / decided_bets as f64 * 100.0
            } else {
                0.0
            },
            recent_win_rate_pct: AnalyticsCalculator::recent_bet_win_rate(settled, RECENT_BET_WINDOW),
            streaks: AnalyticsCalculator::bet_streaks(settled),
            initial_bankroll,
            final_bankroll,
            profit: final_bankroll - initial_bankroll,
            profit_pct: SessionReport::profit_pct_of(initial_bankroll, final_bankroll),
            strategies: AnalyticsCalculator::strategy_rows(self.registry.roster(), &self.tracker),
        }
    }

    /// Builds the report and hands it to the journal.
    pub fn finalize(&mut self) -> SessionReport {
        let report = self.report();
        if let Some(journal) = self.journal.as_mut() {
            if let Err(e) = journal.finalize(&report) {
                error!(error = %e, "Failed to write session summary");
            }
        }
        info!(
            session = %self.session_id,
            hands = report.total_hands,
            bankroll = %report.final_bankroll,
            "Session finished"
        );
        report
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn history(&self) -> &OutcomeHistory {
        &self.history
    }

    pub fn results(&self) -> &RoundResults {
        &self.results
    }

    pub fn consensus_pick(&self) -> &Verdict {
        &self.consensus_pick
    }

    pub fn guardian_pick(&self) -> &Verdict {
        &self.guardian_pick
    }

    pub fn risk(&self) -> &RiskAssessment {
        &self.risk
    }

    pub fn staking(&self) -> &StakingEngine {
        &self.staking
    }

    pub fn tracker(&self) -> &PerformanceTracker {
        &self.tracker
    }

    pub fn roster(&self) -> &[StrategyProfile] {
        self.registry.roster()
    }

    pub fn shoe(&self) -> &Shoe {
        &self.shoe
    }

    pub fn hands(&self) -> u64 {
        self.hands
    }
}
